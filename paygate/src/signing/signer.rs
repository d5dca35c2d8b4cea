//! Digest signing for signature-based gateway APIs.
//!
//! Signature-based gateways authenticate a request with a hash chain over an
//! ordered list of cleartext fields:
//!
//! ```text
//! first  = H(join(fields, separator))
//! signed = H(join([first, secret], separator))
//! ```
//!
//! Without a shared secret the first-stage digest is the signature.

use std::fmt;

use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::error::{GatewayError, Result};

/// Default field separator.
pub const DEFAULT_SEPARATOR: &str = "|";

/// Hash function used by a [`RequestSigner`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-1, used by most signature-based gateways.
    #[default]
    Sha1,
    /// SHA-256.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the lowercase hex digest of `data`.
    #[must_use]
    pub fn hex_digest(self, data: &[u8]) -> String {
        match self {
            Self::Sha1 => hex::encode(Sha1::digest(data)),
            Self::Sha256 => hex::encode(Sha256::digest(data)),
        }
    }
}

/// Builds deterministic request signatures.
///
/// The same ordered fields and secret always produce the same digest.
///
/// # Examples
///
/// ```
/// use paygate::signing::RequestSigner;
///
/// let signer = RequestSigner::new().with_separator(".").with_secret("mysecret")?;
/// let signature = signer.sign(&[
///     "20010403123245",
///     "thestore",
///     "ORD453-11",
///     "29900",
///     "EUR",
///     "5105105105105100",
/// ]);
///
/// assert_eq!(signature, "9af7064afd307c9f988e8dfc271f9257f1fc02f6");
/// # Ok::<(), paygate::error::GatewayError>(())
/// ```
#[derive(Clone)]
pub struct RequestSigner {
    secret: Option<String>,
    separator: String,
    algorithm: HashAlgorithm,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("secret", &self.secret.as_ref().map(|_| "[FILTERED]"))
            .field("separator", &self.separator)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl Default for RequestSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSigner {
    /// Creates a SHA-1 signer with the `"|"` separator and no secret.
    #[must_use]
    pub fn new() -> Self {
        Self {
            secret: None,
            separator: DEFAULT_SEPARATOR.to_owned(),
            algorithm: HashAlgorithm::Sha1,
        }
    }

    /// Sets the shared secret that salts the second digest stage.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingCredential`] if the secret is blank.
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(GatewayError::MissingCredential("shared secret".to_owned()));
        }
        self.secret = Some(secret);
        Ok(self)
    }

    /// Sets the field separator.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Sets the hash algorithm.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Returns the configured hash algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Returns the configured separator.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Returns true if a shared secret is configured.
    #[must_use]
    pub const fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Hex digest of `data` with the configured algorithm.
    #[must_use]
    pub fn digest(&self, data: &str) -> String {
        self.algorithm.hex_digest(data.as_bytes())
    }

    /// Signs an ordered list of field values.
    ///
    /// Empty values are kept, so their separators still count.
    #[must_use]
    #[instrument(skip_all, fields(field_count = fields.len(), algorithm = ?self.algorithm))]
    pub fn sign<S: AsRef<str>>(&self, fields: &[S]) -> String {
        let joined = fields.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(&self.separator);
        let first = self.digest(&joined);

        match &self.secret {
            Some(secret) => self.digest(&format!("{first}{}{secret}", self.separator)),
            None => first,
        }
    }

    /// Digest of a secret that authorizes a follow-up operation on its own.
    ///
    /// Gateways use this for refund or rebate passwords that are sent as a
    /// hash next to the main signature.
    ///
    /// # Examples
    ///
    /// ```
    /// use paygate::signing::RequestSigner;
    ///
    /// let signer = RequestSigner::new();
    /// assert_eq!(
    ///     signer.dependent_hash("your_rebate_secret"),
    ///     "f94ff2a7c125a8ad87e5683114ba1e384889240e"
    /// );
    /// ```
    #[must_use]
    pub fn dependent_hash(&self, secret: &str) -> String {
        self.digest(secret)
    }

    /// Checks a signature received from a gateway against the fields it covers.
    #[must_use]
    pub fn verify<S: AsRef<str>>(&self, fields: &[S], signature: &str) -> bool {
        self.sign(fields).eq_ignore_ascii_case(signature.trim())
    }
}
