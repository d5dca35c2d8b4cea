//! Header-based authentication schemes.

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{GatewayError, Result};

/// How a request is authenticated through HTTP headers.
///
/// Signature-based gateways authenticate inside the body instead and use
/// [`AuthScheme::None`] here.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// No authentication header.
    None,
    /// HTTP Basic with an API key and secret.
    Basic {
        /// API key or user name.
        key: String,
        /// API secret or password.
        secret: String,
    },
    /// Bearer token.
    Bearer {
        /// Access token.
        token: String,
    },
}

impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { key, .. } => {
                f.debug_struct("Basic").field("key", key).field("secret", &"[FILTERED]").finish()
            }
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"[FILTERED]").finish(),
        }
    }
}

impl AuthScheme {
    /// HTTP Basic authentication.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingCredential`] if either value is blank.
    pub fn basic(key: &str, secret: &str) -> Result<Self> {
        Ok(Self::Basic { key: require("key", key)?, secret: require("secret", secret)? })
    }

    /// Bearer token authentication.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingCredential`] if the token is blank.
    pub fn bearer(token: &str) -> Result<Self> {
        Ok(Self::Bearer { token: require("token", token)? })
    }

    /// Returns the `Authorization` header value, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use paygate::signing::AuthScheme;
    ///
    /// let auth = AuthScheme::basic("key", "secret")?;
    /// assert_eq!(auth.header_value().as_deref(), Some("Basic a2V5OnNlY3JldA=="));
    /// # Ok::<(), paygate::error::GatewayError>(())
    /// ```
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Basic { key, secret } => {
                Some(format!("Basic {}", STANDARD.encode(format!("{key}:{secret}"))))
            }
            Self::Bearer { token } => Some(format!("Bearer {token}")),
        }
    }

    /// Returns the headers this scheme adds to a request.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        self.header_value()
            .map(|value| vec![("Authorization".to_owned(), value)])
            .unwrap_or_default()
    }
}

fn require(name: &str, value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(GatewayError::MissingCredential(name.to_owned()));
    }
    Ok(value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_header() {
        let auth = AuthScheme::basic("sk_test", "pass").unwrap();
        assert_eq!(
            auth.header_value().unwrap(),
            format!("Basic {}", STANDARD.encode("sk_test:pass"))
        );
    }

    #[test]
    fn test_bearer_header() {
        let auth = AuthScheme::bearer("tok_123").unwrap();
        assert_eq!(auth.headers(), vec![("Authorization".to_owned(), "Bearer tok_123".to_owned())]);
    }

    #[test]
    fn test_none_has_no_headers() {
        assert!(AuthScheme::None.headers().is_empty());
    }

    #[test]
    fn test_missing_credentials() {
        assert!(matches!(
            AuthScheme::basic("", "x"),
            Err(GatewayError::MissingCredential(name)) if name == "key"
        ));
        assert!(matches!(
            AuthScheme::basic("k", " "),
            Err(GatewayError::MissingCredential(name)) if name == "secret"
        ));
        assert!(matches!(AuthScheme::bearer(""), Err(GatewayError::MissingCredential(_))));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?}", AuthScheme::basic("key", "hunter2").unwrap());
        assert!(!debug.contains("hunter2"));
        let debug = format!("{:?}", AuthScheme::bearer("tok_secret").unwrap());
        assert!(!debug.contains("tok_secret"));
    }
}
