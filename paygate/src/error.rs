//! Error types for paygate.
//!
//! Only configuration and programming mistakes surface as [`GatewayError`].
//! Card validation problems are returned as data
//! ([`ValidationErrors`](crate::card::ValidationErrors)) and every reachable
//! network or business outcome of a gateway call is folded into a
//! [`Response`](crate::gateway::Response).
//!
//! # Error Categories
//!
//! - **Configuration Errors** ([`GatewayError::ConfigError`],
//!   [`GatewayError::MissingCredential`], [`GatewayError::InvalidPattern`]):
//!   rejected at adapter construction time
//! - **Network Errors** ([`GatewayError::HttpError`], [`GatewayError::TransportError`]):
//!   raised by a [`Transport`](crate::transport::Transport) and downgraded by the
//!   commit protocol
//! - **Input Errors** ([`GatewayError::InvalidUrl`], [`GatewayError::InvalidInput`]):
//!   a request could not be built from the caller's data
//! - **Parse Errors** ([`GatewayError::ParseError`]): a vendor body could not be decoded
//!
//! # Examples
//!
//! ```
//! use paygate::error::{GatewayError, Result};
//!
//! fn require_key(key: &str) -> Result<&str> {
//!     if key.trim().is_empty() {
//!         return Err(GatewayError::MissingCredential("key".to_owned()));
//!     }
//!     Ok(key)
//! }
//!
//! assert!(require_key("").is_err());
//! ```

use thiserror::Error;

/// Result type alias for paygate operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while configuring or driving a gateway.
///
/// # Error Recovery
///
/// - **Configuration errors** ([`ConfigError`](Self::ConfigError),
///   [`MissingCredential`](Self::MissingCredential)): fix the gateway configuration
/// - **Transient errors** ([`HttpError`](Self::HttpError)): retry at the caller
/// - **Input errors** ([`InvalidInput`](Self::InvalidInput)): fix the request data
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    ///
    /// Wraps [`reqwest::Error`]. Common causes include timeouts, refused
    /// connections, DNS failures and TLS errors.
    ///
    /// # Recovery
    ///
    /// The commit protocol never returns this to callers of a capability; it
    /// is converted into a failed [`Response`](crate::gateway::Response).
    /// Direct [`Transport`](crate::transport::Transport) users may retry with backoff.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Transport rejected the request before it was sent.
    ///
    /// Raised for non-HTTPS URLs, loopback hosts, unsafe paths and header
    /// values containing control characters.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// A URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Gateway configuration is invalid.
    ///
    /// # Recovery
    ///
    /// Check the TOML configuration: URLs must be HTTPS and not loopback,
    /// endpoint paths must start with `/` and contain no traversal sequences.
    #[error("Invalid gateway configuration: {0}")]
    ConfigError(String),

    /// A mandatory credential was not supplied.
    ///
    /// Adapters refuse to be constructed without their credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use paygate::error::GatewayError;
    ///
    /// let err = GatewayError::MissingCredential("secret".to_owned());
    /// assert_eq!(err.to_string(), "Missing required credential: secret");
    /// ```
    #[error("Missing required credential: {0}")]
    MissingCredential(String),

    /// Request data supplied by the caller is unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A vendor body could not be decoded.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// A scrubbing pattern failed to compile.
    #[error("Invalid scrub pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
