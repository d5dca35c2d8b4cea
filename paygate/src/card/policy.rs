//! Card validation policy.
//!
//! The policy is an explicit value built once at setup and passed to every
//! validation call. Individual cards may override the name and verification
//! value requirements.
//!
//! # Examples
//!
//! ```
//! use paygate::card::CardPolicy;
//!
//! let policy = CardPolicy::from_toml(
//!     r#"
//!     require_verification_value = false
//!     test_mode = true
//!     "#,
//! )
//! .unwrap();
//!
//! assert!(policy.require_name);
//! assert!(!policy.require_verification_value);
//! assert!(policy.test_mode);
//! assert_eq!(policy.max_years_ahead, 20);
//! ```

use serde::Deserialize;

use crate::error::{GatewayError, Result};

/// Settings that control [`CreditCard::validate`](super::CreditCard::validate).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CardPolicy {
    /// Cardholder first and last name must be present.
    #[serde(default = "default_true")]
    pub require_name: bool,

    /// A verification value (CVV/CVC) must be present.
    #[serde(default = "default_true")]
    pub require_verification_value: bool,

    /// Accept test sentinel numbers such as `"1"` or `"success"`.
    #[serde(default)]
    pub test_mode: bool,

    /// How many years past the current one an expiry year may lie.
    #[serde(default = "default_max_years_ahead")]
    pub max_years_ahead: i32,
}

impl Default for CardPolicy {
    fn default() -> Self {
        Self {
            require_name: true,
            require_verification_value: true,
            test_mode: false,
            max_years_ahead: default_max_years_ahead(),
        }
    }
}

impl CardPolicy {
    /// Parses a policy from TOML and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if the document is malformed or
    /// fails [`validate`](Self::validate).
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let policy: Self = toml::from_str(toml_str)
            .map_err(|e| GatewayError::ConfigError(format!("invalid card policy: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Checks that values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if `max_years_ahead` is outside 1-100.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.max_years_ahead) {
            return Err(GatewayError::ConfigError(
                "max_years_ahead must be between 1 and 100".to_owned(),
            ));
        }
        Ok(())
    }

    /// Sets whether a cardholder name is required.
    #[must_use]
    pub const fn with_require_name(mut self, required: bool) -> Self {
        self.require_name = required;
        self
    }

    /// Sets whether a verification value is required.
    #[must_use]
    pub const fn with_require_verification_value(mut self, required: bool) -> Self {
        self.require_verification_value = required;
        self
    }

    /// Enables or disables test mode.
    #[must_use]
    pub const fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }
}

const fn default_true() -> bool {
    true
}

const fn default_max_years_ahead() -> i32 {
    20
}
