//! Gateway capabilities.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Operation requested from a gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Authorize and capture in one step.
    Purchase,
    /// Reserve funds without capturing them.
    Authorize,
    /// Capture a previous authorization.
    Capture,
    /// Return funds of a settled transaction.
    Refund,
    /// Cancel a transaction before settlement.
    Void,
    /// Check a card without moving funds.
    Verify,
    /// Send funds to a card without a prior transaction.
    Credit,
}

impl Action {
    /// All actions.
    pub const ALL: [Self; 7] = [
        Self::Purchase,
        Self::Authorize,
        Self::Capture,
        Self::Refund,
        Self::Void,
        Self::Verify,
        Self::Credit,
    ];

    /// Configuration name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Authorize => "authorize",
            Self::Capture => "capture",
            Self::Refund => "refund",
            Self::Void => "void",
            Self::Verify => "verify",
            Self::Credit => "credit",
        }
    }

    /// Returns true if the action carries an amount.
    #[must_use]
    pub const fn has_amount(self) -> bool {
        !matches!(self, Self::Void | Self::Verify)
    }

    /// Returns true if the action refers to an earlier authorization.
    #[must_use]
    pub const fn references_authorization(self) -> bool {
        matches!(self, Self::Capture | Self::Refund | Self::Void)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| GatewayError::InvalidInput(format!("unknown action: {s}")))
    }
}
