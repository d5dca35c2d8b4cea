//! Amounts and their wire representation.
//!
//! An [`Amount`] is an integer count of the currency's minor unit. Most
//! currencies have two decimal places; a few have none or three.
//!
//! ```
//! use paygate::gateway::{Amount, AmountFormat};
//!
//! let usd = Amount::new(1999, "usd").unwrap();
//! assert_eq!(usd.localized(), "19.99");
//!
//! let yen = Amount::new(500, "JPY").unwrap();
//! assert_eq!(yen.localized(), "500");
//! assert_eq!(AmountFormat::MinorUnits.format(&usd), "1999");
//! ```

use std::fmt;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{GatewayError, Result};

const CURRENCIES_WITHOUT_FRACTIONS: &[&str] = &[
    "BIF", "BYR", "CLP", "CVE", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX",
    "UYI", "VND", "VUV", "XAF", "XOF", "XPF",
];

const CURRENCIES_WITH_THREE_DECIMALS: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

/// Number of decimal places of an ISO 4217 currency.
///
/// Unknown codes are assumed to have two.
#[must_use]
pub fn currency_exponent(currency: &str) -> u32 {
    let code = currency.to_ascii_uppercase();
    if CURRENCIES_WITHOUT_FRACTIONS.contains(&code.as_str()) {
        0
    } else if CURRENCIES_WITH_THREE_DECIMALS.contains(&code.as_str()) {
        3
    } else {
        2
    }
}

/// A sum of money in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Amount {
    minor_units: i64,
    currency: String,
}

impl Amount {
    /// Creates an amount of `minor_units` in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] if `currency` is not a
    /// three-letter code.
    pub fn new(minor_units: i64, currency: &str) -> Result<Self> {
        let currency = currency.trim();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(GatewayError::InvalidInput(format!("invalid currency code: {currency:?}")));
        }
        Ok(Self { minor_units, currency: currency.to_ascii_uppercase() })
    }

    /// Creates an amount from a decimal value, rounding to the currency's
    /// precision.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`] for an invalid currency or a
    /// value that does not fit in minor units.
    pub fn from_decimal(value: Decimal, currency: &str) -> Result<Self> {
        let exponent = currency_exponent(currency);
        let out_of_range = || GatewayError::InvalidInput(format!("amount out of range: {value}"));
        let scaled = value
            .round_dp(exponent)
            .checked_mul(Decimal::from(10_i64.pow(exponent)))
            .ok_or_else(out_of_range)?;
        let minor_units = i64::try_from(scaled.trunc()).map_err(|_| out_of_range())?;
        Self::new(minor_units, currency)
    }

    /// Count of minor units.
    #[must_use]
    pub const fn minor_units(&self) -> i64 {
        self.minor_units
    }

    /// Upper-case ISO 4217 code.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Decimal places of the currency.
    #[must_use]
    pub fn exponent(&self) -> u32 {
        currency_exponent(&self.currency)
    }

    /// The amount in major units.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.minor_units, self.exponent())
    }

    /// Major units with exactly the currency's number of decimal places.
    #[must_use]
    pub fn localized(&self) -> String {
        self.to_decimal().to_string()
    }

    /// The same amount with the opposite sign.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self { minor_units: -self.minor_units, currency: self.currency.clone() }
    }

    /// Returns true for a zero amount.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.minor_units == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.localized(), self.currency)
    }
}

/// How an amount is written into a request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountFormat {
    /// Major units with decimals, e.g. `"19.99"`.
    #[default]
    Decimal,
    /// Integer minor units, e.g. `"1999"`.
    MinorUnits,
}

impl AmountFormat {
    /// Formats `amount` for the wire.
    #[must_use]
    pub fn format(self, amount: &Amount) -> String {
        match self {
            Self::Decimal => amount.localized(),
            Self::MinorUnits => amount.minor_units().to_string(),
        }
    }
}
