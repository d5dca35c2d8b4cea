//! Card classification and validation.
//!
//! Everything here is pure: brand detection, checksums, masking and expiry
//! arithmetic take their inputs by value or reference and touch no shared
//! state. Validation reads an explicit [`CardPolicy`] instead of global
//! defaults.
//!
//! # Examples
//!
//! ```
//! use chrono::{Datelike, Utc};
//! use paygate::card::{CardField, CardPolicy, CreditCard};
//!
//! let policy = CardPolicy::default();
//! let card = CreditCard::new()
//!     .with_number("5105105105105100")
//!     .with_brand("visa")
//!     .with_expiry(12, Utc::now().year() + 2)
//!     .with_name("Longbob Longsen")
//!     .with_verification_value("123");
//!
//! let errors = card.validate(&policy);
//! assert_eq!(errors.get(CardField::Brand), ["does not match the card number"]);
//! assert_eq!(errors.len(), 1);
//! ```

mod brand;
mod credit_card;
mod errors;
mod expiry;
mod number;
mod policy;

pub use brand::{CardBrand, detect_brand, matches_brand};
pub use credit_card::{BOGUS_BRAND, CreditCard};
pub use errors::{CardField, ValidationErrors};
pub use expiry::{ExpiryDate, ExpiryPart, days_in_month, expiration, is_leap_year};
pub use number::{
    TestOutcome, first_digits, is_test_sentinel, is_valid_number, last_digits, luhn_valid, mask,
    normalize_number, test_outcome,
};
pub use policy::CardPolicy;

/// Verification value length for a brand tag.
///
/// Four digits for `american_express`, three for every other tag including
/// unknown ones.
///
/// # Examples
///
/// ```
/// use paygate::card::verification_value_length;
///
/// assert_eq!(verification_value_length("american_express"), 4);
/// assert_eq!(verification_value_length("visa"), 3);
/// assert_eq!(verification_value_length(""), 3);
/// ```
#[must_use]
pub fn verification_value_length(brand: &str) -> usize {
    CardBrand::from_tag(brand).map_or(3, CardBrand::verification_value_length)
}
