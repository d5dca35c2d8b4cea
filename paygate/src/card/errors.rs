//! Field-tagged card validation errors.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

/// Card attribute a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardField {
    /// Cardholder first name.
    FirstName,
    /// Cardholder last name.
    LastName,
    /// Expiry month.
    Month,
    /// Expiry year.
    Year,
    /// Declared card brand.
    Brand,
    /// Card number.
    Number,
    /// Card verification value.
    VerificationValue,
}

impl CardField {
    /// Field name as used in error output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Month => "month",
            Self::Year => "year",
            Self::Brand => "brand",
            Self::Number => "number",
            Self::VerificationValue => "verification_value",
        }
    }
}

impl fmt::Display for CardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors keyed by field.
///
/// An empty set means the card is valid.
///
/// # Examples
///
/// ```
/// use paygate::card::{CardField, CardPolicy, CreditCard};
///
/// let card = CreditCard::new().with_number("4242424242424241");
/// let errors = card.validate(&CardPolicy::default());
///
/// assert!(!errors.is_empty());
/// assert_eq!(errors.get(CardField::Number), ["is not a valid credit card number"]);
/// assert_eq!(errors.get(CardField::Month), ["is required"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<CardField, Vec<String>>);

impl ValidationErrors {
    /// Creates an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error message against a field.
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn add(&mut self, field: CardField, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// Appends every error from `other`.
    pub fn extend(&mut self, other: Self) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Returns true if no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one error.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Messages recorded for `field`, empty if none.
    #[must_use]
    pub fn get(&self, field: CardField) -> &[String] {
        self.0.get(&field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns true if `field` has at least one error.
    #[must_use]
    pub fn contains(&self, field: CardField) -> bool {
        self.0.contains_key(&field)
    }

    /// Iterates over fields and their messages in field order.
    pub fn iter(&self) -> impl Iterator<Item = (CardField, &[String])> {
        self.0.iter().map(|(field, messages)| (*field, messages.as_slice()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field} {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}
