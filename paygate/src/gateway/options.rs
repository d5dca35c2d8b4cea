//! Per-transaction options and payment sources.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::card::CreditCard;

/// What a transaction is charged against.
#[derive(Debug, Clone, Copy)]
pub enum PaymentSource<'a> {
    /// A card presented with this request.
    Card(&'a CreditCard),
    /// Authorization token returned by an earlier response.
    Token(&'a str),
    /// No payment data, e.g. for a void.
    None,
}

impl<'a> PaymentSource<'a> {
    /// The card, if this source is one.
    #[must_use]
    pub const fn card(self) -> Option<&'a CreditCard> {
        match self {
            Self::Card(card) => Some(card),
            Self::Token(_) | Self::None => None,
        }
    }

    /// The token, if this source is one.
    #[must_use]
    pub const fn token(self) -> Option<&'a str> {
        match self {
            Self::Token(token) => Some(token),
            Self::Card(_) | Self::None => None,
        }
    }
}

impl<'a> From<&'a CreditCard> for PaymentSource<'a> {
    fn from(card: &'a CreditCard) -> Self {
        Self::Card(card)
    }
}

/// Postal address of the cardholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Full name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Street line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    /// Second street line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State or region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Country name or code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Address {
    /// Fields as `(name, value)` pairs, skipping unset ones.
    pub(crate) fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("name", &self.name),
            ("address1", &self.address1),
            ("address2", &self.address2),
            ("city", &self.city),
            ("state", &self.state),
            ("country", &self.country),
            ("zip", &self.zip),
            ("phone", &self.phone),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }
}

/// Options accepted by every capability.
///
/// # Examples
///
/// ```
/// use paygate::gateway::{Address, TransactionOptions};
///
/// let options = TransactionOptions::new()
///     .with_order_id("order-42")
///     .with_currency("EUR")
///     .with_billing_address(Address { zip: Some("BT2 8XX".to_owned()), ..Address::default() })
///     .with_metadata("source", "web");
///
/// assert_eq!(options.order_id.as_deref(), Some("order-42"));
/// assert_eq!(options.metadata["source"], "web");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionOptions {
    /// Merchant order reference.
    #[serde(default)]
    pub order_id: Option<String>,
    /// ISO 4217 currency code; the gateway default applies when unset.
    #[serde(default)]
    pub currency: Option<String>,
    /// Billing address.
    #[serde(default)]
    pub billing_address: Option<Address>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Customer IP address.
    #[serde(default)]
    pub ip: Option<String>,
    /// Vendor-specific fields, sent through unchanged.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl TransactionOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the order reference.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// Sets the currency.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Sets the billing address.
    #[must_use]
    pub fn with_billing_address(mut self, address: Address) -> Self {
        self.billing_address = Some(address);
        self
    }

    /// Sets the description.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the customer IP address.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Adds one vendor-specific field.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_source_accessors() {
        let card = CreditCard::new().with_number("4242424242424242");
        assert!(PaymentSource::from(&card).card().is_some());
        assert!(PaymentSource::from(&card).token().is_none());
        assert_eq!(PaymentSource::Token("tok_1").token(), Some("tok_1"));
        assert!(PaymentSource::None.card().is_none());
    }

    #[test]
    fn test_address_fields_skip_unset() {
        let address = Address {
            address1: Some("123 Fake Street".to_owned()),
            zip: Some("BT2 8XX".to_owned()),
            ..Address::default()
        };
        let fields: Vec<_> = address.fields().collect();
        assert_eq!(fields, vec![("address1", "123 Fake Street"), ("zip", "BT2 8XX")]);
    }

    #[test]
    fn test_options_from_toml() {
        let options: TransactionOptions = toml::from_str(
            r#"
            order_id = "1"
            currency = "EUR"

            [billing_address]
            city = "Belfast"

            [metadata]
            tender_type = "Card"
            "#,
        )
        .unwrap();

        assert_eq!(options.currency.as_deref(), Some("EUR"));
        assert_eq!(options.billing_address.unwrap().city.as_deref(), Some("Belfast"));
        assert_eq!(options.metadata["tender_type"], "Card");
    }
}
