//! Adapter contract traits.
//!
//! A gateway adapter turns a capability call into a vendor request and a
//! vendor reply back into a [`Response`](super::Response). The commit
//! protocol in [`commit`](super::commit()) drives any [`GatewayAdapter`].

use std::{borrow::Cow, collections::BTreeMap};

use serde_json::{Map, Value};

use super::{Action, Amount, PaymentSource, TransactionOptions, wire::WireFormat};
use crate::{error::Result, transport::Method};

/// Parsed vendor reply.
pub type ResponseFields = Map<String, Value>;

/// A request before it is encoded.
///
/// Holds flat standard fields such as `amount`, `order_id` or `card.number`
/// plus vendor-specific values passed through from
/// [`TransactionOptions::metadata`].
///
/// # Examples
///
/// ```
/// use paygate::gateway::{Action, RequestData};
///
/// let mut request = RequestData::new(Action::Purchase);
/// request.set("amount", "10.00");
///
/// assert_eq!(request.field("amount"), Some("10.00"));
/// assert_eq!(request.field_or_empty("order_id"), "");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestData {
    action: Action,
    fields: BTreeMap<String, String>,
    extra: Map<String, Value>,
}

impl RequestData {
    /// Creates an empty request for `action`.
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self { action, fields: BTreeMap::new(), extra: Map::new() }
    }

    /// The requested action.
    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    /// Sets a standard field.
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Sets a standard field if `value` is present.
    pub fn set_opt(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.set(name, value);
        }
    }

    /// A standard field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A standard field, or `""` when unset.
    #[must_use]
    pub fn field_or_empty(&self, name: &str) -> &str {
        self.field(name).unwrap_or_default()
    }

    /// All standard fields in name order.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Vendor-specific values.
    #[must_use]
    pub const fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Replaces the vendor-specific values.
    pub fn set_extra(&mut self, extra: Map<String, Value>) {
        self.extra = extra;
    }
}

/// Where a request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
}

impl Endpoint {
    /// Returns true if the request carries a body.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        !matches!(self.method, Method::Get | Method::Delete)
    }
}

/// Vendor-specific behavior driven by the commit protocol.
///
/// # Implementation Notes
///
/// - `build_request` and `endpoint_for` fail only on unusable caller data
/// - Every classification method works on fields that may come from a
///   synthetic parse-failure map
/// - `scrub` must be idempotent
pub trait GatewayAdapter: Send + Sync {
    /// Name used in messages and logs.
    fn display_name(&self) -> &str;

    /// Returns true when talking to a sandbox.
    fn is_test(&self) -> bool;

    /// Body encoding.
    fn wire_format(&self) -> WireFormat {
        WireFormat::Json
    }

    /// Builds the standard fields of a request.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidInput`](crate::error::GatewayError::InvalidInput)
    /// if required data is missing.
    fn build_request(
        &self,
        action: Action,
        source: PaymentSource<'_>,
        amount: Option<&Amount>,
        options: &TransactionOptions,
    ) -> Result<RequestData>;

    /// Resolves where `request` is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint is configured or a placeholder has no
    /// value.
    fn endpoint_for(&self, action: Action, request: &RequestData) -> Result<Endpoint>;

    /// Adds body authentication to `request` and returns the headers to send.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be signed.
    fn authenticate(&self, request: &mut RequestData) -> Result<Vec<(String, String)>>;

    /// Encodes the body.
    fn encode(&self, request: &RequestData) -> Vec<u8>;

    /// Parses a reply body. Never fails.
    fn parse(&self, body: &str) -> ResponseFields {
        super::wire::parse(self.wire_format(), body, self.display_name())
    }

    /// Classifies a parsed reply.
    fn success_from(&self, action: Action, fields: &ResponseFields) -> bool;

    /// Human-readable message of a parsed reply.
    fn message_from(&self, success: bool, fields: &ResponseFields) -> String;

    /// Authorization token of a parsed reply.
    fn authorization_from(&self, fields: &ResponseFields) -> Option<String>;

    /// Vendor error code of a parsed reply.
    fn error_code_from(&self, fields: &ResponseFields) -> Option<String>;

    /// Whether a content-less reply to `action` counts as success.
    fn content_less_success(&self, _action: Action) -> bool {
        true
    }

    /// Removes sensitive values from a transcript.
    fn scrub(&self, transcript: &str) -> String;
}

/// Resolves the endpoint of each action.
pub trait EndpointResolver: Send + Sync {
    /// Resolves `action` against the live or test environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint is configured or a placeholder has no
    /// value in `request`.
    fn resolve(&self, action: Action, request: &RequestData, test: bool) -> Result<Endpoint>;
}

/// Maps field names between standard and vendor-specific format.
pub trait FieldMapper: Send + Sync {
    /// Maps a standard field name to the vendor's path.
    ///
    /// Returns the original name if no mapping exists.
    fn map_request_field<'a>(&self, standard_name: &'a str) -> Cow<'a, str>;

    /// Maps a vendor field name to the standard name.
    fn map_response_field<'a>(&self, vendor_name: &'a str) -> Cow<'a, str>;

    /// Returns true if a standard name has an explicit request mapping.
    fn is_request_mapped(&self, standard_name: &str) -> bool;

    /// Returns true if this mapper has any custom mappings.
    fn has_custom_mappings(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_data_fields() {
        let mut request = RequestData::new(Action::Refund);
        request.set("amount", "-10.00");
        request.set_opt("order_id", Some("1"));
        request.set_opt("description", None);

        assert_eq!(request.action(), Action::Refund);
        assert_eq!(request.field("amount"), Some("-10.00"));
        assert_eq!(request.field("description"), None);
        assert_eq!(request.fields().keys().collect::<Vec<_>>(), ["amount", "order_id"]);
    }

    #[test]
    fn test_request_data_extra() {
        let mut request = RequestData::new(Action::Purchase);
        let mut extra = Map::new();
        extra.insert("tenderType".to_owned(), Value::from("Card"));
        request.set_extra(extra);
        assert_eq!(request.extra()["tenderType"], "Card");
    }

    #[test]
    fn test_endpoint_body() {
        let url = "https://gateway.test.com".to_owned();
        assert!(Endpoint { method: Method::Post, url: url.clone() }.has_body());
        assert!(Endpoint { method: Method::Put, url: url.clone() }.has_body());
        assert!(!Endpoint { method: Method::Get, url: url.clone() }.has_body());
        assert!(!Endpoint { method: Method::Delete, url }.has_body());
    }
}
