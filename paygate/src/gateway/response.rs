//! The uniform result of a gateway call.

use serde::Serialize;
use serde_json::{Map, Value};

/// Value of the `code` parameter of a content-less acknowledgment.
pub const CONTENT_LESS_CODE: &str = "204";

/// Error code of a request that produced no gateway reply.
pub const CONNECTION_ERROR_CODE: &str = "connection_error";

/// Error code of a request that could not be built from the caller's data.
pub const INVALID_REQUEST_CODE: &str = "invalid_request";

/// Error code of a card rejected by local validation.
pub const INVALID_CARD_CODE: &str = "invalid_card";

/// Error code of a forced test-mode failure.
pub const PROCESSING_ERROR_CODE: &str = "processing_error";

/// Outcome of one gateway call, independent of the vendor.
///
/// A response never carries an authorization unless it succeeded, and never
/// carries an error code unless it failed. Neither is kept for content-less
/// acknowledgments.
///
/// # Examples
///
/// ```
/// use paygate::gateway::Response;
/// use serde_json::{Map, json};
///
/// let mut params = Map::new();
/// params.insert("status".to_owned(), json!("Approved"));
///
/// let response = Response::new(true, "Approved", params)
///     .with_authorization(Some("10000001625060".to_owned()))
///     .with_error_code(Some("ignored".to_owned()));
///
/// assert!(response.is_success());
/// assert_eq!(response.authorization(), Some("10000001625060"));
/// assert_eq!(response.error_code(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    success: bool,
    message: String,
    params: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<String>,
    test: bool,
}

impl Response {
    /// Creates a response without authorization or error code.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(success: bool, message: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            success,
            message: message.into(),
            params,
            authorization: None,
            error_code: None,
            test: false,
        }
    }

    /// The canonical content-less acknowledgment.
    #[must_use]
    pub fn content_less(success: bool) -> Self {
        let mut params = Map::new();
        params.insert("code".to_owned(), Value::String(CONTENT_LESS_CODE.to_owned()));
        Self::new(success, "", params)
    }

    /// A failure with a single `message` parameter.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let mut params = Map::new();
        params.insert("message".to_owned(), Value::String(message.clone()));
        Self::new(false, message, params)
    }

    /// Sets the authorization token, kept only on a populated success.
    #[must_use]
    pub fn with_authorization(mut self, authorization: Option<String>) -> Self {
        let keep = self.success && !self.is_content_less();
        self.authorization = authorization.filter(|_| keep);
        self
    }

    /// Sets the error code, kept only on a populated failure.
    #[must_use]
    pub fn with_error_code(mut self, error_code: Option<String>) -> Self {
        let keep = !self.success && !self.is_content_less();
        self.error_code = error_code.filter(|_| keep);
        self
    }

    /// Marks the response as coming from a test environment.
    #[must_use]
    pub const fn with_test(mut self, test: bool) -> Self {
        self.test = test;
        self
    }

    /// Returns true if the gateway accepted the request.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Parsed vendor fields.
    #[must_use]
    pub const fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// One parsed vendor field.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Token for a later capture, void or refund.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// Vendor error identifier.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// Returns true if the gateway ran in test mode.
    #[must_use]
    pub const fn is_test(&self) -> bool {
        self.test
    }

    /// Returns true for an acknowledgment without a body.
    #[must_use]
    pub fn is_content_less(&self) -> bool {
        self.params.get("code").and_then(Value::as_str) == Some(CONTENT_LESS_CODE)
    }
}
