//! Audit logging for gateway operations.
//!
//! Every commit produces audit events on the `audit` tracing target, tied
//! together by a correlation id. Free-text values and transcripts pass through
//! the scrubber before they are stored on an event.

use std::{sync::LazyLock, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::scrub::Scrubber;

/// Longest transcript excerpt kept on an audit event, in characters.
pub const MAX_TRANSCRIPT_EXCERPT: usize = 512;

static REDACTOR: LazyLock<Scrubber> =
    LazyLock::new(|| Scrubber::standard().extend(Scrubber::plain_text()));

/// Types of auditable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A request is about to be dispatched to a gateway.
    CommitAttempted,
    /// The gateway approved the request.
    CommitSucceeded,
    /// The gateway declined the request or returned an unusable body.
    CommitDeclined,
    /// The request never produced a gateway response.
    TransportFailed,
    /// A card was rejected before any request was built.
    ValidationFailed,
}

/// Contextual information about an audited event.
///
/// Empty fields are left out of the serialized form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditDetails {
    /// Gateway action (`purchase`, `refund`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// HTTP method and URL the request went to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Authorization token returned by the gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
    /// Gateway error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Error or decline message (redacted).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Scrubbed excerpt of the raw exchange.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    /// Duration of the operation in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Whether the gateway ran in test mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<bool>,
}

/// Audit log entry.
///
/// # Examples
///
/// ```
/// use paygate::security::audit::{AuditEvent, AuditEventType, audit_log};
/// use uuid::Uuid;
///
/// let event = AuditEvent::new(AuditEventType::CommitDeclined, "acme", Uuid::new_v4())
///     .with_action("purchase")
///     .with_error("Declined: card 4242424242424242");
///
/// assert_eq!(event.details.error.as_deref(), Some("Declined: card [FILTERED]"));
/// audit_log(&event);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub event_type: AuditEventType,
    /// Display name of the gateway involved.
    pub gateway: String,
    /// Correlation id shared by all events of one commit.
    pub request_id: Uuid,
    /// Event details.
    pub details: AuditDetails,
}

impl AuditEvent {
    /// Creates a new audit event.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn new(event_type: AuditEventType, gateway: impl Into<String>, request_id: Uuid) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            gateway: gateway.into(),
            request_id,
            details: AuditDetails::default(),
        }
    }

    /// Adds the gateway action.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.details.action = Some(action.into());
        self
    }

    /// Adds the endpoint, e.g. `"POST https://gateway.example.com/payment"`.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.details.endpoint = Some(endpoint.into());
        self
    }

    /// Adds the authorization token returned by the gateway.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.details.authorization = Some(authorization.into());
        self
    }

    /// Adds the gateway error code.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.details.error_code = Some(code.into());
        self
    }

    /// Adds an error message, redacting card data.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.details.error = Some(redact_sensitive(&error.into()));
        self
    }

    /// Adds a scrubbed excerpt of a transcript.
    ///
    /// The transcript is scrubbed in full before it is cut to
    /// [`MAX_TRANSCRIPT_EXCERPT`] characters.
    #[must_use]
    pub fn with_transcript(mut self, transcript: &str) -> Self {
        let scrubbed = redact_sensitive(transcript);
        let excerpt = match scrubbed.char_indices().nth(MAX_TRANSCRIPT_EXCERPT) {
            Some((cut, _)) => format!("{}...", &scrubbed[..cut]),
            None => scrubbed,
        };
        self.details.transcript = Some(excerpt);
        self
    }

    /// Adds the duration of the operation.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "duration in ms fits u64 for practical values"
    )]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.details.duration_ms = Some(duration.as_millis() as u64);
        self
    }

    /// Records whether the gateway ran in test mode.
    #[must_use]
    pub const fn with_test(mut self, test: bool) -> Self {
        self.details.test = Some(test);
        self
    }
}

/// Logs an audit event to tracing with target `"audit"`.
pub fn audit_log(event: &AuditEvent) {
    tracing::info!(
        target: "audit",
        timestamp = %event.timestamp,
        event_type = ?event.event_type,
        gateway = %event.gateway,
        request_id = %event.request_id,
        details = ?event.details,
        "AUDIT"
    );
}

/// Removes card data and credentials from free text.
///
/// Applies the JSON, tag-delimited and plain-text scrubbing rules.
///
/// # Examples
///
/// ```
/// use paygate::security::audit::redact_sensitive;
///
/// let redacted = redact_sensitive("Payment failed for card 4242-4242-4242-4242, CVV: 123");
/// assert_eq!(redacted, "Payment failed for card [FILTERED], CVV: [FILTERED]");
/// ```
#[must_use]
pub fn redact_sensitive(input: &str) -> String {
    REDACTOR.scrub(input)
}

/// Convenience macro for audit logging.
///
/// # Examples
///
/// ```
/// use paygate::{audit, security::audit::AuditEventType};
/// use uuid::Uuid;
///
/// audit!(AuditEventType::CommitAttempted, "acme", Uuid::new_v4());
///
/// audit!(
///     AuditEventType::CommitSucceeded,
///     "acme",
///     Uuid::new_v4(),
///     with_action("purchase"),
///     with_authorization("10000001625060|PS")
/// );
/// ```
#[macro_export]
macro_rules! audit {
    ($event_type:expr, $gateway:expr, $request_id:expr) => {
        $crate::security::audit::audit_log(
            &$crate::security::audit::AuditEvent::new($event_type, $gateway, $request_id)
        )
    };
    ($event_type:expr, $gateway:expr, $request_id:expr, $($method:ident($arg:expr)),+ $(,)?) => {
        $crate::security::audit::audit_log(
            &$crate::security::audit::AuditEvent::new($event_type, $gateway, $request_id)
                $(.$method($arg))+
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_card_numbers() {
        let inputs = [
            ("Card: 4242-4242-4242-4242", "Card: [FILTERED]"),
            ("Card: 4242 4242 4242 4242", "Card: [FILTERED]"),
            ("Card: 4242424242424242", "Card: [FILTERED]"),
            ("Amex 378282246310005 declined", "Amex [FILTERED] declined"),
        ];

        for (input, expected) in inputs {
            assert_eq!(redact_sensitive(input), expected, "Failed to redact: {input}");
        }
    }

    #[test]
    fn test_redact_cvv() {
        for input in ["CVV: 123", "cvv:1234", "CVC=456", "cvv2 789"] {
            let result = redact_sensitive(input);
            assert!(result.ends_with("[FILTERED]"), "CVV not redacted in: {result}");
        }
    }

    #[test]
    fn test_redact_preserves_safe_data() {
        let input = "Order ID: 12345, Amount: $67.89, Date: 2024-01-15";
        assert_eq!(redact_sensitive(input), input);
    }

    #[test]
    fn test_redact_structured_bodies() {
        let json = r#"{"number":"4111111111111111","cvv":"999"}"#;
        assert_eq!(redact_sensitive(json), r#"{"number":"[FILTERED]","cvv":"[FILTERED]"}"#);

        let tagged = "<number>4263971921001307</number>";
        assert_eq!(redact_sensitive(tagged), "<number>[FILTERED]</number>");
    }

    #[test]
    fn test_audit_event_builder() {
        let request_id = Uuid::new_v4();
        let event = AuditEvent::new(AuditEventType::CommitSucceeded, "acme", request_id)
            .with_action("capture")
            .with_endpoint("POST https://gateway.example.com/capture")
            .with_authorization("auth-1")
            .with_duration(Duration::from_millis(1500))
            .with_test(true);

        assert_eq!(event.gateway, "acme");
        assert_eq!(event.request_id, request_id);
        assert_eq!(event.details.action.as_deref(), Some("capture"));
        assert_eq!(event.details.authorization.as_deref(), Some("auth-1"));
        assert_eq!(event.details.duration_ms, Some(1500));
        assert_eq!(event.details.test, Some(true));
    }

    #[test]
    fn test_transcript_is_scrubbed_and_truncated() {
        let body = format!(r#"{{"number":"4111111111111111","padding":"{}"}}"#, "x".repeat(2000));
        let event = AuditEvent::new(AuditEventType::CommitDeclined, "acme", Uuid::new_v4())
            .with_transcript(&body);

        let transcript = event.details.transcript.unwrap();
        assert!(transcript.starts_with(r#"{"number":"[FILTERED]""#));
        assert!(transcript.ends_with("..."));
        assert_eq!(transcript.chars().count(), MAX_TRANSCRIPT_EXCERPT + 3);
    }

    #[test]
    fn test_short_transcript_kept_whole() {
        let event = AuditEvent::new(AuditEventType::CommitDeclined, "acme", Uuid::new_v4())
            .with_transcript("{}");
        assert_eq!(event.details.transcript.as_deref(), Some("{}"));
    }

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::new(AuditEventType::TransportFailed, "acme", Uuid::new_v4())
            .with_error("connection reset");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "transport_failed");
        assert_eq!(json["gateway"], "acme");
        assert_eq!(json["details"]["error"], "connection reset");
        assert!(json["details"].get("authorization").is_none());
    }

    #[test]
    fn test_audit_macro_compiles_with_details() {
        crate::audit!(
            AuditEventType::ValidationFailed,
            "acme",
            Uuid::new_v4(),
            with_error("number is not a valid credit card number"),
        );
    }
}
