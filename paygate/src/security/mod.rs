//! Redaction and audit logging.
//!
//! # Transcript Scrubbing
//!
//! [`Scrubber`] removes card numbers, verification values and credentials
//! from raw transcripts so they can be logged:
//!
//! ```rust
//! use paygate::security::Scrubber;
//!
//! let scrubbed = Scrubber::json().scrub("Authorization: Basic c2tfdGVzdDpwYXNz\r\n");
//! assert_eq!(scrubbed, "Authorization: Basic [FILTERED]\r\n");
//! ```
//!
//! # Audit Logging
//!
//! The audit module emits structured events on the `audit` tracing target:
//!
//! ```rust
//! use paygate::{audit, security::audit::AuditEventType};
//! use uuid::Uuid;
//!
//! audit!(
//!     AuditEventType::CommitDeclined,
//!     "acme",
//!     Uuid::new_v4(),
//!     with_action("purchase"),
//!     with_error_code("51")
//! );
//! ```
//!
//! # Security Considerations
//!
//! - Scrubbing works on raw text and never needs a well-formed body
//! - Error messages and transcripts are redacted before they reach an event
//! - Request correlation IDs tie together the events of one commit

pub mod audit;
pub mod scrub;

pub use audit::{AuditDetails, AuditEvent, AuditEventType, audit_log, redact_sensitive};
pub use scrub::{FILTERED, ScrubRule, Scrubber};
