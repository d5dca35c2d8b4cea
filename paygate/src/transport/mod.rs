//! Transport protocol abstraction layer.
//!
//! The transport moves bytes: it sends one request and hands back the status,
//! headers and body of whatever the gateway answered. It does not interpret
//! the status code. A non-2xx answer is still `Ok`, because gateways put
//! decline details in error bodies and the commit protocol parses them like
//! any other body. Only failures that produced no response at all (DNS,
//! connect, TLS, timeout) are `Err`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use paygate::transport::{HttpTransport, Method, Transport, TransportRequest};
//!
//! # async fn example() -> paygate::error::Result<()> {
//! let transport = HttpTransport::new()?;
//!
//! let request = TransportRequest {
//!     method: Method::Post,
//!     url: "https://gateway.example.com/payment",
//!     headers: vec![("Authorization".to_owned(), "Bearer tok_123".to_owned())],
//!     content_type: Some("application/json"),
//!     body: b"{\"amount\":\"9.99\"}",
//! };
//!
//! let response = transport.execute(request).await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::fmt;

use serde::Deserialize;

use crate::error::Result;

pub mod config;
pub mod http;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// HTTP method of a gateway request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    #[default]
    Post,
    /// PUT.
    Put,
    /// PATCH.
    Patch,
    /// DELETE.
    Delete,
}

impl Method {
    /// Upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request to dispatch.
#[derive(Debug, Clone)]
pub struct TransportRequest<'a> {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: &'a str,
    /// Additional headers, including authentication.
    pub headers: Vec<(String, String)>,
    /// Content-Type header value (if any).
    pub content_type: Option<&'a str>,
    /// Request body. Empty for bodiless requests.
    pub body: &'a [u8],
}

/// Response from transport operations.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
    /// Response headers.
    pub headers: Vec<(String, String)>,
}

impl TransportResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true for a 204 status or a 2xx reply whose body has no content.
    ///
    /// Empty error replies are not content-less; they go through parsing and
    /// come back as failures.
    #[must_use]
    pub fn is_content_less(&self) -> bool {
        self.status == 204 || (self.is_success() && self.body.iter().all(u8::is_ascii_whitespace))
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// First header value named `name`, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

/// Sends gateway requests.
///
/// Implementations must not retry, and must return non-2xx responses as
/// `Ok` with their body intact.
///
/// # Errors
///
/// Implementations return `Err` when no response was received.
pub trait Transport: Send + Sync {
    /// Executes one request.
    fn execute<'a>(
        &'a self,
        request: TransportRequest<'a>,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}
