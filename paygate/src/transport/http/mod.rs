//! HTTP transport implementation.
//!
//! This module provides HTTP/1.1 and HTTP/2 transport using reqwest.
//! Every status code is returned to the caller together with its body.

use std::{sync::LazyLock, time::Duration};

use reqwest::Client;
use tracing::instrument;
use url::Url;

use super::config::{HttpConfig, HttpVersion};
use crate::{
    error::{GatewayError, Result},
    transport::{Method, Transport, TransportRequest, TransportResponse},
};

/// Default HTTP client with connection pooling enabled.
///
/// Using a singleton avoids recreating the client per transport instance,
/// preserving connection pooling benefits across all default transports.
static DEFAULT_HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(100)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("paygate/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create default HTTP client")
});

/// Validates URL for security constraints.
///
/// Ensures the URL uses HTTPS and does not point to localhost.
pub(crate) fn validate_url(url: &Url) -> Result<()> {
    if url.scheme() != "https" {
        return Err(GatewayError::TransportError("Only HTTPS URLs are allowed".to_owned()));
    }

    if let Some(host) = url.host_str()
        && (host == "localhost" || host == "127.0.0.1" || host == "::1" || host == "[::1]")
    {
        return Err(GatewayError::TransportError("Localhost URLs are not allowed".to_owned()));
    }

    Ok(())
}

/// Rejects paths containing directory traversal sequences.
pub(crate) fn sanitize_path(path: &str) -> Result<&str> {
    if path.contains("..") || path.contains("//") {
        return Err(GatewayError::TransportError(
            "Invalid path: traversal sequences not allowed".to_owned(),
        ));
    }
    if !path.is_empty() && !path.starts_with('/') {
        return Err(GatewayError::TransportError("Path must start with '/'".to_owned()));
    }
    Ok(path)
}

/// Validates header name and value for CRLF injection prevention.
pub(crate) fn validate_header(name: &str, value: &str) -> Result<()> {
    if name.contains(['\r', '\n', '\0']) {
        return Err(GatewayError::TransportError(
            "Invalid header name: control characters not allowed".to_owned(),
        ));
    }
    if value.contains(['\r', '\n', '\0']) {
        return Err(GatewayError::TransportError(
            "Invalid header value: control characters not allowed".to_owned(),
        ));
    }
    Ok(())
}

/// Path portion of a raw URL, before the parser resolves dot segments.
fn raw_path(url: &str) -> &str {
    let Some((_, rest)) = url.split_once("://") else {
        return "";
    };
    let path = rest.find('/').map_or("", |start| &rest[start..]);
    path.split(['?', '#']).next().unwrap_or_default()
}

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// Supports automatic connection pooling, keep-alive, and HTTP/2 multiplexing.
///
/// # Examples
///
/// ```rust,no_run
/// use paygate::transport::{HttpTransport, Method, Transport, TransportRequest};
///
/// # async fn example() -> paygate::error::Result<()> {
/// let transport = HttpTransport::new()?;
///
/// let request = TransportRequest {
///     method: Method::Get,
///     url: "https://gateway.example.com/payments/ch_123",
///     headers: vec![],
///     content_type: None,
///     body: &[],
/// };
///
/// let response = transport.execute(request).await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    http_version: HttpVersion,
}

impl HttpTransport {
    /// Creates a new HTTP transport with default settings.
    ///
    /// Uses a shared singleton client for connection pooling efficiency.
    ///
    /// Default configuration:
    /// - Pool max idle per host: 100
    /// - Timeout: 30 seconds
    /// - Connect timeout: 10 seconds
    /// - HTTP version: Auto (prefer HTTP/2)
    ///
    /// # Errors
    ///
    /// This method is infallible but returns `Result` for API consistency.
    ///
    /// # Examples
    ///
    /// ```
    /// use paygate::transport::HttpTransport;
    ///
    /// let transport = HttpTransport::new().unwrap();
    /// ```
    pub fn new() -> Result<Self> {
        Ok(Self { client: DEFAULT_HTTP_CLIENT.clone(), http_version: HttpVersion::Auto })
    }

    /// Creates HTTP transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is out of bounds or the HTTP client
    /// cannot be created.
    ///
    /// # Examples
    ///
    /// ```
    /// use paygate::transport::{HttpConfig, HttpTransport, HttpVersion};
    ///
    /// let config = HttpConfig {
    ///     pool_max_idle_per_host: 20,
    ///     timeout_secs: 60,
    ///     http_version: HttpVersion::Http2,
    ///     ..HttpConfig::default()
    /// };
    ///
    /// let transport = HttpTransport::with_config(&config).unwrap();
    /// ```
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str());

        builder = match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        let client = builder.build().map_err(GatewayError::HttpError)?;

        Ok(Self { client, http_version: config.http_version })
    }

    /// Checks the URL and headers of a request before anything is sent.
    fn check_request(request: &TransportRequest<'_>) -> Result<Url> {
        let url = Url::parse(request.url)
            .map_err(|e| GatewayError::InvalidUrl(format!("invalid url: {e}")))?;

        validate_url(&url)?;
        sanitize_path(raw_path(request.url))?;

        if url.host_str().is_none() {
            return Err(GatewayError::InvalidUrl(format!("URL missing host: {}", request.url)));
        }

        for (key, value) in &request.headers {
            validate_header(key, value)?;
        }
        if let Some(content_type) = request.content_type {
            validate_header("Content-Type", content_type)?;
        }

        Ok(url)
    }
}

impl Transport for HttpTransport {
    #[instrument(
        skip(self, request),
        fields(method = %request.method, url = request.url, body_len = request.body.len())
    )]
    async fn execute<'a>(&'a self, request: TransportRequest<'a>) -> Result<TransportResponse> {
        let url = Self::check_request(&request)?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Patch => self.client.patch(url),
            Method::Delete => self.client.delete(url),
        };

        if let Some(content_type) = request.content_type {
            builder = builder.header("Content-Type", content_type);
        }

        for (key, value) in request.headers {
            builder = builder.header(key, value);
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body.to_vec());
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_owned()))
            .collect();

        let body = response.bytes().await.map_err(GatewayError::HttpError)?.to_vec();

        tracing::debug!(status, body_len = body.len(), "gateway responded");

        Ok(TransportResponse { status, body, headers })
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(url: &str) -> TransportRequest<'_> {
        TransportRequest {
            method: Method::Get,
            url,
            headers: vec![],
            content_type: None,
            body: &[],
        }
    }

    #[test]
    fn test_http_transport_new() {
        let transport = HttpTransport::new().unwrap();
        assert_eq!(transport.protocol_name(), "http");
    }

    #[test]
    fn test_http_transport_protocol_name() {
        let config_http1 = HttpConfig { http_version: HttpVersion::Http1, ..Default::default() };
        let transport_http1 = HttpTransport::with_config(&config_http1).unwrap();
        assert_eq!(transport_http1.protocol_name(), "http/1.1");

        let config_http2 = HttpConfig { http_version: HttpVersion::Http2, ..Default::default() };
        let transport_http2 = HttpTransport::with_config(&config_http2).unwrap();
        assert_eq!(transport_http2.protocol_name(), "http/2");
    }

    #[test]
    fn test_http_transport_with_invalid_config() {
        let config = HttpConfig { timeout_secs: 0, ..Default::default() };
        let result = HttpTransport::with_config(&config);
        assert!(matches!(result.unwrap_err(), GatewayError::ConfigError(_)));
    }

    #[test]
    fn test_http_transport_with_zero_pool_size() {
        let config = HttpConfig { pool_max_idle_per_host: 0, ..Default::default() };
        assert!(HttpTransport::with_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_http_transport_invalid_url() {
        let transport = HttpTransport::new().unwrap();
        let result = transport.execute(get("not-a-url")).await;
        assert!(matches!(result.unwrap_err(), GatewayError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_http_transport_rejects_file_url() {
        let transport = HttpTransport::new().unwrap();
        let result = transport.execute(get("file:///etc/passwd")).await;
        assert!(matches!(result.unwrap_err(), GatewayError::TransportError(_)));
    }

    #[tokio::test]
    async fn test_http_transport_rejects_http_url() {
        let transport = HttpTransport::new().unwrap();
        let result = transport.execute(get("http://gateway.example.com/payment")).await;
        assert!(matches!(result.unwrap_err(), GatewayError::TransportError(_)));
    }

    #[tokio::test]
    async fn test_http_transport_rejects_localhost() {
        let transport = HttpTransport::new().unwrap();
        let result = transport.execute(get("https://localhost/payment")).await;
        assert!(matches!(result.unwrap_err(), GatewayError::TransportError(_)));
    }

    #[tokio::test]
    async fn test_http_transport_rejects_path_traversal() {
        let transport = HttpTransport::new().unwrap();
        let result = transport.execute(get("https://gateway.example.com/../etc/passwd")).await;
        assert!(matches!(result.unwrap_err(), GatewayError::TransportError(_)));
    }

    #[tokio::test]
    async fn test_http_transport_rejects_crlf_header() {
        let transport = HttpTransport::new().unwrap();
        let request = TransportRequest {
            headers: vec![("X-Evil\r\n".to_owned(), "value".to_owned())],
            ..get("https://gateway.example.com/payment")
        };
        let result = transport.execute(request).await;
        assert!(matches!(result.unwrap_err(), GatewayError::TransportError(_)));
    }

    #[tokio::test]
    async fn test_http_transport_rejects_crlf_content_type() {
        let transport = HttpTransport::new().unwrap();
        let request = TransportRequest {
            content_type: Some("application/json\r\nX-Evil: 1"),
            ..get("https://gateway.example.com/payment")
        };
        let result = transport.execute(request).await;
        assert!(matches!(result.unwrap_err(), GatewayError::TransportError(_)));
    }

    #[test]
    fn test_http_transport_debug_format() {
        let transport = HttpTransport::new().unwrap();
        assert!(format!("{transport:?}").contains("HttpTransport"));
    }

    #[test]
    fn test_validate_url_https_required() {
        let https_url = Url::parse("https://example.com").unwrap();
        assert!(validate_url(&https_url).is_ok());

        let http_url = Url::parse("http://example.com").unwrap();
        assert!(matches!(validate_url(&http_url).unwrap_err(), GatewayError::TransportError(_)));
    }

    #[test]
    fn test_validate_url_localhost_blocked() {
        for url in ["https://localhost/api", "https://127.0.0.1/api", "https://[::1]/api"] {
            let parsed = Url::parse(url).unwrap();
            assert!(validate_url(&parsed).is_err(), "{url} should be rejected");
        }
    }

    #[test]
    fn test_sanitize_path() {
        assert!(sanitize_path("/api/payments").is_ok());
        assert!(sanitize_path("/").is_ok());
        assert!(sanitize_path("").is_ok());
        assert!(sanitize_path("/api/%2e%2e/etc").is_ok());

        assert!(sanitize_path("/../etc/passwd").is_err());
        assert!(sanitize_path("/api//secret").is_err());
        assert!(sanitize_path("api/users").is_err());
    }

    #[test]
    fn test_raw_path() {
        assert_eq!(raw_path("https://gw.example.com/v1/charge?x=1"), "/v1/charge");
        assert_eq!(raw_path("https://gw.example.com"), "");
        assert_eq!(raw_path("https://gw.example.com/a/../b#frag"), "/a/../b");
        assert_eq!(raw_path("not-a-url"), "");
    }

    #[test]
    fn test_validate_header_crlf_injection_blocked() {
        assert!(validate_header("Content-Type", "application/json").is_ok());
        assert!(validate_header("X-Evil\r\n", "value").is_err());
        assert!(validate_header("X-Custom", "value\r\nEvil-Header: injected").is_err());
        assert!(validate_header("X-Evil\0", "value").is_err());
        assert!(validate_header("X-Custom", "value\0evil").is_err());
    }
}
