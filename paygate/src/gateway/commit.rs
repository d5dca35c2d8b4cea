//! The commit protocol.
//!
//! [`commit`] drives one request through any [`GatewayAdapter`]:
//!
//! 1. resolve the endpoint of the action
//! 2. attach authentication
//! 3. dispatch through a [`Transport`]
//! 4. parse the reply and classify it
//!
//! It never fails. Unusable requests, transport failures and unreadable
//! bodies all come back as an unsuccessful [`Response`].

use std::time::Instant;

use tracing::{Span, field, instrument};
use uuid::Uuid;

use super::{
    Action,
    response::{CONNECTION_ERROR_CODE, INVALID_REQUEST_CODE, Response},
    traits::{Endpoint, GatewayAdapter, RequestData},
};
use crate::{
    audit,
    error::{GatewayError, Result},
    security::{
        audit::{AuditEvent, AuditEventType, audit_log},
        redact_sensitive,
    },
    transport::{Transport, TransportRequest, TransportResponse},
};

/// A request ready to dispatch.
struct Prepared {
    endpoint: Endpoint,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

fn prepare<A: GatewayAdapter + ?Sized>(
    adapter: &A,
    request: &mut RequestData,
) -> Result<Prepared> {
    let endpoint = adapter.endpoint_for(request.action(), request)?;
    let headers = adapter.authenticate(request)?;
    let body = if endpoint.has_body() { adapter.encode(request) } else { Vec::new() };
    Ok(Prepared { endpoint, headers, body })
}

/// Error text safe to log and return, with the adapter's rules and the
/// free-text rules applied.
fn scrub_error<A: GatewayAdapter + ?Sized>(adapter: &A, error: &GatewayError) -> String {
    redact_sensitive(&adapter.scrub(&error.to_string()))
}

/// Sends `request` through `transport` and normalizes the reply.
///
/// # Examples
///
/// ```no_run
/// use paygate::{
///     card::CreditCard,
///     gateway::{Action, Amount, ConfigurableGateway, GatewayAdapter, TransactionOptions, commit},
///     transport::HttpTransport,
/// };
///
/// # async fn example(gateway: ConfigurableGateway) -> paygate::error::Result<()> {
/// let card = CreditCard::new().with_number("4242424242424242");
/// let amount = Amount::new(1000, "USD")?;
/// let request = gateway.build_request(
///     Action::Purchase,
///     (&card).into(),
///     Some(&amount),
///     &TransactionOptions::new(),
/// )?;
///
/// let response = commit(&gateway, &HttpTransport::new()?, request).await;
/// println!("{}", response.message());
/// # Ok(())
/// # }
/// ```
#[instrument(
    skip_all,
    fields(gateway = adapter.display_name(), action = %request.action(), request_id = field::Empty)
)]
pub async fn commit<A, T>(adapter: &A, transport: &T, mut request: RequestData) -> Response
where
    A: GatewayAdapter + ?Sized,
    T: Transport,
{
    let request_id = Uuid::new_v4();
    Span::current().record("request_id", field::display(request_id));

    let action = request.action();
    let gateway = adapter.display_name();
    let test = adapter.is_test();
    let started = Instant::now();

    let prepared = match prepare(adapter, &mut request) {
        Ok(prepared) => prepared,
        Err(e) => {
            let message = scrub_error(adapter, &e);
            tracing::warn!(error = %message, "request could not be prepared");
            audit!(
                AuditEventType::CommitDeclined,
                gateway,
                request_id,
                with_action(action.as_str()),
                with_error_code(INVALID_REQUEST_CODE),
                with_error(message.as_str()),
                with_test(test)
            );
            return Response::failure(message)
                .with_error_code(Some(INVALID_REQUEST_CODE.to_owned()))
                .with_test(test);
        }
    };

    let Prepared { endpoint, headers, body } = prepared;
    let target = format!("{} {}", endpoint.method, endpoint.url);
    audit!(
        AuditEventType::CommitAttempted,
        gateway,
        request_id,
        with_action(action.as_str()),
        with_endpoint(adapter.scrub(&target)),
        with_test(test)
    );

    let transport_request = TransportRequest {
        method: endpoint.method,
        url: &endpoint.url,
        headers,
        content_type: (!body.is_empty()).then(|| adapter.wire_format().content_type()),
        body: &body,
    };

    let reply = match transport.execute(transport_request).await {
        Ok(reply) => reply,
        Err(e) => {
            let message = scrub_error(adapter, &e);
            tracing::warn!(
                error = %message,
                protocol = transport.protocol_name(),
                "gateway request failed"
            );
            audit!(
                AuditEventType::TransportFailed,
                gateway,
                request_id,
                with_action(action.as_str()),
                with_error_code(CONNECTION_ERROR_CODE),
                with_error(message.as_str()),
                with_duration(started.elapsed()),
                with_test(test)
            );
            return Response::failure(message)
                .with_error_code(Some(CONNECTION_ERROR_CODE.to_owned()))
                .with_test(test);
        }
    };

    let response = interpret(adapter, action, &reply).with_test(test);
    let elapsed = started.elapsed();

    tracing::info!(
        status = reply.status,
        success = response.is_success(),
        duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "gateway replied"
    );

    let event = if response.is_success() {
        let event = AuditEvent::new(AuditEventType::CommitSucceeded, gateway, request_id);
        match response.authorization() {
            Some(authorization) => event.with_authorization(authorization),
            None => event,
        }
    } else {
        let transcript = adapter.scrub(&format!(
            "{target}\n{}\n\nHTTP {}\n{}",
            String::from_utf8_lossy(&body),
            reply.status,
            reply.body_text()
        ));
        let event = AuditEvent::new(AuditEventType::CommitDeclined, gateway, request_id)
            .with_error(response.message())
            .with_transcript(&transcript);
        match response.error_code() {
            Some(code) => event.with_error_code(code),
            None => event,
        }
    };
    audit_log(&event.with_action(action.as_str()).with_duration(elapsed).with_test(test));

    response
}

/// Turns a gateway reply into a [`Response`].
///
/// A 204 status, or a 2xx status with an empty body, becomes the content-less
/// acknowledgment; everything else is parsed and classified by the adapter.
pub fn interpret<A: GatewayAdapter + ?Sized>(
    adapter: &A,
    action: Action,
    reply: &TransportResponse,
) -> Response {
    if reply.is_content_less() {
        return Response::content_less(adapter.content_less_success(action));
    }

    let fields = adapter.parse(&reply.body_text());
    let success = adapter.success_from(action, &fields);
    let message = adapter.message_from(success, &fields);
    let authorization = adapter.authorization_from(&fields);
    let error_code = adapter.error_code_from(&fields);

    Response::new(success, message, fields)
        .with_authorization(authorization)
        .with_error_code(error_code)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::{Value, json};

    use super::*;
    use crate::{
        gateway::{
            Amount, PaymentSource, TransactionOptions,
            traits::ResponseFields,
            wire::{WireFormat, value_text},
        },
        security::Scrubber,
        transport::Method,
    };

    /// Adapter reading `status`, `message`, `token` and `code` from JSON.
    struct StubAdapter {
        scrubber: Scrubber,
        method: Option<Method>,
    }

    impl StubAdapter {
        fn new(method: Method) -> Self {
            Self { scrubber: Scrubber::json(), method: Some(method) }
        }
    }

    impl GatewayAdapter for StubAdapter {
        fn display_name(&self) -> &str {
            "Stub Gateway"
        }

        fn is_test(&self) -> bool {
            true
        }

        fn build_request(
            &self,
            action: Action,
            _source: PaymentSource<'_>,
            _amount: Option<&Amount>,
            _options: &TransactionOptions,
        ) -> Result<RequestData> {
            Ok(RequestData::new(action))
        }

        fn endpoint_for(&self, _action: Action, _request: &RequestData) -> Result<Endpoint> {
            let method = self.method.ok_or_else(|| {
                GatewayError::InvalidInput("void requires a value for authorization".to_owned())
            })?;
            Ok(Endpoint { method, url: "https://stub.test/pay".to_owned() })
        }

        fn authenticate(&self, request: &mut RequestData) -> Result<Vec<(String, String)>> {
            request.set("signature", "abc");
            Ok(vec![("Authorization".to_owned(), "Basic c2VjcmV0".to_owned())])
        }

        fn encode(&self, request: &RequestData) -> Vec<u8> {
            let body: serde_json::Map<String, Value> = request
                .fields()
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            WireFormat::Json.encode("request", &body)
        }

        fn success_from(&self, _action: Action, fields: &ResponseFields) -> bool {
            fields.get("status").and_then(value_text).as_deref() == Some("ok")
        }

        fn message_from(&self, _success: bool, fields: &ResponseFields) -> String {
            fields.get("message").and_then(value_text).unwrap_or_default()
        }

        fn authorization_from(&self, fields: &ResponseFields) -> Option<String> {
            fields.get("token").and_then(value_text)
        }

        fn error_code_from(&self, fields: &ResponseFields) -> Option<String> {
            fields.get("code").and_then(value_text)
        }

        fn content_less_success(&self, action: Action) -> bool {
            action != Action::Verify
        }

        fn scrub(&self, transcript: &str) -> String {
            self.scrubber.scrub(transcript)
        }
    }

    #[derive(Debug, Clone)]
    struct Captured {
        method: Method,
        url: String,
        headers: Vec<(String, String)>,
        content_type: Option<String>,
        body: Vec<u8>,
    }

    /// Transport answering every request with a canned reply.
    struct StubTransport {
        reply: Option<TransportResponse>,
        captured: Mutex<Vec<Captured>>,
    }

    impl StubTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                reply: Some(TransportResponse {
                    status,
                    body: body.as_bytes().to_vec(),
                    headers: vec![],
                }),
                captured: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self { reply: None, captured: Mutex::new(Vec::new()) }
        }

        fn last(&self) -> Captured {
            self.captured.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for StubTransport {
        async fn execute<'a>(&'a self, request: TransportRequest<'a>) -> Result<TransportResponse> {
            self.captured.lock().unwrap().push(Captured {
                method: request.method,
                url: request.url.to_owned(),
                headers: request.headers.clone(),
                content_type: request.content_type.map(str::to_owned),
                body: request.body.to_vec(),
            });
            self.reply.clone().ok_or_else(|| {
                GatewayError::TransportError("connection refused for 4242424242424242".to_owned())
            })
        }

        fn protocol_name(&self) -> &'static str {
            "stub"
        }
    }

    fn purchase() -> RequestData {
        let mut request = RequestData::new(Action::Purchase);
        request.set("amount", "10.00");
        request
    }

    #[tokio::test]
    async fn test_commit_success() {
        let adapter = StubAdapter::new(Method::Post);
        let transport =
            StubTransport::replying(200, r#"{"status":"ok","message":"Approved","token":"T1"}"#);

        let response = commit(&adapter, &transport, purchase()).await;

        assert!(response.is_success());
        assert_eq!(response.message(), "Approved");
        assert_eq!(response.authorization(), Some("T1"));
        assert_eq!(response.error_code(), None);
        assert!(response.is_test());
    }

    #[tokio::test]
    async fn test_commit_sends_authenticated_body() {
        let adapter = StubAdapter::new(Method::Post);
        let transport = StubTransport::replying(200, r#"{"status":"ok"}"#);

        let _ = commit(&adapter, &transport, purchase()).await;

        let sent = transport.last();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.url, "https://stub.test/pay");
        assert_eq!(sent.content_type.as_deref(), Some("application/json"));
        assert_eq!(sent.headers[0].0, "Authorization");
        let body: Value = serde_json::from_slice(&sent.body).unwrap();
        assert_eq!(body, json!({ "amount": "10.00", "signature": "abc" }));
    }

    #[tokio::test]
    async fn test_commit_bodiless_methods() {
        for method in [Method::Get, Method::Delete] {
            let adapter = StubAdapter::new(method);
            let transport = StubTransport::replying(200, r#"{"status":"ok"}"#);

            let _ = commit(&adapter, &transport, purchase()).await;

            let sent = transport.last();
            assert!(sent.body.is_empty());
            assert_eq!(sent.content_type, None);
        }
    }

    #[tokio::test]
    async fn test_commit_decline_keeps_error_code() {
        let adapter = StubAdapter::new(Method::Post);
        let transport = StubTransport::replying(
            402,
            r#"{"status":"declined","message":"Insufficient funds","token":"T1","code":"51"}"#,
        );

        let response = commit(&adapter, &transport, purchase()).await;

        assert!(!response.is_success());
        assert_eq!(response.message(), "Insufficient funds");
        assert_eq!(response.authorization(), None);
        assert_eq!(response.error_code(), Some("51"));
        assert_eq!(response.param("code"), Some(&json!("51")));
    }

    #[tokio::test]
    async fn test_commit_content_less_reply() {
        let adapter = StubAdapter::new(Method::Delete);

        for (status, body) in [(204, ""), (200, ""), (200, "  \n")] {
            let transport = StubTransport::replying(status, body);
            let response = commit(&adapter, &transport, RequestData::new(Action::Void)).await;

            assert!(response.is_success());
            assert!(response.is_content_less());
            assert_eq!(response.param("code"), Some(&json!("204")));
            assert_eq!(response.authorization(), None);
        }

        let transport = StubTransport::replying(204, "");
        let response = commit(&adapter, &transport, RequestData::new(Action::Verify)).await;
        assert!(!response.is_success());
        assert_eq!(response.error_code(), None);
    }

    #[tokio::test]
    async fn test_commit_empty_error_reply_fails() {
        let adapter = StubAdapter::new(Method::Post);

        for status in [401, 500, 502] {
            let transport = StubTransport::replying(status, "");
            let response = commit(&adapter, &transport, purchase()).await;

            assert!(!response.is_success(), "status {status}");
            assert!(!response.is_content_less(), "status {status}");
            assert!(response.message().starts_with("Invalid JSON response received from"));
        }
    }

    #[tokio::test]
    async fn test_commit_unparseable_body() {
        let adapter = StubAdapter::new(Method::Post);
        let transport = StubTransport::replying(500, "<html>Bad Gateway</html>");

        let response = commit(&adapter, &transport, purchase()).await;

        assert!(!response.is_success());
        assert_eq!(response.params().len(), 1);
        assert!(
            response.message().starts_with("Invalid JSON response received from Stub Gateway.")
        );
        assert!(response.message().contains("\"<html>Bad Gateway</html>\""));
    }

    #[tokio::test]
    async fn test_commit_transport_failure_is_downgraded() {
        let adapter = StubAdapter::new(Method::Post);
        let transport = StubTransport::failing();

        let response = commit(&adapter, &transport, purchase()).await;

        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some(CONNECTION_ERROR_CODE));
        assert!(response.message().contains("connection refused"));
        assert!(!response.message().contains("4242424242424242"));
    }

    #[tokio::test]
    async fn test_commit_unresolvable_endpoint() {
        let adapter = StubAdapter { scrubber: Scrubber::json(), method: None };
        let transport = StubTransport::replying(200, r#"{"status":"ok"}"#);

        let response = commit(&adapter, &transport, RequestData::new(Action::Void)).await;

        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some(INVALID_REQUEST_CODE));
        assert!(response.message().contains("authorization"));
        assert!(transport.captured.lock().unwrap().is_empty());
    }

    #[test]
    fn test_interpret_classifies_fields() {
        let adapter = StubAdapter::new(Method::Post);
        let reply = TransportResponse {
            status: 200,
            body: br#"{"status":"ok","message":"Open","token":"P9"}"#.to_vec(),
            headers: vec![],
        };

        let response = interpret(&adapter, Action::Authorize, &reply);
        assert!(response.is_success());
        assert_eq!(response.message(), "Open");
        assert_eq!(response.authorization(), Some("P9"));
    }
}
