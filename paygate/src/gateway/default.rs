//! Configuration-driven gateway adapter.
//!
//! [`ConfigurableGateway`] implements [`GatewayAdapter`] entirely from a
//! [`GatewayConfig`], so a new vendor needs a TOML document rather than code.

use std::{collections::HashMap, fmt, path::Path};

use chrono::Utc;
use serde_json::{Map, Value};

use super::{
    Action, Amount, GatewayConfig, PaymentSource, Response, TransactionOptions,
    commit::commit,
    config::{AuthConfig, DEFAULT_KEY},
    endpoint::ConfigurableEndpointResolver,
    field_map::ConfigurableFieldMapper,
    response::{INVALID_CARD_CODE, INVALID_REQUEST_CODE, PROCESSING_ERROR_CODE},
    traits::{
        Endpoint, EndpointResolver, FieldMapper, GatewayAdapter, RequestData, ResponseFields,
    },
    wire::{WireFormat, insert_path, lookup, value_text},
};
use crate::{
    audit,
    card::{CreditCard, TestOutcome, test_outcome},
    error::{GatewayError, Result},
    security::{Scrubber, audit::AuditEventType, redact_sensitive},
    signing::{AuthScheme, RequestSigner},
    transport::{HttpTransport, Transport},
};

/// Format of the `timestamp` request field.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Authorization returned by a forced test-mode success.
pub const TEST_AUTHORIZATION: &str = "53433";

/// Gateway adapter driven by a [`GatewayConfig`].
///
/// # Examples
///
/// ```no_run
/// use paygate::{
///     card::CreditCard,
///     gateway::{Amount, ConfigurableGateway, TransactionOptions},
/// };
///
/// # async fn example() -> paygate::error::Result<()> {
/// let gateway = ConfigurableGateway::from_file("gateways/acme.toml")?;
///
/// let card = CreditCard::new()
///     .with_number("4111111111111111")
///     .with_expiry(12, 2030)
///     .with_name("Longbob Longsen")
///     .with_verification_value("123");
/// let options = TransactionOptions::new().with_order_id("order-1");
///
/// let response = gateway.purchase(&Amount::new(1000, "USD")?, &card, &options).await;
/// if response.is_success() {
///     println!("authorization: {:?}", response.authorization());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConfigurableGateway<T: Transport = HttpTransport> {
    config: GatewayConfig,
    endpoint_resolver: ConfigurableEndpointResolver,
    field_mapper: ConfigurableFieldMapper,
    header_auth: HashMap<Action, AuthScheme>,
    signer: Option<RequestSigner>,
    scrubber: Scrubber,
    transport: T,
}

impl<T: Transport> fmt::Debug for ConfigurableGateway<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurableGateway")
            .field("name", &self.config.name)
            .field("format", &self.config.format)
            .field("test", &self.config.test)
            .field("protocol", &self.transport.protocol_name())
            .finish_non_exhaustive()
    }
}

impl ConfigurableGateway {
    /// Creates a gateway from TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns error if TOML parsing, validation or HTTP client setup fails.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Self::from_config(GatewayConfig::from_toml(toml_str)?)
    }

    /// Creates a gateway from a configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or the configuration is
    /// invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_config(GatewayConfig::from_file(path)?)
    }

    /// Creates a gateway with an [`HttpTransport`] built from `config.http`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        let transport = HttpTransport::with_config(&config.http)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> ConfigurableGateway<T> {
    /// Creates a gateway that dispatches through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] or
    /// [`GatewayError::MissingCredential`] if the configuration is invalid,
    /// and [`GatewayError::InvalidPattern`] for a bad scrub pattern.
    pub fn with_transport(config: GatewayConfig, transport: T) -> Result<Self> {
        config.validate()?;

        let default_auth = header_scheme(&config.auth)?;
        let mut header_auth = HashMap::new();
        for action in Action::ALL {
            let scheme = match config.endpoint(action).and_then(|e| e.auth.as_ref()) {
                Some(auth) => header_scheme(auth)?,
                None => default_auth.clone(),
            };
            header_auth.insert(action, scheme);
        }

        let signer = config.auth.signer()?;
        let scrubber = config.scrub.scrubber(config.format)?;
        let endpoint_resolver = ConfigurableEndpointResolver::new(&config);
        let field_mapper = ConfigurableFieldMapper::new(&config.field_mappings);

        tracing::debug!(
            gateway = %config.name,
            format = config.format.label(),
            test = config.test,
            "gateway configured"
        );

        Ok(Self {
            config,
            endpoint_resolver,
            field_mapper,
            header_auth,
            signer,
            scrubber,
            transport,
        })
    }

    /// Returns the gateway configuration.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the endpoint resolver.
    #[must_use]
    pub fn endpoint_resolver(&self) -> &dyn EndpointResolver {
        &self.endpoint_resolver
    }

    /// Returns the field mapper.
    #[must_use]
    pub fn field_mapper(&self) -> &dyn FieldMapper {
        &self.field_mapper
    }

    /// Authorizes and captures `amount` on `card`.
    pub async fn purchase(
        &self,
        amount: &Amount,
        card: &CreditCard,
        options: &TransactionOptions,
    ) -> Response {
        self.execute(Action::Purchase, card.into(), Some(amount), options).await
    }

    /// Reserves `amount` on `card`.
    pub async fn authorize(
        &self,
        amount: &Amount,
        card: &CreditCard,
        options: &TransactionOptions,
    ) -> Response {
        self.execute(Action::Authorize, card.into(), Some(amount), options).await
    }

    /// Captures `amount` of an earlier authorization.
    pub async fn capture(
        &self,
        amount: &Amount,
        authorization: &str,
        options: &TransactionOptions,
    ) -> Response {
        self.execute(Action::Capture, PaymentSource::Token(authorization), Some(amount), options)
            .await
    }

    /// Refunds `amount` of a settled transaction.
    pub async fn refund(
        &self,
        amount: &Amount,
        authorization: &str,
        options: &TransactionOptions,
    ) -> Response {
        self.execute(Action::Refund, PaymentSource::Token(authorization), Some(amount), options)
            .await
    }

    /// Cancels a transaction before settlement.
    pub async fn void(&self, authorization: &str, options: &TransactionOptions) -> Response {
        self.execute(Action::Void, PaymentSource::Token(authorization), None, options).await
    }

    /// Checks `card` without moving funds.
    pub async fn verify(&self, card: &CreditCard, options: &TransactionOptions) -> Response {
        self.execute(Action::Verify, card.into(), None, options).await
    }

    /// Sends `amount` to `card` without a prior transaction.
    pub async fn credit(
        &self,
        amount: &Amount,
        card: &CreditCard,
        options: &TransactionOptions,
    ) -> Response {
        self.execute(Action::Credit, card.into(), Some(amount), options).await
    }

    /// Runs `action` end to end: local card checks, request building and
    /// the commit protocol.
    ///
    /// Never fails; problems are reported as an unsuccessful [`Response`].
    pub async fn execute(
        &self,
        action: Action,
        source: PaymentSource<'_>,
        amount: Option<&Amount>,
        options: &TransactionOptions,
    ) -> Response {
        if let Some(card) = source.card() {
            if let Some(response) = self.forced_outcome(card) {
                return response;
            }
            if let Some(response) = self.rejected_card(action, card) {
                return response;
            }
        }

        match self.build_request(action, source, amount, options) {
            Ok(request) => commit(self, &self.transport, request).await,
            Err(e) => {
                let message = redact_sensitive(&e.to_string());
                tracing::warn!(
                    gateway = %self.config.name,
                    %action,
                    error = %message,
                    "invalid request"
                );
                Response::failure(message)
                    .with_error_code(Some(INVALID_REQUEST_CODE.to_owned()))
                    .with_test(self.config.test)
            }
        }
    }

    /// Response to a test-brand card in test mode, without any request.
    fn forced_outcome(&self, card: &CreditCard) -> Option<Response> {
        if !self.config.test || !card.is_bogus() {
            return None;
        }
        let response = match test_outcome(card.number()) {
            Some(TestOutcome::Success) => {
                let mut params = Map::new();
                params.insert("authorization".to_owned(), Value::from(TEST_AUTHORIZATION));
                Response::new(true, "Bogus Gateway: Forced success", params)
                    .with_authorization(Some(TEST_AUTHORIZATION.to_owned()))
            }
            Some(TestOutcome::Failure) => Response::failure("Bogus Gateway: Forced failure")
                .with_error_code(Some(PROCESSING_ERROR_CODE.to_owned())),
            Some(TestOutcome::Error) | None => Response::failure(
                "Bogus Gateway: Use CreditCard number ending in 1 for success, 2 for exception \
                 and anything else for error",
            )
            .with_error_code(Some(PROCESSING_ERROR_CODE.to_owned())),
        };
        Some(response.with_test(true))
    }

    /// Failure response for a card that does not pass the card policy.
    fn rejected_card(&self, action: Action, card: &CreditCard) -> Option<Response> {
        if !self.config.validate_cards {
            return None;
        }
        let policy = &self.config.card_policy;
        let policy = policy.clone().with_test_mode(policy.test_mode || self.config.test);
        let errors = card.validate(&policy);
        if errors.is_empty() {
            return None;
        }

        let message = errors.to_string();
        audit!(
            AuditEventType::ValidationFailed,
            self.config.name.as_str(),
            uuid::Uuid::new_v4(),
            with_action(action.as_str()),
            with_error_code(INVALID_CARD_CODE),
            with_error(message.as_str()),
            with_test(self.config.test)
        );
        Some(
            Response::failure(message)
                .with_error_code(Some(INVALID_CARD_CODE.to_owned()))
                .with_test(self.config.test),
        )
    }

    fn merchant_id(&self) -> Option<&str> {
        match &self.config.auth {
            AuthConfig::Signature { merchant_id, .. } => Some(merchant_id),
            AuthConfig::None | AuthConfig::Basic { .. } | AuthConfig::Bearer { .. } => {
                self.config.merchant_id.as_deref()
            }
        }
    }

    /// Sets `authorization` and the standard fields it splits into.
    fn write_authorization(&self, request: &mut RequestData, authorization: &str) {
        request.set("authorization", authorization);
        let mappings = &self.config.field_mappings;
        if mappings.authorization_parts.is_empty() {
            return;
        }
        let parts = authorization.split(mappings.authorization_separator.as_str());
        for (name, part) in mappings.authorization_parts.iter().zip(parts) {
            request.set(name.as_str(), part);
        }
    }
}

/// First non-empty value among `names`.
fn first_text(fields: &ResponseFields, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| lookup(fields, name).and_then(value_text))
        .find(|text| !text.is_empty())
}

/// Header scheme of an authentication config.
fn header_scheme(auth: &AuthConfig) -> Result<AuthScheme> {
    match auth {
        AuthConfig::Basic { key, secret } => AuthScheme::basic(key, secret),
        AuthConfig::Bearer { token } => AuthScheme::bearer(token),
        AuthConfig::None | AuthConfig::Signature { .. } => Ok(AuthScheme::None),
    }
}

/// Writes the standard `card.*` fields.
fn write_card(request: &mut RequestData, card: &CreditCard) {
    request.set("card.number", card.number());
    request.set_opt("card.brand", card.brand());
    if let Some(month) = card.month() {
        request.set("card.month", format!("{month:02}"));
    }
    if let Some(year) = card.year() {
        request.set("card.year", year.to_string());
        request.set("card.year2", format!("{:02}", year.rem_euclid(100)));
        if let Some(month) = card.month() {
            request.set("card.expiry", format!("{month:02}{:02}", year.rem_euclid(100)));
        }
    }
    request.set_opt("card.first_name", card.first_name());
    request.set_opt("card.last_name", card.last_name());
    if card.has_name() {
        request.set("card.name", card.name());
    }
    request.set_opt("card.verification_value", card.verification_value());
    request.set_opt("card.issue_number", card.issue_number());
    request.set_opt("card.track_data", card.track_data());
    request.set_opt("card.icc_data", card.icc_data());
    request.set("card.first_digits", card.first_digits());
    request.set("card.last_digits", card.last_digits());
}

impl<T: Transport> GatewayAdapter for ConfigurableGateway<T> {
    fn display_name(&self) -> &str {
        &self.config.name
    }

    fn is_test(&self) -> bool {
        self.config.test
    }

    fn wire_format(&self) -> WireFormat {
        self.config.format
    }

    fn build_request(
        &self,
        action: Action,
        source: PaymentSource<'_>,
        amount: Option<&Amount>,
        options: &TransactionOptions,
    ) -> Result<RequestData> {
        let mut request = RequestData::new(action);

        match amount {
            Some(amount) => {
                if let Some(currency) = &options.currency
                    && !currency.eq_ignore_ascii_case(amount.currency())
                {
                    return Err(GatewayError::InvalidInput(format!(
                        "currency {currency} does not match amount in {}",
                        amount.currency()
                    )));
                }
                let amount = if action == Action::Refund && self.config.negative_refunds {
                    amount.negated()
                } else {
                    amount.clone()
                };
                request.set("amount", self.config.amount_format.format(&amount));
                request.set("currency", amount.currency());
            }
            None if action.has_amount() => {
                return Err(GatewayError::InvalidInput(format!("{action} requires an amount")));
            }
            None => {
                let currency = options.currency.as_deref().unwrap_or(&self.config.default_currency);
                request.set("currency", currency.to_ascii_uppercase());
            }
        }

        request.set_opt("order_id", options.order_id.as_deref());
        request.set_opt("description", options.description.as_deref());
        request.set_opt("ip", options.ip.as_deref());
        request.set_opt("merchant_id", self.merchant_id());
        request.set("timestamp", Utc::now().format(TIMESTAMP_FORMAT).to_string());

        match source {
            PaymentSource::Card(card) => write_card(&mut request, card),
            PaymentSource::Token(authorization) => {
                self.write_authorization(&mut request, authorization);
            }
            PaymentSource::None => {}
        }
        if action.references_authorization()
            && request.field("authorization").is_none_or(str::is_empty)
        {
            return Err(GatewayError::InvalidInput(format!("{action} requires an authorization")));
        }

        if let Some(address) = &options.billing_address {
            for (name, value) in address.fields() {
                request.set(format!("billing.{name}"), value);
            }
        }

        request.set_extra(options.metadata.clone());
        Ok(request)
    }

    fn endpoint_for(&self, action: Action, request: &RequestData) -> Result<Endpoint> {
        self.endpoint_resolver.resolve(action, request, self.config.test)
    }

    fn authenticate(&self, request: &mut RequestData) -> Result<Vec<(String, String)>> {
        let action = request.action();

        if let Some(signer) = &self.signer
            && let AuthConfig::Signature { fields, field, refund_secret, credit_secret, .. } =
                &self.config.auth
        {
            let dependent_secret = match action {
                Action::Refund => refund_secret.as_deref(),
                Action::Credit => credit_secret.as_deref(),
                _ => None,
            };
            if let Some(secret) = dependent_secret {
                request.set("refund_hash", signer.dependent_hash(secret));
            }

            let names = fields.get(action.as_str()).or_else(|| fields.get(DEFAULT_KEY)).ok_or_else(
                || GatewayError::ConfigError(format!("no signed fields configured for {action}")),
            )?;
            let values: Vec<&str> = names.iter().map(|name| request.field_or_empty(name)).collect();
            let signature = signer.sign(&values);
            request.set(field.as_str(), signature);
        }

        Ok(self.header_auth.get(&action).map(AuthScheme::headers).unwrap_or_default())
    }

    fn encode(&self, request: &RequestData) -> Vec<u8> {
        let mut body = Map::new();
        let constants = &self.config.field_mappings.constants;
        for key in [DEFAULT_KEY, request.action().as_str()] {
            if let Some(values) = constants.get(key) {
                for (path, value) in values {
                    insert_path(&mut body, path, value.clone());
                }
            }
        }
        self.field_mapper.write_request(request, &mut body);
        for (path, value) in request.extra() {
            insert_path(&mut body, path, value.clone());
        }
        self.config.format.encode(&self.config.root_element, &body)
    }

    fn parse(&self, body: &str) -> ResponseFields {
        let fields = super::wire::parse(self.config.format, body, &self.config.name);
        self.field_mapper.rename_response(fields)
    }

    fn success_from(&self, _action: Action, fields: &ResponseFields) -> bool {
        let response = &self.config.response;
        lookup(fields, &response.status_field)
            .and_then(value_text)
            .is_some_and(|status| response.success_values.iter().any(|value| *value == status))
    }

    fn message_from(&self, success: bool, fields: &ResponseFields) -> String {
        let response = &self.config.response;
        let mut names = Vec::with_capacity(3);
        if !success && let Some(field) = &response.failure_message_field {
            names.push(field.as_str());
        }
        names.push(response.message_field.as_str());
        names.push("message");
        first_text(fields, &names).unwrap_or_default()
    }

    fn authorization_from(&self, fields: &ResponseFields) -> Option<String> {
        let response = &self.config.response;
        let parts: Vec<Option<String>> = response
            .authorization_fields
            .iter()
            .map(|name| lookup(fields, name).and_then(value_text))
            .collect();
        if parts.iter().all(Option::is_none) {
            return None;
        }
        let parts: Vec<String> = parts.into_iter().map(Option::unwrap_or_default).collect();
        Some(parts.join(&response.authorization_separator))
    }

    fn error_code_from(&self, fields: &ResponseFields) -> Option<String> {
        lookup(fields, &self.config.response.error_code_field)
            .and_then(value_text)
            .filter(|code| !code.is_empty())
    }

    fn content_less_success(&self, _action: Action) -> bool {
        self.config.response.content_less_success
    }

    fn scrub(&self, transcript: &str) -> String {
        self.scrubber.scrub(transcript)
    }
}

#[cfg(test)]
#[allow(
    clippy::unreachable,
    reason = "test code uses unreachable for expected-path assertions"
)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{card::BOGUS_BRAND, transport::Method};

    const JSON_CONFIG: &str = r#"
        name = "Priority Gateway"
        live_url = "https://api.gateway.test/v1/transactions"
        test = true
        negative_refunds = true

        [auth]
        type = "basic"
        key = "api_key"
        secret = "api_secret"

        [endpoints.default]
        path = "?echo=true"

        [endpoints.void]
        method = "DELETE"
        path = "/{authorization}?force=true"

        [endpoints.verify]
        method = "GET"
        path = "?search={card.first_digits}"
        live_url = "https://api.gateway.test/v1/bin"
        auth = { type = "bearer", token = "jwt_token" }

        [field_mappings.request]
        amount = "amount"
        "card.number" = "cardAccount.number"
        "card.verification_value" = "cardAccount.cvv"
        "card.month" = "cardAccount.expiryMonth"
        order_id = "orderId"
        authorization = "paymentToken"

        [field_mappings.constants.default]
        tenderType = "Card"

        [response]
        success_values = ["Approved", "Open"]
        failure_message_field = "authMessage"
        authorization_fields = ["paymentToken"]
        error_code_field = "errorCode"
    "#;

    fn gateway() -> ConfigurableGateway {
        ConfigurableGateway::from_toml(JSON_CONFIG).unwrap()
    }

    fn card() -> CreditCard {
        CreditCard::new()
            .with_number("4111111111111111")
            .with_expiry(9, 2030)
            .with_name("Longbob Longsen")
            .with_verification_value("999")
    }

    fn usd(minor_units: i64) -> Amount {
        Amount::new(minor_units, "USD").unwrap()
    }

    #[test]
    fn test_build_request_standard_fields() {
        let gateway = gateway();
        let options = TransactionOptions::new().with_order_id("1").with_description("Store");
        let request = gateway
            .build_request(Action::Purchase, (&card()).into(), Some(&usd(1000)), &options)
            .unwrap();

        assert_eq!(request.field("amount"), Some("10.00"));
        assert_eq!(request.field("currency"), Some("USD"));
        assert_eq!(request.field("order_id"), Some("1"));
        assert_eq!(request.field("card.number"), Some("4111111111111111"));
        assert_eq!(request.field("card.month"), Some("09"));
        assert_eq!(request.field("card.year"), Some("2030"));
        assert_eq!(request.field("card.expiry"), Some("0930"));
        assert_eq!(request.field("card.first_name"), Some("Longbob"));
        assert_eq!(request.field("card.first_digits"), Some("411111"));
        assert_eq!(request.field("timestamp").map(str::len), Some(14));
    }

    #[test]
    fn test_build_request_negative_refund() {
        let gateway = gateway();
        let request = gateway
            .build_request(
                Action::Refund,
                PaymentSource::Token("10000001625060"),
                Some(&usd(1025)),
                &TransactionOptions::new(),
            )
            .unwrap();
        assert_eq!(request.field("amount"), Some("-10.25"));
        assert_eq!(request.field("authorization"), Some("10000001625060"));
    }

    #[test]
    fn test_build_request_requires_amount_and_authorization() {
        let gateway = gateway();
        let options = TransactionOptions::new();

        let missing_amount =
            gateway.build_request(Action::Purchase, (&card()).into(), None, &options);
        assert!(matches!(missing_amount, Err(GatewayError::InvalidInput(_))));

        let missing_token =
            gateway.build_request(Action::Capture, PaymentSource::None, Some(&usd(100)), &options);
        match missing_token {
            Err(GatewayError::InvalidInput(msg)) => assert!(msg.contains("authorization")),
            _ => unreachable!("expected InvalidInput"),
        }
    }

    #[test]
    fn test_build_request_currency_mismatch() {
        let gateway = gateway();
        let options = TransactionOptions::new().with_currency("EUR");
        let result =
            gateway.build_request(Action::Purchase, (&card()).into(), Some(&usd(100)), &options);
        assert!(matches!(result, Err(GatewayError::InvalidInput(_))));
    }

    #[test]
    fn test_encode_maps_fields_and_constants() {
        let gateway = gateway();
        let options = TransactionOptions::new().with_order_id("1").with_metadata("source", "web");
        let request = gateway
            .build_request(Action::Purchase, (&card()).into(), Some(&usd(1000)), &options)
            .unwrap();

        let body: Value = serde_json::from_slice(&gateway.encode(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "amount": "10.00",
                "cardAccount": { "number": "4111111111111111", "cvv": "999", "expiryMonth": "09" },
                "orderId": "1",
                "tenderType": "Card",
                "source": "web"
            })
        );
    }

    #[test]
    fn test_authenticate_uses_endpoint_override() {
        let gateway = gateway();

        let mut purchase = RequestData::new(Action::Purchase);
        let headers = gateway.authenticate(&mut purchase).unwrap();
        assert_eq!(
            headers,
            [("Authorization".to_owned(), "Basic YXBpX2tleTphcGlfc2VjcmV0".to_owned())]
        );

        let mut verify = RequestData::new(Action::Verify);
        let headers = gateway.authenticate(&mut verify).unwrap();
        assert_eq!(headers, [("Authorization".to_owned(), "Bearer jwt_token".to_owned())]);
    }

    #[test]
    fn test_endpoint_for_void() {
        let gateway = gateway();
        let mut request = RequestData::new(Action::Void);
        request.set("authorization", "10000001625060");

        let endpoint = gateway.endpoint_for(Action::Void, &request).unwrap();
        assert_eq!(endpoint.method, Method::Delete);
        assert_eq!(
            endpoint.url,
            "https://api.gateway.test/v1/transactions/10000001625060?force=true"
        );
    }

    #[test]
    fn test_classification() {
        let gateway = gateway();
        let approved =
            gateway.parse(r#"{"status":"Approved","paymentToken":"P1","authMessage":"ok"}"#);
        assert!(gateway.success_from(Action::Purchase, &approved));
        assert_eq!(gateway.authorization_from(&approved), Some("P1".to_owned()));

        let declined = gateway.parse(
            r#"{"status":"Declined","authMessage":"Invalid card number","errorCode":"14"}"#,
        );
        assert!(!gateway.success_from(Action::Purchase, &declined));
        assert_eq!(gateway.message_from(false, &declined), "Invalid card number");
        assert_eq!(gateway.error_code_from(&declined), Some("14".to_owned()));

        let no_status = gateway.parse(r#"{"message":"Unauthorized"}"#);
        assert!(!gateway.success_from(Action::Purchase, &no_status));
        assert_eq!(gateway.message_from(false, &no_status), "Unauthorized");
    }

    #[test]
    fn test_success_message_uses_status_field_when_configured() {
        let config = JSON_CONFIG.replace(
            "failure_message_field = \"authMessage\"",
            "failure_message_field = \"authMessage\"\n        message_field = \"status\"",
        );
        let gateway = ConfigurableGateway::from_toml(&config).unwrap();
        let approved =
            gateway.parse(r#"{"status":"Approved","authMessage":"Approved or completed"}"#);
        assert_eq!(gateway.message_from(true, &approved), "Approved");
    }

    #[test]
    fn test_authorization_parts_round_trip() {
        let gateway = ConfigurableGateway::from_toml(
            r#"
            name = "Tagged"
            live_url = "https://epage.gateway.test/epage-remote.cgi"
            format = "tagged"

            [field_mappings]
            authorization_parts = ["order_id", "pasref", "authcode"]

            [response]
            authorization_fields = ["orderid", "pasref", "authcode"]
            "#,
        )
        .unwrap();

        let fields = gateway.parse(concat!(
            "<response><orderid>1</orderid><pasref>4321</pasref>",
            "<authcode>1234</authcode></response>",
        ));
        let authorization = gateway.authorization_from(&fields).unwrap();
        assert_eq!(authorization, "1;4321;1234");

        let request = gateway
            .build_request(
                Action::Capture,
                PaymentSource::Token(&authorization),
                Some(&Amount::new(100, "EUR").unwrap()),
                &TransactionOptions::new(),
            )
            .unwrap();
        assert_eq!(request.field("order_id"), Some("1"));
        assert_eq!(request.field("pasref"), Some("4321"));
        assert_eq!(request.field("authcode"), Some("1234"));
    }

    #[test]
    fn test_forced_outcomes_in_test_mode() {
        let gateway = gateway();
        let success = CreditCard::new().with_number("1").with_brand(BOGUS_BRAND);
        let response = gateway.forced_outcome(&success).unwrap();
        assert!(response.is_success());
        assert_eq!(response.authorization(), Some(TEST_AUTHORIZATION));

        let failure = CreditCard::new().with_number("2").with_brand(BOGUS_BRAND);
        let response = gateway.forced_outcome(&failure).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some(PROCESSING_ERROR_CODE));

        assert!(gateway.forced_outcome(&card()).is_none());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let config = JSON_CONFIG.replace("secret = \"api_secret\"", "secret = \"\"");
        match ConfigurableGateway::from_toml(&config) {
            Err(GatewayError::MissingCredential(name)) => assert_eq!(name, "secret"),
            _ => unreachable!("expected MissingCredential"),
        }
    }

    #[test]
    fn test_debug_hides_credentials() {
        let debug = format!("{:?}", gateway());
        assert!(debug.contains("Priority Gateway"));
        assert!(!debug.contains("api_secret"));
    }
}
