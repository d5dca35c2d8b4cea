//! Gateway configuration types.
//!
//! A [`GatewayConfig`] is deserialized from TOML and describes everything a
//! [`ConfigurableGateway`](super::ConfigurableGateway) needs to talk to one
//! vendor: URLs, per-action endpoints, authentication, field names, response
//! classification and scrubbing rules.

use std::{collections::HashMap, fmt, path::Path};

use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use super::{Action, Amount, AmountFormat, wire::WireFormat};
use crate::{
    card::CardPolicy,
    error::{GatewayError, Result},
    security::Scrubber,
    signing::{DEFAULT_SEPARATOR, HashAlgorithm, RequestSigner},
    transport::{HttpConfig, Method},
};

/// Key of the endpoint, constants and signature entries used when an action
/// has no entry of its own.
pub const DEFAULT_KEY: &str = "default";

/// Root gateway configuration.
///
/// # Examples
///
/// ```
/// use paygate::gateway::GatewayConfig;
///
/// let config = GatewayConfig::from_toml(
///     r#"
///     name = "Example Gateway"
///     live_url = "https://api.example.com/v1/payments"
///
///     [auth]
///     type = "bearer"
///     token = "tok_live"
///     "#,
/// )?;
///
/// assert_eq!(config.base_url(false), "https://api.example.com/v1/payments");
/// assert_eq!(config.base_url(true), "https://api.example.com/v1/payments");
/// # Ok::<(), paygate::error::GatewayError>(())
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Display name, used in messages and logs.
    pub name: String,

    /// Production base URL.
    pub live_url: String,

    /// Sandbox base URL; defaults to `live_url`.
    #[serde(default)]
    pub test_url: Option<String>,

    /// Send requests to the sandbox and mark responses as test.
    #[serde(default)]
    pub test: bool,

    /// Body encoding.
    #[serde(default)]
    pub format: WireFormat,

    /// Root element of tag-delimited bodies.
    #[serde(default = "default_root_element")]
    pub root_element: String,

    /// Currency for requests that carry no amount.
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// How amounts are written.
    #[serde(default)]
    pub amount_format: AmountFormat,

    /// Send refund amounts as negative values.
    #[serde(default)]
    pub negative_refunds: bool,

    /// Merchant identifier sent as the `merchant_id` request field.
    #[serde(default)]
    pub merchant_id: Option<String>,

    /// Endpoints keyed by action name or `"default"`.
    #[serde(default)]
    pub endpoints: HashMap<String, EndpointConfig>,

    /// Authentication scheme.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Request and response field names.
    #[serde(default)]
    pub field_mappings: FieldMappingConfig,

    /// Response classification.
    #[serde(default)]
    pub response: ResponseConfig,

    /// Transcript scrubbing rules.
    #[serde(default)]
    pub scrub: ScrubConfig,

    /// Validate cards before sending them.
    #[serde(default)]
    pub validate_cards: bool,

    /// Policy applied when `validate_cards` is set.
    #[serde(default)]
    pub card_policy: CardPolicy,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_root_element() -> String {
    "request".to_owned()
}

fn default_currency() -> String {
    "USD".to_owned()
}

impl GatewayConfig {
    /// Parses a configuration from TOML and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if the document is malformed or
    /// invalid, and [`GatewayError::MissingCredential`] if a credential is
    /// blank.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| GatewayError::ConfigError(format!("invalid gateway config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if the file cannot be read, plus
    /// everything [`from_toml`](Self::from_toml) returns.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    /// Validates the configuration.
    ///
    /// This method checks for:
    /// - URLs must be HTTPS and not localhost or loopback
    /// - Endpoint keys must name an action or `"default"`
    /// - Endpoint paths must not contain traversal sequences
    /// - Field names must not be empty or forbidden
    /// - Credentials must be present
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] or
    /// [`GatewayError::MissingCredential`] if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::ConfigError("name cannot be empty".to_owned()));
        }

        validate_gateway_url("live_url", &self.live_url)?;
        if let Some(test_url) = &self.test_url {
            validate_gateway_url("test_url", test_url)?;
        }

        if self.root_element.is_empty()
            || !self.root_element.chars().all(|c| c.is_ascii_alphanumeric() || "-_:".contains(c))
        {
            return Err(GatewayError::ConfigError(format!(
                "invalid root_element: {:?}",
                self.root_element
            )));
        }

        let currency = &self.default_currency;
        Amount::new(0, currency).map_err(|_| {
            GatewayError::ConfigError(format!("invalid default_currency: {currency}"))
        })?;

        if let Some(merchant_id) = &self.merchant_id
            && merchant_id.trim().is_empty()
        {
            return Err(GatewayError::MissingCredential("merchant_id".to_owned()));
        }

        for (key, endpoint) in &self.endpoints {
            validate_action_key("endpoints", key)?;
            endpoint.validate(key)?;
        }

        self.auth.validate()?;
        self.field_mappings.validate()?;
        self.response.validate()?;
        self.http.validate()?;
        self.card_policy.validate()?;

        Ok(())
    }

    /// Base URL for the live or test environment.
    #[must_use]
    pub fn base_url(&self, test: bool) -> &str {
        match &self.test_url {
            Some(test_url) if test => test_url,
            _ => &self.live_url,
        }
    }

    /// Endpoint for `action`, falling back to the `"default"` entry.
    #[must_use]
    pub fn endpoint(&self, action: Action) -> Option<&EndpointConfig> {
        self.endpoints.get(action.as_str()).or_else(|| self.endpoints.get(DEFAULT_KEY))
    }
}

/// Validates a gateway URL.
fn validate_gateway_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| GatewayError::ConfigError(format!("invalid {field} '{value}': {e}")))?;

    if url.scheme() != "https" {
        return Err(GatewayError::ConfigError(format!(
            "{field} must use HTTPS, got: {}",
            url.scheme()
        )));
    }

    if let Some(host) = url.host_str() {
        let host_lower = host.to_lowercase();
        if host_lower == "localhost"
            || host_lower == "::1"
            || host_lower == "[::1]"
            || host_lower.starts_with("127.")
        {
            return Err(GatewayError::ConfigError(format!(
                "{field} must not be localhost or loopback: {host}"
            )));
        }
    }

    Ok(())
}

/// Checks that a table key names an action or the fallback entry.
fn validate_action_key(table: &str, key: &str) -> Result<()> {
    if key == DEFAULT_KEY || key.parse::<Action>().is_ok() {
        return Ok(());
    }
    Err(GatewayError::ConfigError(format!("{table} has unknown action key: {key}")))
}

/// Where one action is sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointConfig {
    /// HTTP method.
    #[serde(default)]
    pub method: Method,

    /// Path appended to the base URL, with `{field}` placeholders. Empty
    /// means the base URL itself.
    #[serde(default)]
    pub path: String,

    /// Overrides the live base URL for this action.
    #[serde(default)]
    pub live_url: Option<String>,

    /// Overrides the test base URL for this action.
    #[serde(default)]
    pub test_url: Option<String>,

    /// Header authentication used instead of `[auth]` for this action.
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

impl EndpointConfig {
    /// Validates the path template, URL overrides and authentication.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if the path or a URL is invalid,
    /// and [`GatewayError::MissingCredential`] for a blank credential.
    pub fn validate(&self, name: &str) -> Result<()> {
        if !self.path.is_empty() {
            validate_endpoint_path(name, &self.path)?;
        }
        if let Some(live_url) = &self.live_url {
            validate_gateway_url(&format!("endpoints.{name}.live_url"), live_url)?;
        }
        if let Some(test_url) = &self.test_url {
            validate_gateway_url(&format!("endpoints.{name}.test_url"), test_url)?;
        }
        if let Some(auth) = &self.auth {
            if matches!(auth, AuthConfig::Signature { .. }) {
                return Err(GatewayError::ConfigError(format!(
                    "endpoint '{name}' may only override header authentication"
                )));
            }
            auth.validate()?;
        }
        Ok(())
    }
}

/// Validates an endpoint path template for security issues.
///
/// The template may start with `/` or `?` and must not contain `..`, `//`
/// or unbalanced placeholder braces.
pub(crate) fn validate_endpoint_path(name: &str, path: &str) -> Result<()> {
    if path.contains("..") {
        return Err(GatewayError::ConfigError(format!(
            "endpoint '{name}' contains path traversal sequence '..': {path}"
        )));
    }

    if path.contains("//") {
        return Err(GatewayError::ConfigError(format!(
            "endpoint '{name}' contains double slash '//': {path}"
        )));
    }

    if !path.starts_with('/') && !path.starts_with('?') {
        return Err(GatewayError::ConfigError(format!(
            "endpoint '{name}' must start with '/' or '?': {path}"
        )));
    }

    let mut depth = 0_usize;
    for ch in path.chars() {
        match ch {
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            '}' => depth = usize::MAX,
            _ => {}
        }
        if depth > 1 {
            break;
        }
    }
    if depth != 0 {
        return Err(GatewayError::ConfigError(format!(
            "endpoint '{name}' has unbalanced placeholder braces: {path}"
        )));
    }

    Ok(())
}

/// Authentication configuration.
#[derive(Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication.
    #[default]
    None,
    /// HTTP Basic authentication.
    Basic {
        /// API key or user name.
        key: String,
        /// API secret or password.
        secret: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// Access token.
        token: String,
    },
    /// Digest of request fields carried in the body.
    Signature {
        /// Merchant identifier, also sent as `merchant_id`.
        merchant_id: String,
        /// Shared secret.
        secret: String,
        /// Separator between signed fields.
        #[serde(default = "default_separator")]
        separator: String,
        /// Hash function.
        #[serde(default)]
        algorithm: HashAlgorithm,
        /// Signed request fields, keyed by action name or `"default"`.
        #[serde(default)]
        fields: HashMap<String, Vec<String>>,
        /// Request field that receives the signature.
        #[serde(default = "default_signature_field")]
        field: String,
        /// Secret whose digest authorizes refunds, sent as `refund_hash`.
        #[serde(default)]
        refund_secret: Option<String>,
        /// Secret whose digest authorizes credits, sent as `refund_hash`.
        #[serde(default)]
        credit_secret: Option<String>,
    },
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_owned()
}

fn default_signature_field() -> String {
    "signature".to_owned()
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { key, .. } => {
                f.debug_struct("Basic").field("key", key).field("secret", &"[FILTERED]").finish()
            }
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"[FILTERED]").finish(),
            Self::Signature { merchant_id, separator, algorithm, fields, field, .. } => f
                .debug_struct("Signature")
                .field("merchant_id", merchant_id)
                .field("secret", &"[FILTERED]")
                .field("separator", separator)
                .field("algorithm", algorithm)
                .field("fields", fields)
                .field("field", field)
                .finish_non_exhaustive(),
        }
    }
}

impl AuthConfig {
    /// Validates that every credential is present.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingCredential`] for a blank credential and
    /// [`GatewayError::ConfigError`] for missing or unknown signature keys or
    /// an invalid field name.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::None => {}
            Self::Basic { key, secret } => {
                require_credential("key", key)?;
                require_credential("secret", secret)?;
            }
            Self::Bearer { token } => require_credential("token", token)?,
            Self::Signature {
                merchant_id,
                secret,
                fields,
                field,
                refund_secret,
                credit_secret,
                ..
            } => {
                require_credential("merchant_id", merchant_id)?;
                require_credential("secret", secret)?;
                if let Some(refund_secret) = refund_secret {
                    require_credential("refund_secret", refund_secret)?;
                }
                if let Some(credit_secret) = credit_secret {
                    require_credential("credit_secret", credit_secret)?;
                }
                validate_field_name("signature field", field)?;
                if fields.is_empty() {
                    return Err(GatewayError::ConfigError(
                        "auth.fields must list the signed fields".to_owned(),
                    ));
                }
                for (key, names) in fields {
                    validate_action_key("auth.fields", key)?;
                    for name in names {
                        validate_field_name("signed field", name)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Builds the body signer of a signature scheme.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingCredential`] if the secret is blank.
    pub fn signer(&self) -> Result<Option<RequestSigner>> {
        match self {
            Self::Signature { secret, separator, algorithm, .. } => Ok(Some(
                RequestSigner::new()
                    .with_separator(separator.as_str())
                    .with_algorithm(*algorithm)
                    .with_secret(secret.as_str())?,
            )),
            Self::None | Self::Basic { .. } | Self::Bearer { .. } => Ok(None),
        }
    }
}

fn require_credential(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::MissingCredential(name.to_owned()));
    }
    Ok(())
}

/// Field name mappings and static request values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldMappingConfig {
    /// Request field mappings (standard -> vendor path).
    #[serde(default)]
    pub request: HashMap<String, String>,

    /// Response field mappings (vendor -> standard).
    #[serde(default)]
    pub response: HashMap<String, String>,

    /// Send standard fields without a mapping under their own names.
    #[serde(default)]
    pub pass_through_unmapped: bool,

    /// Static body values keyed by action name or `"default"`, written to
    /// vendor paths.
    #[serde(default)]
    pub constants: HashMap<String, Map<String, Value>>,

    /// Standard field names that a stored authorization splits into.
    #[serde(default)]
    pub authorization_parts: Vec<String>,

    /// Separator of the authorization parts.
    #[serde(default = "default_authorization_separator")]
    pub authorization_separator: String,
}

fn default_authorization_separator() -> String {
    ";".to_owned()
}

/// Forbidden field names that could indicate injection attempts.
const FORBIDDEN_FIELD_NAMES: &[&str] = &[
    "__proto__",
    "constructor",
    "prototype",
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
];

impl FieldMappingConfig {
    /// Validates field names.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if any field name is invalid.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in &self.request {
            validate_field_name("request key", key)?;
            validate_field_name("request value", value)?;
        }

        for (key, value) in &self.response {
            validate_field_name("response key", key)?;
            validate_field_name("response value", value)?;
        }

        for (key, values) in &self.constants {
            validate_action_key("field_mappings.constants", key)?;
            for path in values.keys() {
                validate_field_name("constant", path)?;
            }
        }

        for name in &self.authorization_parts {
            validate_field_name("authorization part", name)?;
        }
        if !self.authorization_parts.is_empty() && self.authorization_separator.is_empty() {
            return Err(GatewayError::ConfigError(
                "authorization_separator cannot be empty".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Validates a field name or dotted path.
///
/// Every dot-separated segment must be non-empty, free of control characters
/// and not one of the forbidden names.
pub(crate) fn validate_field_name(context: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(GatewayError::ConfigError(format!("{context} cannot be empty")));
    }

    if name.chars().any(char::is_control) {
        return Err(GatewayError::ConfigError(format!(
            "{context} contains control characters: {name:?}"
        )));
    }

    for segment in name.split('.') {
        if segment.is_empty() {
            return Err(GatewayError::ConfigError(format!(
                "{context} has an empty path segment: {name}"
            )));
        }
        if FORBIDDEN_FIELD_NAMES.contains(&segment) {
            return Err(GatewayError::ConfigError(format!(
                "{context} contains forbidden name: {segment}"
            )));
        }
    }

    Ok(())
}

/// How a parsed response is classified.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseConfig {
    /// Field holding the status.
    #[serde(default = "default_status_field")]
    pub status_field: String,

    /// Status values that mean success.
    #[serde(default = "default_success_values")]
    pub success_values: Vec<String>,

    /// Message field of a successful response.
    #[serde(default = "default_message_field")]
    pub message_field: String,

    /// Message field of a failed response; falls back to `message_field`.
    #[serde(default)]
    pub failure_message_field: Option<String>,

    /// Fields joined into the authorization token, in order.
    #[serde(default = "default_authorization_fields")]
    pub authorization_fields: Vec<String>,

    /// Separator between authorization fields.
    #[serde(default = "default_authorization_separator")]
    pub authorization_separator: String,

    /// Field holding the vendor error code.
    #[serde(default = "default_error_code_field")]
    pub error_code_field: String,

    /// Whether a content-less reply counts as success.
    #[serde(default = "default_true")]
    pub content_less_success: bool,
}

fn default_status_field() -> String {
    "status".to_owned()
}

fn default_success_values() -> Vec<String> {
    vec!["success".to_owned()]
}

fn default_message_field() -> String {
    "message".to_owned()
}

fn default_authorization_fields() -> Vec<String> {
    vec!["authorization".to_owned()]
}

fn default_error_code_field() -> String {
    "error_code".to_owned()
}

const fn default_true() -> bool {
    true
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            status_field: default_status_field(),
            success_values: default_success_values(),
            message_field: default_message_field(),
            failure_message_field: None,
            authorization_fields: default_authorization_fields(),
            authorization_separator: default_authorization_separator(),
            error_code_field: default_error_code_field(),
            content_less_success: true,
        }
    }
}

impl ResponseConfig {
    /// Validates field names.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if a field name is invalid or no
    /// success value is configured.
    pub fn validate(&self) -> Result<()> {
        validate_field_name("status_field", &self.status_field)?;
        validate_field_name("message_field", &self.message_field)?;
        validate_field_name("error_code_field", &self.error_code_field)?;
        if let Some(field) = &self.failure_message_field {
            validate_field_name("failure_message_field", field)?;
        }
        for field in &self.authorization_fields {
            validate_field_name("authorization_fields", field)?;
        }
        if self.success_values.is_empty() {
            return Err(GatewayError::ConfigError("success_values cannot be empty".to_owned()));
        }
        Ok(())
    }
}

/// Built-in scrubbing rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrubPreset {
    /// JSON bodies and authorization headers.
    Json,
    /// Tag-delimited bodies.
    Tagged,
    /// Both of the above.
    Standard,
    /// No built-in rules.
    None,
}

/// Transcript scrubbing rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrubConfig {
    /// Built-in rules; chosen from the wire format when unset.
    #[serde(default)]
    pub preset: Option<ScrubPreset>,

    /// Extra rules, each capturing the prefix to keep.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl ScrubConfig {
    /// Builds the scrubber for a gateway speaking `format`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidPattern`] if a pattern does not compile.
    pub fn scrubber(&self, format: WireFormat) -> Result<Scrubber> {
        let preset = self.preset.unwrap_or(match format {
            WireFormat::Json => ScrubPreset::Json,
            WireFormat::Tagged => ScrubPreset::Tagged,
        });
        let base = match preset {
            ScrubPreset::Json => Scrubber::json(),
            ScrubPreset::Tagged => Scrubber::tagged(),
            ScrubPreset::Standard => Scrubber::standard(),
            ScrubPreset::None => Scrubber::new(),
        };
        Ok(base.extend(Scrubber::from_patterns(&self.patterns)?))
    }
}

#[cfg(test)]
#[allow(
    clippy::unreachable,
    reason = "test code uses unreachable for expected-path assertions"
)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        name = "Test"
        live_url = "https://gateway.test.com/payments"
    "#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = GatewayConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.name, "Test");
        assert_eq!(config.format, WireFormat::Json);
        assert_eq!(config.root_element, "request");
        assert_eq!(config.default_currency, "USD");
        assert!(!config.test);
        assert!(matches!(config.auth, AuthConfig::None));
        assert_eq!(config.response.status_field, "status");
        assert!(config.response.content_less_success);
    }

    #[test]
    fn test_base_url_falls_back_to_live() {
        let mut config = GatewayConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.base_url(true), "https://gateway.test.com/payments");

        config.test_url = Some("https://sandbox.test.com/payments".to_owned());
        assert_eq!(config.base_url(true), "https://sandbox.test.com/payments");
        assert_eq!(config.base_url(false), "https://gateway.test.com/payments");
    }

    #[test]
    fn test_endpoints_from_toml() {
        let config = GatewayConfig::from_toml(
            r#"
            name = "Test"
            live_url = "https://gateway.test.com"

            [endpoints.default]
            method = "POST"
            path = "?echo=true"

            [endpoints.void]
            method = "DELETE"
            path = "/{authorization}?force=true"
            "#,
        )
        .unwrap();

        let void = config.endpoint(Action::Void).unwrap();
        assert_eq!(void.method, Method::Delete);
        assert_eq!(void.path, "/{authorization}?force=true");

        let purchase = config.endpoint(Action::Purchase).unwrap();
        assert_eq!(purchase.method, Method::Post);
        assert_eq!(purchase.path, "?echo=true");
    }

    #[test]
    fn test_unknown_endpoint_key_rejected() {
        let result = GatewayConfig::from_toml(
            r#"
            name = "Test"
            live_url = "https://gateway.test.com"

            [endpoints.settle]
            path = "/settle"
            "#,
        );
        assert!(matches!(result, Err(GatewayError::ConfigError(_))));
    }

    #[test]
    fn test_http_url_rejected() {
        let result = GatewayConfig::from_toml(
            r#"
            name = "Test"
            live_url = "http://gateway.test.com"
            "#,
        );
        match result {
            Err(GatewayError::ConfigError(msg)) => assert!(msg.contains("HTTPS")),
            _ => unreachable!("expected ConfigError"),
        }
    }

    #[test]
    fn test_loopback_urls_rejected() {
        for url in ["https://localhost/pay", "https://127.0.0.1/pay", "https://[::1]/pay"] {
            let result = validate_gateway_url("live_url", url);
            assert!(result.is_err(), "{url} should be rejected");
        }
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = GatewayConfig::from_toml(
            r#"
            name = "  "
            live_url = "https://gateway.test.com"
            "#,
        );
        assert!(matches!(result, Err(GatewayError::ConfigError(_))));
    }

    #[test]
    fn test_endpoint_path_validation() {
        assert!(validate_endpoint_path("void", "/{authorization}").is_ok());
        assert!(validate_endpoint_path("verify", "?search={card.first_digits}").is_ok());
        assert!(validate_endpoint_path("void", "/../admin").is_err());
        assert!(validate_endpoint_path("void", "//evil.com").is_err());
        assert!(validate_endpoint_path("void", "payments").is_err());
        assert!(validate_endpoint_path("void", "/{authorization").is_err());
        assert!(validate_endpoint_path("void", "/authorization}").is_err());
        assert!(validate_endpoint_path("void", "/{{authorization}}").is_err());
    }

    #[test]
    fn test_basic_auth_requires_credentials() {
        let result = GatewayConfig::from_toml(
            r#"
            name = "Test"
            live_url = "https://gateway.test.com"

            [auth]
            type = "basic"
            key = "key"
            secret = ""
            "#,
        );
        match result {
            Err(GatewayError::MissingCredential(name)) => assert_eq!(name, "secret"),
            _ => unreachable!("expected MissingCredential"),
        }
    }

    #[test]
    fn test_bearer_auth_requires_token() {
        let auth = AuthConfig::Bearer { token: " ".to_owned() };
        assert!(matches!(auth.validate(), Err(GatewayError::MissingCredential(_))));
    }

    #[test]
    fn test_signature_auth_from_toml() {
        let config = GatewayConfig::from_toml(
            r#"
            name = "Test"
            live_url = "https://gateway.test.com"
            format = "tagged"

            [auth]
            type = "signature"
            merchant_id = "thestore"
            secret = "mysecret"
            separator = "."
            refund_secret = "rebate"

            [auth.fields]
            default = ["timestamp", "merchant_id", "order_id", "amount", "currency", "card.number"]
            void = ["timestamp", "merchant_id", "order_id", "pasref", "authcode"]
            "#,
        )
        .unwrap();

        match &config.auth {
            AuthConfig::Signature { merchant_id, separator, algorithm, field, fields, .. } => {
                assert_eq!(merchant_id, "thestore");
                assert_eq!(separator, ".");
                assert_eq!(*algorithm, HashAlgorithm::Sha1);
                assert_eq!(field, "signature");
                assert_eq!(fields["void"].len(), 5);
            }
            _ => unreachable!("expected signature auth"),
        }
        assert!(config.auth.signer().unwrap().is_some());
    }

    #[test]
    fn test_signature_auth_requires_merchant_id() {
        let result = GatewayConfig::from_toml(
            r#"
            name = "Test"
            live_url = "https://gateway.test.com"

            [auth]
            type = "signature"
            merchant_id = ""
            secret = "mysecret"

            [auth.fields]
            default = ["timestamp", "merchant_id"]
            "#,
        );
        match result {
            Err(GatewayError::MissingCredential(name)) => assert_eq!(name, "merchant_id"),
            _ => unreachable!("expected MissingCredential"),
        }
    }

    #[test]
    fn test_signature_auth_requires_fields() {
        let result = GatewayConfig::from_toml(
            r#"
            name = "Test"
            live_url = "https://gateway.test.com"

            [auth]
            type = "signature"
            merchant_id = "thestore"
            secret = "mysecret"
            "#,
        );
        assert!(matches!(result, Err(GatewayError::ConfigError(_))));
    }

    #[test]
    fn test_endpoint_auth_override() {
        let config = GatewayConfig::from_toml(
            r#"
            name = "Test"
            live_url = "https://gateway.test.com"

            [auth]
            type = "basic"
            key = "key"
            secret = "secret"

            [endpoints.verify]
            method = "GET"
            auth = { type = "bearer", token = "jwt" }
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.endpoint(Action::Verify).and_then(|e| e.auth.as_ref()),
            Some(AuthConfig::Bearer { .. })
        ));
    }

    #[test]
    fn test_endpoint_signature_override_rejected() {
        let endpoint = EndpointConfig {
            auth: Some(AuthConfig::Signature {
                merchant_id: "m".to_owned(),
                secret: "s".to_owned(),
                separator: ".".to_owned(),
                algorithm: HashAlgorithm::Sha1,
                fields: HashMap::from([("default".to_owned(), vec!["amount".to_owned()])]),
                field: "signature".to_owned(),
                refund_secret: None,
                credit_secret: None,
            }),
            ..EndpointConfig::default()
        };
        assert!(matches!(endpoint.validate("verify"), Err(GatewayError::ConfigError(_))));
    }

    #[test]
    fn test_auth_debug_hides_secrets() {
        let auth = AuthConfig::Basic { key: "public".to_owned(), secret: "hunter2".to_owned() };
        let debug = format!("{auth:?}");
        assert!(debug.contains("public"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_forbidden_field_names_rejected() {
        assert!(validate_field_name("request value", "__proto__").is_err());
        assert!(validate_field_name("request value", "card.constructor").is_err());
        assert!(validate_field_name("request value", "card..number").is_err());
        assert!(validate_field_name("request value", "card\0number").is_err());
        assert!(validate_field_name("request value", "").is_err());
        assert!(validate_field_name("request value", "cardAccount.number").is_ok());
        assert!(validate_field_name("request value", "amount.@currency").is_ok());
    }

    #[test]
    fn test_field_mappings_from_toml() {
        let config = GatewayConfig::from_toml(
            r#"
            name = "Test"
            live_url = "https://gateway.test.com"

            [field_mappings]
            authorization_parts = ["order_id", "pasref", "authcode"]

            [field_mappings.request]
            "card.number" = "cardAccount.number"
            amount = "amount"

            [field_mappings.response]
            paymentToken = "authorization"

            [field_mappings.constants.default]
            tenderType = "Card"
            "#,
        )
        .unwrap();

        let mappings = &config.field_mappings;
        assert_eq!(mappings.request["card.number"], "cardAccount.number");
        assert_eq!(mappings.response["paymentToken"], "authorization");
        assert_eq!(mappings.constants["default"]["tenderType"], "Card");
        assert_eq!(mappings.authorization_parts, ["order_id", "pasref", "authcode"]);
        assert_eq!(mappings.authorization_separator, ";");
    }

    #[test]
    fn test_response_config_from_toml() {
        let config = GatewayConfig::from_toml(
            r#"
            name = "Test"
            live_url = "https://gateway.test.com"

            [response]
            success_values = ["Approved", "Open"]
            failure_message_field = "authMessage"
            authorization_fields = ["paymentToken"]
            error_code_field = "errorCode"
            "#,
        )
        .unwrap();

        assert_eq!(config.response.success_values, ["Approved", "Open"]);
        assert_eq!(config.response.failure_message_field.as_deref(), Some("authMessage"));
        assert_eq!(config.response.status_field, "status");
    }

    #[test]
    fn test_empty_success_values_rejected() {
        let response = ResponseConfig { success_values: Vec::new(), ..ResponseConfig::default() };
        assert!(response.validate().is_err());
    }

    #[test]
    fn test_scrubber_preset_follows_format() {
        let scrub = ScrubConfig::default();
        let json = scrub.scrubber(WireFormat::Json).unwrap();
        assert_eq!(
            json.scrub(r#"{"number":"4242424242424242"}"#),
            r#"{"number":"[FILTERED]"}"#
        );

        let tagged = scrub.scrubber(WireFormat::Tagged).unwrap();
        assert_eq!(
            tagged.scrub("<number>4263971921001307</number>"),
            "<number>[FILTERED]</number>"
        );
    }

    #[test]
    fn test_scrubber_custom_pattern() {
        let scrub = ScrubConfig {
            preset: Some(ScrubPreset::None),
            patterns: vec![r"(pin=)\d+".to_owned()],
        };
        let scrubber = scrub.scrubber(WireFormat::Json).unwrap();
        assert_eq!(scrubber.len(), 1);
        assert_eq!(scrubber.scrub("pin=1234&x=1"), "pin=[FILTERED]&x=1");
    }

    #[test]
    fn test_scrubber_invalid_pattern() {
        let scrub = ScrubConfig { preset: None, patterns: vec!["(unclosed".to_owned()] };
        assert!(matches!(scrub.scrubber(WireFormat::Json), Err(GatewayError::InvalidPattern(_))));
    }

    #[test]
    fn test_invalid_default_currency_rejected() {
        let result = GatewayConfig::from_toml(
            r#"
            name = "Test"
            live_url = "https://gateway.test.com"
            default_currency = "EURO"
            "#,
        );
        assert!(matches!(result, Err(GatewayError::ConfigError(_))));
    }
}
