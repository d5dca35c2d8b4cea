//! Endpoint resolution.
//!
//! Paths are templates with `{field}` placeholders naming standard request
//! fields, e.g. `/{authorization}?force=true`. Values are form-urlencoded.

use std::collections::HashMap;

use url::form_urlencoded::byte_serialize;

use super::{
    Action, GatewayConfig,
    config::{DEFAULT_KEY, EndpointConfig},
    traits::{Endpoint, EndpointResolver, RequestData},
};
use crate::{
    error::{GatewayError, Result},
    transport::Method,
};

/// Endpoint resolver built from a [`GatewayConfig`].
#[derive(Debug, Clone)]
pub struct ConfigurableEndpointResolver {
    endpoints: HashMap<String, EndpointConfig>,
    live_url: String,
    test_url: String,
}

impl ConfigurableEndpointResolver {
    /// Creates a resolver for the endpoints and base URLs of `config`.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            live_url: config.base_url(false).to_owned(),
            test_url: config.base_url(true).to_owned(),
        }
    }

    fn endpoint(&self, action: Action) -> Option<&EndpointConfig> {
        self.endpoints.get(action.as_str()).or_else(|| self.endpoints.get(DEFAULT_KEY))
    }
}

impl EndpointResolver for ConfigurableEndpointResolver {
    fn resolve(&self, action: Action, request: &RequestData, test: bool) -> Result<Endpoint> {
        let Some(endpoint) = self.endpoint(action) else {
            let base = if test { &self.test_url } else { &self.live_url };
            return Ok(Endpoint { method: Method::default(), url: base.clone() });
        };

        let base = match (test, &endpoint.test_url, &endpoint.live_url) {
            (true, Some(url), _) | (false, _, Some(url)) => url,
            (true, None, _) => &self.test_url,
            (false, _, None) => &self.live_url,
        };

        let path = expand_template(&endpoint.path, request)?;
        let url = if path.is_empty() {
            base.clone()
        } else if path.starts_with('?') {
            format!("{base}{path}")
        } else {
            format!("{}{path}", base.trim_end_matches('/'))
        };

        Ok(Endpoint { method: endpoint.method, url })
    }
}

/// Replaces every `{field}` in `template` with the encoded value of the
/// request field.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidInput`] if a placeholder names an unset or
/// empty field.
pub fn expand_template(template: &str, request: &RequestData) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(GatewayError::InvalidInput(format!("unclosed placeholder in {template}")));
        };
        let name = &after[..end];
        let value = request.field(name).filter(|value| !value.is_empty()).ok_or_else(|| {
            GatewayError::InvalidInput(format!(
                "{} requires a value for {name}",
                request.action()
            ))
        })?;
        out.extend(byte_serialize(value.as_bytes()));
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
#[allow(
    clippy::unreachable,
    reason = "test code uses unreachable for expected-path assertions"
)]
mod tests {
    use super::*;

    fn resolver(toml_str: &str) -> ConfigurableEndpointResolver {
        ConfigurableEndpointResolver::new(&GatewayConfig::from_toml(toml_str).unwrap())
    }

    const CONFIG: &str = r#"
        name = "Test"
        live_url = "https://api.gateway.test/v1/transactions/"
        test_url = "https://sandbox.gateway.test/v1/transactions/"

        [endpoints.default]
        path = "?includeCustomerMatches=false&echo=true"

        [endpoints.void]
        method = "DELETE"
        path = "/{authorization}?force=true"

        [endpoints.verify]
        method = "GET"
        path = "?search={card.first_digits}"
        live_url = "https://api.gateway.test/v1/bin"
        test_url = "https://sandbox.gateway.test/v1/bin"
    "#;

    #[test]
    fn test_default_endpoint_appends_query() {
        let resolver = resolver(CONFIG);
        let request = RequestData::new(Action::Purchase);

        let endpoint = resolver.resolve(Action::Purchase, &request, false).unwrap();
        assert_eq!(endpoint.method, Method::Post);
        assert_eq!(
            endpoint.url,
            "https://api.gateway.test/v1/transactions/?includeCustomerMatches=false&echo=true"
        );
    }

    #[test]
    fn test_placeholder_is_substituted() {
        let resolver = resolver(CONFIG);
        let mut request = RequestData::new(Action::Void);
        request.set("authorization", "10000001625060");

        let endpoint = resolver.resolve(Action::Void, &request, true).unwrap();
        assert_eq!(endpoint.method, Method::Delete);
        assert_eq!(
            endpoint.url,
            "https://sandbox.gateway.test/v1/transactions/10000001625060?force=true"
        );
    }

    #[test]
    fn test_endpoint_url_override() {
        let resolver = resolver(CONFIG);
        let mut request = RequestData::new(Action::Verify);
        request.set("card.first_digits", "411111");

        let endpoint = resolver.resolve(Action::Verify, &request, false).unwrap();
        assert_eq!(endpoint.method, Method::Get);
        assert_eq!(endpoint.url, "https://api.gateway.test/v1/bin?search=411111");
    }

    #[test]
    fn test_missing_placeholder_value() {
        let resolver = resolver(CONFIG);
        let request = RequestData::new(Action::Void);

        let result = resolver.resolve(Action::Void, &request, false);
        match result {
            Err(GatewayError::InvalidInput(msg)) => assert!(msg.contains("authorization")),
            _ => unreachable!("expected InvalidInput"),
        }
    }

    #[test]
    fn test_placeholder_value_is_encoded() {
        let mut request = RequestData::new(Action::Void);
        request.set("authorization", "a/b c?d");
        assert_eq!(expand_template("/{authorization}", &request).unwrap(), "/a%2Fb+c%3Fd");
    }

    #[test]
    fn test_no_endpoints_uses_base_url() {
        let resolver = resolver(
            r#"
            name = "Test"
            live_url = "https://epage.gateway.test/epage-remote.cgi"
            "#,
        );
        let request = RequestData::new(Action::Capture);

        let endpoint = resolver.resolve(Action::Capture, &request, true).unwrap();
        assert_eq!(endpoint.method, Method::Post);
        assert_eq!(endpoint.url, "https://epage.gateway.test/epage-remote.cgi");
    }
}
