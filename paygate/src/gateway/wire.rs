//! Request and response body formats.
//!
//! Bodies are handled as [`serde_json::Map`]s whatever the wire format. In the
//! tag-delimited format, element attributes appear as keys prefixed with `@`
//! and the text of an element that also has attributes appears under `#text`:
//!
//! ```
//! use paygate::gateway::wire::{WireFormat, encode_tagged, parse};
//! use serde_json::json;
//!
//! let body = json!({ "amount": { "@currency": "EUR", "#text": "100" }, "orderid": "1" });
//! let xml = encode_tagged("request", body.as_object().unwrap());
//! assert_eq!(
//!     xml,
//!     r#"<request><amount currency="EUR">100</amount><orderid>1</orderid></request>"#
//! );
//!
//! let parsed = parse(WireFormat::Tagged, "<response><result>00</result></response>", "Acme");
//! assert_eq!(parsed["result"], "00");
//! ```
//!
//! Parsing never fails. A body that cannot be read produces a map with a
//! single `message` entry that quotes the raw body.

use std::{borrow::Cow, io, sync::LazyLock};

use quick_xml::{
    Reader, Writer,
    escape::resolve_predefined_entity,
    events::{BytesRef, BytesStart, BytesText, Event},
};
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Key prefix of element attributes.
pub const ATTRIBUTE_PREFIX: char = '@';

/// Key of element text next to attributes.
pub const TEXT_KEY: &str = "#text";

/// CDATA sections, entity references and bare `&`.
static AMPERSAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!\[CDATA\[.*?\]\]>|&(?:#[0-9]+;|#[xX][0-9a-fA-F]+;|[A-Za-z_][\w.-]*;)?")
        .expect("ampersand pattern is valid")
});

/// Body encoding used by a gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// JSON objects.
    #[default]
    Json,
    /// Tag-delimited markup.
    Tagged,
}

impl WireFormat {
    /// `Content-Type` of request bodies.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Tagged => "text/xml",
        }
    }

    /// Name used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Tagged => "XML",
        }
    }

    /// Encodes a body. `root` names the enclosing element of tagged bodies.
    #[must_use]
    pub fn encode(self, root: &str, body: &Map<String, Value>) -> Vec<u8> {
        match self {
            Self::Json => Value::Object(body.clone()).to_string().into_bytes(),
            Self::Tagged => encode_tagged(root, body).into_bytes(),
        }
    }
}

/// Message stored for a body that could not be parsed.
#[must_use]
pub fn invalid_response_message(format: WireFormat, gateway: &str, body: &str) -> String {
    format!(
        "Invalid {} response received from {gateway}. Please contact {gateway} if you continue \
         to receive this message. (The raw response returned by the API was {body:?})",
        format.label()
    )
}

/// Parses a response body into a field map.
///
/// # Examples
///
/// ```
/// use paygate::gateway::wire::{WireFormat, parse};
///
/// let parsed = parse(WireFormat::Json, "<html>", "Acme");
/// let message = parsed["message"].as_str().unwrap();
/// assert!(message.starts_with("Invalid JSON response received from Acme."));
/// assert!(message.ends_with("(The raw response returned by the API was \"<html>\")"));
/// ```
#[must_use]
pub fn parse(format: WireFormat, body: &str, gateway: &str) -> Map<String, Value> {
    let parsed = match format {
        WireFormat::Json => parse_json(body),
        WireFormat::Tagged => parse_tagged(body),
    };
    parsed.unwrap_or_else(|| {
        tracing::warn!(format = format.label(), body_len = body.len(), "unparseable response body");
        let mut fields = Map::new();
        fields.insert(
            "message".to_owned(),
            Value::String(invalid_response_message(format, gateway, body)),
        );
        fields
    })
}

fn parse_json(body: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(body).ok()? {
        Value::Object(fields) => Some(fields),
        _ => None,
    }
}

/// Parses tag-delimited markup leniently.
///
/// Unknown entities and bare `&` are dropped, unclosed elements are closed at
/// the end of input and content after the root element is ignored. Returns
/// `None` when the body holds no element at all.
#[must_use]
pub fn parse_tagged(body: &str) -> Option<Map<String, Value>> {
    let root = parse_document(body)?;
    match element_to_value(&root) {
        Value::Object(fields) => Some(fields),
        leaf => {
            let mut fields = Map::new();
            fields.insert(root.name, leaf);
            Some(fields)
        }
    }
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    }
}

fn close(name: &str, stack: &mut Vec<Element>, root: &mut Option<Element>) {
    if let Some(position) = stack.iter().rposition(|open| open.name == name) {
        while stack.len() > position {
            if let Some(element) = stack.pop() {
                attach(element, stack, root);
            }
        }
    }
}

fn parse_document(body: &str) -> Option<Element> {
    let body = AMPERSAND_PATTERN.replace_all(body, |caps: &Captures<'_>| {
        if &caps[0] == "&" { String::new() } else { caps[0].to_owned() }
    });
    let mut reader = Reader::from_str(&body);
    reader.config_mut().check_end_names = false;

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    while root.is_none() {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(open_element(&start)),
            Ok(Event::Empty(start)) => attach(open_element(&start), &mut stack, &mut root),
            Ok(Event::End(end)) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                close(&name, &mut stack, &mut root);
            }
            Ok(Event::Text(text)) => {
                if let Some(open) = stack.last_mut()
                    && let Ok(content) = text.xml_content()
                {
                    open.text.push_str(&content);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::GeneralRef(reference)) => {
                if let Some(open) = stack.last_mut()
                    && let Some(resolved) = resolve_reference(&reference)
                {
                    open.text.push_str(&resolved);
                }
            }
            Ok(Event::Eof) => break,
            Err(error) => {
                tracing::debug!(
                    %error,
                    position = reader.buffer_position(),
                    "markup error, keeping elements read so far"
                );
                break;
            }
            Ok(_) => {}
        }
    }

    while let Some(element) = stack.pop() {
        attach(element, &mut stack, &mut root);
    }
    root
}

fn open_element(start: &BytesStart<'_>) -> Element {
    let attributes = start
        .attributes()
        .with_checks(false)
        .filter_map(Result::ok)
        .map(|attribute| {
            let value = attribute.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attribute.value).into_owned(),
                Cow::into_owned,
            );
            (String::from_utf8_lossy(attribute.key.as_ref()).into_owned(), value)
        })
        .collect();
    Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes,
        ..Element::default()
    }
}

/// Character references and the predefined entities; anything else is dropped.
fn resolve_reference(reference: &BytesRef<'_>) -> Option<String> {
    if let Ok(Some(ch)) = reference.resolve_char_ref() {
        return Some(ch.to_string());
    }
    let name = reference.decode().ok()?;
    resolve_predefined_entity(&name).map(str::to_owned)
}

fn element_to_value(element: &Element) -> Value {
    if element.children.is_empty() && element.attributes.is_empty() {
        return Value::String(element.text.clone());
    }

    let mut fields = Map::new();
    for (name, value) in &element.attributes {
        fields.insert(format!("{ATTRIBUTE_PREFIX}{name}"), Value::String(value.clone()));
    }
    if element.children.is_empty() || !element.text.trim().is_empty() {
        fields.insert(TEXT_KEY.to_owned(), Value::String(element.text.clone()));
    }
    for child in &element.children {
        let value = element_to_value(child);
        match fields.get_mut(&child.name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(child.name.clone(), value);
            }
        }
    }
    Value::Object(fields)
}

/// Encodes a map as tag-delimited markup under a `root` element.
#[must_use]
pub fn encode_tagged(root: &str, body: &Map<String, Value>) -> String {
    let mut writer = Writer::new(Vec::new());
    if let Err(error) = write_object(&mut writer, root, body) {
        tracing::error!(%error, "failed to encode tagged body");
    }
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> io::Result<()> {
    match value {
        Value::Object(fields) => write_object(writer, name, fields),
        Value::Array(items) => items.iter().try_for_each(|item| write_element(writer, name, item)),
        Value::Null => writer.write_event(Event::Empty(BytesStart::new(name))),
        scalar => {
            let text = value_text(scalar).unwrap_or_default();
            write_content(writer, &BytesStart::new(name), Some(text.as_str()), &[])
        }
    }
}

fn write_object(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    fields: &Map<String, Value>,
) -> io::Result<()> {
    let mut start = BytesStart::new(name);
    for (key, value) in fields {
        if let Some(attribute) = key.strip_prefix(ATTRIBUTE_PREFIX) {
            let text = value_text(value).unwrap_or_default();
            start.push_attribute((attribute, text.as_str()));
        }
    }

    let text = fields.get(TEXT_KEY).and_then(value_text);
    let children: Vec<_> = fields
        .iter()
        .filter(|(key, _)| !key.starts_with(ATTRIBUTE_PREFIX) && *key != TEXT_KEY)
        .collect();
    if text.is_none() && children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }
    write_content(writer, &start, text.as_deref(), &children)
}

fn write_content(
    writer: &mut Writer<Vec<u8>>,
    start: &BytesStart<'_>,
    text: Option<&str>,
    children: &[(&String, &Value)],
) -> io::Result<()> {
    writer.write_event(Event::Start(start.borrow()))?;
    if let Some(text) = text.filter(|text| !text.is_empty()) {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for (key, value) in children {
        write_element(writer, key, value)?;
    }
    writer.write_event(Event::End(start.to_end()))
}

/// Text of a scalar value, or of the `#text` entry of an element.
#[must_use]
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Object(fields) => fields.get(TEXT_KEY).and_then(value_text),
        Value::Null | Value::Array(_) => None,
    }
}

/// Looks up a field by name or by a dotted path into nested objects.
#[must_use]
pub fn lookup<'a>(fields: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = fields.get(path) {
        return Some(value);
    }
    let mut segments = path.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Inserts `value` at a dotted path, creating intermediate objects.
pub fn insert_path(fields: &mut Map<String, Value>, path: &str, value: Value) {
    let mut current = fields;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_owned(), value);
            return;
        }
        let entry = current.entry(segment.to_owned()).or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            let text = entry.take();
            let mut nested = Map::new();
            if !text.is_null() {
                nested.insert(TEXT_KEY.to_owned(), text);
            }
            *entry = Value::Object(nested);
        }
        let Value::Object(next) = entry else { return };
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const REALEX_DECLINE: &str = r#"
        <response timestamp='20010427043422'>
          <merchantid>your merchant id</merchantid>
          <result>01</result>
          <message>[ test system ] This is & not awesome</message>
          <pasref> realex payments reference</pasref>
          <tss>
            <result>89</result>
            <check id="1000">9</check>
            <check id="1001">9</check>
          </tss>
        </response>"
    "#;

    #[test]
    fn test_parse_json_object() {
        let fields = parse(WireFormat::Json, r#"{"status":"Approved","amount":1.5}"#, "Acme");
        assert_eq!(fields["status"], "Approved");
        assert_eq!(fields["amount"], 1.5);
    }

    #[test]
    fn test_parse_json_rejects_non_object() {
        let fields = parse(WireFormat::Json, "[1,2]", "Acme");
        assert_eq!(fields.len(), 1);
        assert!(fields["message"].as_str().unwrap().contains("[1,2]"));
    }

    #[test]
    fn test_invalid_json_message_quotes_body() {
        let message = invalid_response_message(WireFormat::Json, "Priority", "oops \"x\"");
        assert_eq!(
            message,
            "Invalid JSON response received from Priority. Please contact Priority if you \
             continue to receive this message. (The raw response returned by the API was \
             \"oops \\\"x\\\"\")"
        );
    }

    #[test]
    fn test_parse_tagged_recovers_bare_ampersand() {
        let fields = parse(WireFormat::Tagged, REALEX_DECLINE, "Realex");
        assert_eq!(fields["result"], "01");
        assert_eq!(fields["message"], "[ test system ] This is  not awesome");
        assert_eq!(fields["pasref"], " realex payments reference");
        assert_eq!(fields["@timestamp"], "20010427043422");
    }

    #[test]
    fn test_parse_tagged_nested_and_repeated() {
        let fields = parse_tagged(REALEX_DECLINE).unwrap();
        assert_eq!(lookup(&fields, "tss.result"), Some(&json!("89")));
        let checks = lookup(&fields, "tss.check").unwrap().as_array().unwrap();
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[1], json!({ "@id": "1001", "#text": "9" }));
    }

    #[test]
    fn test_parse_tagged_entities() {
        let fields = parse_tagged("<r><m>a &amp; b &lt;c&gt; &#65;&#x42;</m></r>").unwrap();
        assert_eq!(fields["m"], "a & b <c> AB");
    }

    #[test]
    fn test_parse_tagged_cdata() {
        let fields = parse_tagged(concat!(
            "<response><result>00</result>",
            "<message><![CDATA[Auth <ok> & done]]></message></response>",
        ))
        .unwrap();
        assert_eq!(fields["result"], "00");
        assert_eq!(fields["message"], "Auth <ok> & done");
    }

    #[test]
    fn test_parse_tagged_attribute_containing_gt() {
        let fields = parse_tagged(r#"<r><check id="a>b" type='x &amp; y'>9</check></r>"#).unwrap();
        assert_eq!(fields["check"], json!({ "@id": "a>b", "@type": "x & y", "#text": "9" }));
    }

    #[test]
    fn test_parse_tagged_drops_unknown_entities() {
        let fields = parse_tagged("<r><m>caf&eacute; &copy;ok</m></r>").unwrap();
        assert_eq!(fields["m"], "caf ok");
    }

    #[test]
    fn test_parse_tagged_mismatched_closing_tag() {
        let fields = parse_tagged("<r><a>1</b><c>2</c></a></r>").unwrap();
        assert_eq!(lookup(&fields, "a.c"), Some(&json!("2")));
    }

    #[test]
    fn test_parse_tagged_unclosed_elements() {
        let fields = parse_tagged("<?xml version=\"1.0\"?><r><a>1</a><b>2").unwrap();
        assert_eq!(fields["a"], "1");
        assert_eq!(fields["b"], "2");
    }

    #[test]
    fn test_parse_tagged_without_elements_is_invalid() {
        assert!(parse_tagged("Service Unavailable").is_none());
        let fields = parse(WireFormat::Tagged, "Service Unavailable", "Realex");
        assert!(fields["message"].as_str().unwrap().starts_with("Invalid XML response"));
    }

    #[test]
    fn test_encode_tagged_request() {
        let body = json!({
            "merchantid": "your_merchant_id",
            "@type": "auth",
            "card": { "number": "4263971921001307", "issueno": "", "cvn": { "number": "" } },
            "autosettle": { "@flag": "1" },
            "comments": null,
        });
        let xml = encode_tagged("request", body.as_object().unwrap());
        assert_eq!(
            xml,
            "<request type=\"auth\"><autosettle flag=\"1\"/>\
             <card><cvn><number></number></cvn><issueno></issueno>\
             <number>4263971921001307</number></card>\
             <comments/><merchantid>your_merchant_id</merchantid></request>"
        );
    }

    #[test]
    fn test_encode_tagged_escapes_text() {
        let body = json!({ "name": "O'Brien & <Sons>" });
        let xml = encode_tagged("r", body.as_object().unwrap());
        assert!(xml.contains(" &amp; &lt;Sons&gt;</name></r>"));
        assert_eq!(parse_tagged(&xml).unwrap()["name"], "O'Brien & <Sons>");
    }

    #[test]
    fn test_insert_path_builds_nested_objects() {
        let mut fields = Map::new();
        insert_path(&mut fields, "cardAccount.number", json!("4111"));
        insert_path(&mut fields, "cardAccount.cvv", json!("123"));
        insert_path(&mut fields, "amount", json!("1.00"));
        insert_path(&mut fields, "amount.@currency", json!("EUR"));
        assert_eq!(
            Value::Object(fields),
            json!({
                "cardAccount": { "number": "4111", "cvv": "123" },
                "amount": { "#text": "1.00", "@currency": "EUR" },
            })
        );
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("x")), Some("x".to_owned()));
        assert_eq!(value_text(&json!(7)), Some("7".to_owned()));
        assert_eq!(value_text(&json!(true)), Some("true".to_owned()));
        assert_eq!(value_text(&json!({ "#text": "9" })), Some("9".to_owned()));
        assert_eq!(value_text(&Value::Null), None);
    }

    #[test]
    fn test_encode_json() {
        let body = json!({ "amount": "1.00" });
        let bytes = WireFormat::Json.encode("ignored", body.as_object().unwrap());
        assert_eq!(bytes, br#"{"amount":"1.00"}"#);
    }
}
