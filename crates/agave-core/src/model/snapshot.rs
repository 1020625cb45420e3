// ── Request snapshot ──
//
// The serialized copy of an inbound request carried inside HTTP attack
// events. Field names follow the feed's JSON schema (`Method`, `URL`,
// `Proto`, ...), body bytes are base64.

use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::request::{HeaderMap, RequestHead};

/// Form field -> values, in body order.
pub type FormValues = IndexMap<String, Vec<String>>;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Parsed request-target. Paths are kept byte-for-byte as sent so that
/// traversal payloads survive into the event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestTarget {
    /// Only set for absolute-form targets (`GET http://host/...`).
    pub scheme: String,
    /// Authority for absolute-form and CONNECT targets.
    pub host: String,
    pub path: String,
    pub raw_query: String,
    pub fragment: String,
}

impl RequestTarget {
    pub fn parse(method: &str, target: &str) -> Self {
        if method.eq_ignore_ascii_case("CONNECT") {
            return Self {
                host: target.to_owned(),
                ..Self::default()
            };
        }

        if let Some((scheme, rest)) = target.split_once("://") {
            if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
                let (host, path_and_more) = match rest.find(['/', '?', '#']) {
                    Some(idx) => rest.split_at(idx),
                    None => (rest, ""),
                };
                let mut parsed = Self::parse_origin(path_and_more);
                parsed.scheme = scheme.to_ascii_lowercase();
                parsed.host = host.to_owned();
                return parsed;
            }
        }

        Self::parse_origin(target)
    }

    fn parse_origin(target: &str) -> Self {
        let (rest, fragment) = target.split_once('#').unwrap_or((target, ""));
        let (path, raw_query) = rest.split_once('?').unwrap_or((rest, ""));
        Self {
            path: path.to_owned(),
            raw_query: raw_query.to_owned(),
            fragment: fragment.to_owned(),
            ..Self::default()
        }
    }
}

/// Immutable copy of a request, taken after its body was drained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestSnapshot {
    pub method: String,
    #[serde(rename = "URL")]
    pub url: RequestTarget,
    pub proto: String,
    pub proto_major: u8,
    pub proto_minor: u8,
    pub header: HeaderMap,
    #[serde(with = "base64_body")]
    pub body: Bytes,
    pub transfer_encoding: Vec<String>,
    pub host: String,
    pub post_form: FormValues,
}

impl RequestSnapshot {
    pub(crate) fn capture(head: RequestHead, body: Bytes) -> Self {
        let post_form = parse_post_form(&head.method, &head.headers, &body);
        Self {
            url: RequestTarget::parse(&head.method, &head.target),
            proto: head.version.to_string(),
            proto_major: head.version.major,
            proto_minor: head.version.minor,
            method: head.method,
            header: head.headers,
            body,
            transfer_encoding: head.transfer_encoding,
            host: head.host,
            post_form,
        }
    }

    /// Full URL the attacker was after: `http://{Host}{path}?{query}#{fragment}`.
    /// Absolute-form targets keep their own scheme and authority.
    pub fn absolute_url(&self) -> String {
        let scheme = if self.url.scheme.is_empty() {
            "http"
        } else {
            &self.url.scheme
        };
        let host = if self.url.host.is_empty() {
            &self.host
        } else {
            &self.url.host
        };

        let mut url = format!("{scheme}://{host}{}", self.url.path);
        if !self.url.raw_query.is_empty() {
            url.push('?');
            url.push_str(&self.url.raw_query);
        }
        if !self.url.fragment.is_empty() {
            url.push('#');
            url.push_str(&self.url.fragment);
        }
        url
    }
}

/// Form values from a urlencoded body; only POST, PUT and PATCH carry one.
fn parse_post_form(method: &str, headers: &HeaderMap, body: &[u8]) -> FormValues {
    let mut form = FormValues::new();

    let has_form_body = ["POST", "PUT", "PATCH"]
        .iter()
        .any(|m| method.eq_ignore_ascii_case(m));
    if !has_form_body {
        return form;
    }

    let is_urlencoded = headers
        .get("Content-Type")
        .and_then(|values| values.first())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_URLENCODED));
    if !is_urlencoded {
        return form;
    }

    for (key, value) in url::form_urlencoded::parse(body) {
        form.entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    form
}

mod base64_body {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
