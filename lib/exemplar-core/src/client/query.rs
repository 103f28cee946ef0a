use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

/// Characters kept as-is in a query component, the unreserved set of RFC 3986.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Flattens query parameters into `key=value` pairs.
///
/// Arrays repeat their key, `null` gives an empty value and objects are sent as compact JSON.
pub(crate) fn pairs(params: &IndexMap<String, Value>) -> Vec<(String, String)> {
    let mut result = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                result.extend(items.iter().map(|item| (key.clone(), scalar(item))));
            }
            other => result.push((key.clone(), scalar(other))),
        }
    }
    result
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Builds a percent-encoded query string, without the leading `?`.
pub(crate) fn encode(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, QUERY_COMPONENT),
                utf8_percent_encode(value, QUERY_COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Appends the encoded query to `url`, keeping any query it already has.
pub(crate) fn append(url: &str, params: &IndexMap<String, Value>) -> String {
    let query = encode(&pairs(params));
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&{query}")
    } else {
        format!("{url}?{query}")
    }
}

/// Percent-encodes a path parameter.
pub(crate) fn path_segment(value: &Value) -> String {
    utf8_percent_encode(&scalar(value), QUERY_COMPONENT).to_string()
}
