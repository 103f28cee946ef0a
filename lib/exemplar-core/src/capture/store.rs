use http::Method;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::schema::SchemaValue;

/// Documentation metadata attached to a scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMetadata {
    /// One line summary of the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Longer description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Whether the operation is deprecated.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Unique operation identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
}

impl ScenarioMetadata {
    /// Empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the tags, replacing any previous ones.
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Marks the operation as deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Sets the operation id.
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }
}

/// Everything observed while one scenario runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextStore {
    /// The scenario description given to `run`.
    pub description: String,
    /// Documentation metadata given to `run`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ScenarioMetadata>,
    /// Requests in call order.
    pub captured_requests: Vec<CapturedRequest>,
    /// Bumped by every `clear()`, so handles of removed records go stale.
    #[serde(skip)]
    pub(crate) generation: u64,
}

impl ContextStore {
    pub(crate) fn new(description: String, metadata: Option<ScenarioMetadata>) -> Self {
        Self {
            description,
            metadata,
            captured_requests: Vec::new(),
            generation: 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.captured_requests.clear();
        self.generation += 1;
    }
}

/// One file part of a multipart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Form field name.
    pub field: String,
    /// File name sent with the part.
    pub filename: String,
    /// Content type of the part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
}

/// The multipart part of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormData {
    /// Text fields, by name.
    pub fields: IndexMap<String, Value>,
    /// File parts, in attach order.
    pub files: Vec<FileEntry>,
}

/// A recorded HTTP request, and its response once the call settled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedRequest {
    /// The HTTP method.
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    /// The URL as given to the builder, path templates untouched.
    pub url: String,
    /// The logical body, before transport serialization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<SchemaValue>,
    /// Request headers, names in lowercase.
    pub headers: IndexMap<String, String>,
    /// Query parameters of the last `query` call.
    pub query_params: IndexMap<String, Value>,
    /// Values substituted in the URL template.
    pub path_params: IndexMap<String, Value>,
    /// Multipart fields and files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_data: Option<FormData>,
    /// Set once the transport answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<CapturedResponse>,
}

fn serialize_method<S>(method: &Method, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(method.as_str())
}

impl CapturedRequest {
    /// An empty record for `method url`.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: IndexMap::new(),
            query_params: IndexMap::new(),
            path_params: IndexMap::new(),
            form_data: None,
            response: None,
        }
    }

    /// Merges a patch into this record.
    ///
    /// Headers and form fields merge key by key, files append, query parameters are replaced
    /// as a whole, and a response already set is kept.
    pub fn apply(&mut self, patch: RequestPatch) {
        let RequestPatch {
            method,
            url,
            body,
            headers,
            query_params,
            path_params,
            form_data,
            response,
        } = patch;

        if let Some(method) = method {
            self.method = method;
        }
        if let Some(url) = url {
            self.url = url;
        }
        if let Some(body) = body {
            self.body = Some(body);
        }
        if let Some(headers) = headers {
            self.headers.extend(headers);
        }
        if let Some(query_params) = query_params {
            self.query_params = query_params;
        }
        if let Some(path_params) = path_params {
            self.path_params.extend(path_params);
        }
        if let Some(FormData { fields, files }) = form_data {
            let form_data = self.form_data.get_or_insert_with(FormData::default);
            form_data.fields.extend(fields);
            form_data.files.extend(files);
        }
        if let Some(response) = response {
            if self.response.is_some() {
                warn!(method = %self.method, url = %self.url, "response already captured, keeping the first one");
            } else {
                self.response = Some(response);
            }
        }
    }
}

/// A header value of a captured response, repeated headers become a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HeaderValues {
    /// The header appeared once.
    Single(String),
    /// The header appeared several times.
    Multiple(Vec<String>),
}

impl HeaderValues {
    /// The first value.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(values) => values.first().map(String::as_str),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => *self = Self::Multiple(vec![std::mem::take(first), value]),
            Self::Multiple(values) => values.push(value),
        }
    }
}

/// A recorded HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedResponse {
    /// The status code.
    pub status: u16,
    /// The canonical reason phrase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    /// Response headers, names in lowercase.
    pub headers: IndexMap<String, HeaderValues>,
    /// The decoded body: JSON when the response is JSON, the text otherwise, `null` if empty.
    pub body: Value,
    /// The raw body, when it is valid UTF-8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CapturedResponse {
    /// Builds the record of a transport response.
    pub fn from_parts(status: http::StatusCode, headers: &http::HeaderMap, body: &[u8]) -> Self {
        let mut captured_headers: IndexMap<String, HeaderValues> = IndexMap::new();
        for (name, value) in headers {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            match captured_headers.get_mut(name.as_str()) {
                Some(values) => values.push(value),
                None => {
                    captured_headers.insert(name.as_str().to_string(), HeaderValues::Single(value));
                }
            }
        }

        let is_json = headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok())
            .is_some_and(|mime| {
                mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON)
            });

        let text = std::str::from_utf8(body).ok().map(str::to_string);
        let body = match &text {
            _ if body.is_empty() => Value::Null,
            Some(text) if is_json => {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
            }
            Some(text) => Value::String(text.clone()),
            None => Value::Null,
        };

        Self {
            status: status.as_u16(),
            status_text: status.canonical_reason().map(str::to_string),
            headers: captured_headers,
            body,
            text,
        }
    }

    /// The first value of a response header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
    }

    /// Deserializes the body.
    ///
    /// # Errors
    ///
    /// Fails when the body does not match `T`.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        T::deserialize(&self.body)
    }
}

/// A partial update of a [`CapturedRequest`], see [`CapturedRequest::apply`].
///
/// Each field mirrors the [`CapturedRequest`] field of the same name, `None` leaves it as is.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default)]
pub struct RequestPatch {
    pub method: Option<Method>,
    pub url: Option<String>,
    pub body: Option<SchemaValue>,
    pub headers: Option<IndexMap<String, String>>,
    pub query_params: Option<IndexMap<String, Value>>,
    pub path_params: Option<IndexMap<String, Value>>,
    pub form_data: Option<FormData>,
    pub response: Option<CapturedResponse>,
}

impl RequestPatch {
    /// The patch registering a new call.
    pub fn call(method: Method, url: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Sets the logical body.
    pub fn body(body: impl Into<SchemaValue>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// Merges a single header.
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::headers([(name.into(), value.into())])
    }

    /// Merges headers, other captured headers are kept.
    pub fn headers(headers: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            headers: Some(headers.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Replaces the query parameters.
    pub fn query_params(params: IndexMap<String, Value>) -> Self {
        Self {
            query_params: Some(params),
            ..Self::default()
        }
    }

    /// Sets one path parameter.
    pub fn path_param(name: impl Into<String>, value: Value) -> Self {
        Self {
            path_params: Some(IndexMap::from([(name.into(), value)])),
            ..Self::default()
        }
    }

    /// Sets one multipart text field.
    pub fn form_field(name: impl Into<String>, value: Value) -> Self {
        Self {
            form_data: Some(FormData {
                fields: IndexMap::from([(name.into(), value)]),
                files: Vec::new(),
            }),
            ..Self::default()
        }
    }

    /// Appends one multipart file.
    pub fn form_file(entry: FileEntry) -> Self {
        Self {
            form_data: Some(FormData {
                fields: IndexMap::new(),
                files: vec![entry],
            }),
            ..Self::default()
        }
    }

    /// Attaches the response.
    pub fn response(response: CapturedResponse) -> Self {
        Self {
            response: Some(response),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use http::header::{CONTENT_TYPE, SET_COOKIE};
    use http::{HeaderMap, HeaderValue, StatusCode};
    use serde_json::json;

    use super::*;

    #[test]
    fn should_merge_headers_key_by_key() {
        let mut request = CapturedRequest::new(Method::GET, "/users");
        request.apply(RequestPatch::headers([
            ("accept".to_string(), "application/json".to_string()),
            ("x-trace".to_string(), "1".to_string()),
        ]));
        request.apply(RequestPatch::header("x-trace", "2"));

        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.headers["accept"], "application/json");
        assert_eq!(request.headers["x-trace"], "2");
    }

    #[test]
    fn should_replace_query_params() {
        let mut request = CapturedRequest::new(Method::GET, "/users");
        request.apply(RequestPatch::query_params(IndexMap::from([(
            "page".to_string(),
            json!(1),
        )])));
        request.apply(RequestPatch::query_params(IndexMap::from([(
            "limit".to_string(),
            json!(10),
        )])));

        assert_eq!(
            request.query_params,
            IndexMap::from([("limit".to_string(), json!(10))])
        );
    }

    #[test]
    fn should_accumulate_form_data() {
        let mut request = CapturedRequest::new(Method::POST, "/upload");
        request.apply(RequestPatch::form_field("title", json!("cat")));
        request.apply(RequestPatch::form_file(FileEntry {
            field: "photo".to_string(),
            filename: "cat.png".to_string(),
            mimetype: Some("image/png".to_string()),
        }));
        request.apply(RequestPatch::form_file(FileEntry {
            field: "photo".to_string(),
            filename: "cat2.png".to_string(),
            mimetype: None,
        }));

        let form_data = request.form_data.expect("form data");
        assert_eq!(form_data.fields["title"], json!("cat"));
        assert_eq!(form_data.files.len(), 2);
    }

    #[test]
    fn should_keep_first_response() {
        let mut request = CapturedRequest::new(Method::GET, "/users");
        let first = CapturedResponse::from_parts(StatusCode::OK, &HeaderMap::new(), b"first");
        let second = CapturedResponse::from_parts(StatusCode::CREATED, &HeaderMap::new(), b"");

        request.apply(RequestPatch::response(first.clone()));
        request.apply(RequestPatch::response(second));

        assert_eq!(request.response, Some(first));
    }

    #[test]
    fn should_decode_json_response() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let response = CapturedResponse::from_parts(StatusCode::OK, &headers, br#"{"id":1}"#);

        insta::assert_json_snapshot!(response, @r#"
        {
          "status": 200,
          "statusText": "OK",
          "headers": {
            "content-type": "application/json; charset=utf-8",
            "set-cookie": [
              "a=1",
              "b=2"
            ]
          },
          "body": {
            "id": 1
          },
          "text": "{\"id\":1}"
        }
        "#);
    }

    #[test]
    fn should_keep_text_response_as_string() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let response = CapturedResponse::from_parts(StatusCode::NOT_FOUND, &headers, b"missing");

        assert_eq!(response.status, 404);
        assert_eq!(response.status_text.as_deref(), Some("Not Found"));
        assert_eq!(response.body, json!("missing"));
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn should_map_empty_body_to_null() {
        let response =
            CapturedResponse::from_parts(StatusCode::NO_CONTENT, &HeaderMap::new(), b"");
        assert_eq!(response.body, Value::Null);
        assert_eq!(response.text.as_deref(), Some(""));
    }
}
