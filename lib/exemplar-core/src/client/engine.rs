use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use indexmap::IndexMap;
use serde_json::Value;

use super::ClientError;
use super::multipart::Multipart;
use super::query;
use crate::capture::{RequestHandle, RequestPatch};

/// A transport able to perform a prepared call.
///
/// The request builder owns everything observable: capture, timeouts and expectations.
/// An engine only maps a [`PreparedCall`] onto its transport and returns the raw response.
pub trait Engine: Clone + Send + Sync + 'static {
    /// Performs the call.
    ///
    /// # Errors
    ///
    /// Fails when no response was received.
    fn exchange(
        &self,
        call: PreparedCall,
    ) -> impl Future<Output = Result<RawResponse, ClientError>> + Send;

    /// Whether the transport reports `status` as an error.
    fn rejects(&self, _status: StatusCode) -> bool {
        false
    }

    /// Timeout applied when the call does not set one.
    fn default_timeout(&self) -> Option<Duration> {
        None
    }
}

/// The body sent on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Sent as `application/json`.
    Json(Value),
    /// Sent as `text/plain`.
    Text(String),
    /// Sent as `multipart/form-data`.
    Multipart(Multipart),
}

/// A request ready to be sent.
#[derive(Debug)]
pub struct PreparedCall {
    /// The method.
    pub method: Method,
    /// The URL with path parameters substituted, without the query parameters.
    pub url: String,
    /// Headers, names in lower case.
    pub headers: IndexMap<String, String>,
    /// Query parameters.
    pub query: IndexMap<String, Value>,
    /// The body, if any.
    pub body: Option<RequestBody>,
    pub(crate) handle: Option<RequestHandle>,
}

impl PreparedCall {
    /// The URL with its percent-encoded query string.
    pub fn url_with_query(&self) -> String {
        query::append(&self.url, &self.query)
    }

    /// The query parameters as `key=value` pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        query::pairs(&self.query)
    }

    /// Whether a header is set, case-insensitive.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers
            .keys()
            .any(|key| key.eq_ignore_ascii_case(name))
    }

    /// Records a header computed by the transport into the captured request.
    pub fn record_header(&self, name: &str, value: &str) {
        if let Some(handle) = &self.handle {
            handle.update(RequestPatch::header(name, value));
        }
    }

    /// Serializes the body and sets its `content-type` unless one was given.
    ///
    /// A multipart body always sets its own `content-type`, recorded in the captured request
    /// since it carries the boundary.
    ///
    /// # Errors
    ///
    /// Fails when the JSON body cannot be serialized.
    pub fn encode_body(&mut self) -> Result<Option<Bytes>, ClientError> {
        let Some(body) = &self.body else {
            return Ok(None);
        };

        let (content_type, bytes) = match body {
            RequestBody::Json(value) => (
                mime::APPLICATION_JSON.to_string(),
                Bytes::from(serde_json::to_vec(value)?),
            ),
            RequestBody::Text(text) => (
                mime::TEXT_PLAIN_UTF_8.to_string(),
                Bytes::from(text.clone()),
            ),
            RequestBody::Multipart(multipart) => {
                let (content_type, bytes) = multipart.encode();
                self.record_header(CONTENT_TYPE.as_str(), &content_type);
                self.set_header(CONTENT_TYPE.as_str(), content_type);
                return Ok(Some(bytes));
            }
        };

        if !self.has_header(CONTENT_TYPE.as_str()) {
            self.set_header(CONTENT_TYPE.as_str(), content_type);
        }
        Ok(Some(bytes))
    }

    fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value);
    }

    /// The headers as a [`HeaderMap`].
    ///
    /// # Errors
    ///
    /// Fails on an invalid header name or value.
    pub fn header_map(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            headers.insert(
                HeaderName::try_from(name.as_str())?,
                HeaderValue::try_from(value.as_str())?,
            );
        }
        Ok(headers)
    }
}

/// A response as returned by a transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Status code.
    pub status: StatusCode,
    /// Headers.
    pub headers: HeaderMap,
    /// The whole body.
    pub body: Bytes,
}
