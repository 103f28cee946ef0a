use std::time::Duration;

use http::Method;
use indexmap::IndexMap;
use mime::Mime;
use serde_json::Value;

use super::ClientError;
use super::multipart::{FileSource, TextPart};
use crate::capture::{self, RequestHandle, RequestPatch};
use crate::schema::SchemaValue;

mod builder;
mod execution;

/// A request being configured, awaited to send it.
///
/// Every adapter returns this builder, so all of them capture requests the same way:
///
/// - creating the builder records `{method, url}` in the active scenario,
/// - each configuration method is mirrored into that record,
/// - awaiting sends the request and attaches the response to the same record.
///
/// # Method Groups
///
/// ## Body
/// - [`send(body)`](Self::send) - logical body, [`Documented`](crate::schema::Documented) fields included
/// - [`json(&data)`](Self::json) - any `Serialize` value
///
/// ## Parameters
/// - [`set(name, value)`](Self::set), [`set_all(headers)`](Self::set_all) - headers, merged
/// - [`query(params)`](Self::query) - query parameters, the captured ones are replaced
/// - [`path_param(name, value)`](Self::path_param) - fills a `{name}` segment of the URL
/// - [`auth(user, password)`](Self::auth), [`bearer(token)`](Self::bearer) - credentials
///
/// ## Multipart
/// - [`attach(field, file, filename)`](Self::attach) - file part
/// - [`field(name, value)`](Self::field) - text part
///
/// ## Execution
/// - [`timeout(duration)`](Self::timeout)
/// - [`expect_status(status)`](Self::expect_status), [`expect_header(name, value)`](Self::expect_header)
/// - `.await` or [`end()`](Self::end)
#[derive(Debug)]
pub struct Call<E> {
    pub(super) engine: E,
    pub(super) handle: Option<RequestHandle>,

    pub(super) method: Method,
    pub(super) url: String,
    pub(super) path_params: IndexMap<String, Value>,
    pub(super) headers: IndexMap<String, String>,
    pub(super) query: IndexMap<String, Value>,
    pub(super) body: Option<SchemaValue>,

    pub(super) fields: Vec<TextPart>,
    pub(super) attachments: Vec<Attachment>,

    pub(super) timeout: Option<Duration>,
    pub(super) expectations: Vec<Expectation>,
    /// First configuration error, reported when the call is awaited.
    pub(super) error: Option<ClientError>,
}

#[derive(Debug)]
pub(super) struct Attachment {
    field: String,
    filename: String,
    mime: Option<Mime>,
    source: FileSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Expectation {
    Status(u16),
    Header { name: String, value: String },
}

impl<E> Call<E> {
    /// Starts a request, recording it when a scenario is active.
    pub fn new(engine: E, method: Method, url: impl Into<String>) -> Self {
        let url = url.into();
        let handle = capture::add_request(RequestPatch::call(method.clone(), url.clone()));

        Self {
            engine,
            handle,
            method,
            url,
            path_params: IndexMap::new(),
            headers: IndexMap::new(),
            query: IndexMap::new(),
            body: None,
            fields: Vec::new(),
            attachments: Vec::new(),
            timeout: None,
            expectations: Vec::new(),
            error: None,
        }
    }

    /// The captured record of this request, `None` outside of a scenario.
    pub fn handle(&self) -> Option<&RequestHandle> {
        self.handle.as_ref()
    }

    fn capture(&self, patch: RequestPatch) {
        if let Some(handle) = &self.handle {
            handle.update(patch);
        }
    }

    fn fail(&mut self, error: ClientError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}
