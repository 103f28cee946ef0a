use std::time::Duration;

use base64::Engine as _;
use http::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::Value;

use super::{Attachment, Call, Expectation};
use crate::capture::{FileEntry, RequestPatch};
use crate::client::multipart::{FileSource, TextPart, guess_mime};
use crate::schema::SchemaValue;

impl<E> Call<E> {
    /// Sets the body.
    ///
    /// The value is captured as given, documentation wrappers included, while the transport
    /// receives its plain JSON form. A string is sent as `text/plain`, anything else as JSON.
    ///
    /// # Example
    ///
    /// ```rust
    /// use exemplar_core::client::FetchClient;
    /// use exemplar_core::schema::{SchemaValue, documented};
    ///
    /// let client = FetchClient::new();
    /// let call = client.post("http://localhost/users").send(SchemaValue::object([
    ///     ("email", SchemaValue::from(documented("ada@example.com").with_description("Login"))),
    ///     ("age", SchemaValue::from(36)),
    /// ]));
    /// # drop(call);
    /// ```
    #[must_use]
    pub fn send(mut self, body: impl Into<SchemaValue>) -> Self {
        let body = body.into();
        self.capture(RequestPatch::body(body.clone()));
        self.body = Some(body);
        self
    }

    /// Sets a JSON body from any serializable value.
    ///
    /// A serialization failure is reported when the call is awaited.
    #[must_use]
    pub fn json<T>(mut self, body: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        match SchemaValue::from_serialize(body) {
            Ok(body) => self.send(body),
            Err(error) => {
                self.fail(error.into());
                self
            }
        }
    }

    /// Sets a header, replacing a previous value of the same name.
    ///
    /// Header names are captured in lower case.
    #[must_use]
    pub fn set(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        let name = name.as_ref().to_ascii_lowercase();
        let value = value.into();
        self.capture(RequestPatch::header(name.clone(), value.clone()));
        self.headers.insert(name, value);
        self
    }

    /// Sets several headers at once.
    #[must_use]
    pub fn set_all<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
            .collect::<Vec<_>>();
        self.capture(RequestPatch::headers(headers.clone()));
        self.headers.extend(headers);
        self
    }

    /// Adds query parameters.
    ///
    /// The transport receives every parameter added so far, the captured request only the
    /// parameters of the last call.
    #[must_use]
    pub fn query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let params = params
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect::<indexmap::IndexMap<_, _>>();
        self.capture(RequestPatch::query_params(params.clone()));
        self.query.extend(params);
        self
    }

    /// Fills the `{name}` segment of the URL.
    ///
    /// The captured URL keeps the template.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        self.capture(RequestPatch::path_param(name.clone(), value.clone()));
        self.path_params.insert(name, value);
        self
    }

    /// Adds a file part to a multipart body.
    ///
    /// Without a `filename`, the file name of a path is used, then the field name.
    /// The media type is guessed from the file name extension.
    #[must_use]
    pub fn attach(
        mut self,
        field: impl Into<String>,
        file: impl Into<FileSource>,
        filename: Option<&str>,
    ) -> Self {
        let field = field.into();
        let source = file.into();
        let filename = filename
            .map(str::to_string)
            .or_else(|| source.file_name())
            .unwrap_or_else(|| field.clone());
        let mime = guess_mime(&filename);

        self.capture(RequestPatch::form_file(FileEntry {
            field: field.clone(),
            filename: filename.clone(),
            mimetype: mime.as_ref().map(ToString::to_string),
        }));
        self.attachments.push(Attachment {
            field,
            filename,
            mime,
            source,
        });
        self
    }

    /// Adds a text part to a multipart body.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        self.capture(RequestPatch::form_field(name.clone(), value.clone()));

        let text = match value {
            Value::String(text) => text,
            other => other.to_string(),
        };
        self.fields.retain(|part| part.name != name);
        self.fields.push(TextPart { name, value: text });
        self
    }

    /// Sets HTTP Basic credentials.
    #[must_use]
    pub fn auth(self, username: &str, password: &str) -> Self {
        let credentials =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
        self.set(AUTHORIZATION, format!("Basic {credentials}"))
    }

    /// Sets a bearer token.
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.set(AUTHORIZATION, format!("Bearer {token}"))
    }

    /// Limits the time to wait for the response.
    #[must_use]
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Fails the call unless the response has this status.
    ///
    /// The response is captured either way.
    #[must_use]
    pub fn expect_status(mut self, status: u16) -> Self {
        self.expectations.push(Expectation::Status(status));
        self
    }

    /// Fails the call unless the response has this header value.
    #[must_use]
    pub fn expect_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.expectations.push(Expectation::Header {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}
