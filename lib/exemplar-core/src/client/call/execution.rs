use std::future::{Future, IntoFuture};
use std::pin::Pin;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Attachment, Call, Expectation};
use crate::capture::CapturedResponse;
use crate::client::engine::{Engine, PreparedCall, RequestBody};
use crate::client::multipart::{FilePart, Multipart};
use crate::client::{ClientError, query};
use crate::schema::SchemaValue;

impl<E> Call<E>
where
    E: Engine,
{
    /// Sends the request, same as awaiting the builder.
    ///
    /// # Errors
    ///
    /// Fails on a transport error, when the transport rejects the status, or when an
    /// expectation does not hold. The response is captured in the last two cases.
    pub async fn end(self) -> Result<CapturedResponse, ClientError> {
        self.exchange().await
    }

    async fn exchange(self) -> Result<CapturedResponse, ClientError> {
        let Self {
            engine,
            handle,
            method,
            url,
            path_params,
            headers,
            query,
            body,
            fields,
            attachments,
            timeout,
            expectations,
            error,
        } = self;

        if let Some(error) = error {
            return Err(error);
        }

        let body = if fields.is_empty() && attachments.is_empty() {
            body.as_ref().and_then(wire_body)
        } else {
            if body.is_some() {
                warn!(%method, %url, "multipart parts present, body not sent");
            }
            Some(RequestBody::Multipart(load_multipart(fields, attachments).await?))
        };

        let call = PreparedCall {
            method,
            url: resolve_path(&url, &path_params),
            headers,
            query,
            body,
            handle: handle.clone(),
        };

        debug!(method = %call.method, url = %call.url, "sending...");
        let raw = match timeout.or_else(|| engine.default_timeout()) {
            Some(duration) => tokio::time::timeout(duration, engine.exchange(call))
                .await
                .map_err(|_| ClientError::Timeout { duration })??,
            None => engine.exchange(call).await?,
        };
        debug!(status = %raw.status, "...receiving");

        let response = CapturedResponse::from_parts(raw.status, &raw.headers, &raw.body);
        if let Some(handle) = &handle {
            handle.attach_response(response.clone());
        }

        if engine.rejects(raw.status) {
            return Err(ClientError::Status {
                response: Box::new(response),
            });
        }
        for expectation in &expectations {
            expectation.check(&response)?;
        }
        Ok(response)
    }
}

impl<E> IntoFuture for Call<E>
where
    E: Engine,
{
    type Output = Result<CapturedResponse, ClientError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.exchange())
    }
}

impl Expectation {
    fn check(&self, response: &CapturedResponse) -> Result<(), ClientError> {
        match self {
            Self::Status(expected) if *expected != response.status => {
                Err(ClientError::UnexpectedStatus {
                    expected: *expected,
                    actual: response.status,
                    body: response.text.clone().unwrap_or_default(),
                })
            }
            Self::Header { name, value } if response.header(name) != Some(value.as_str()) => {
                Err(ClientError::UnexpectedHeader {
                    name: name.clone(),
                    expected: value.clone(),
                    actual: response.header(name).map(str::to_string),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Strings go as text, other values as JSON, values without a JSON form are not sent.
fn wire_body(body: &SchemaValue) -> Option<RequestBody> {
    match body.to_json()? {
        Value::String(text) => Some(RequestBody::Text(text)),
        other => Some(RequestBody::Json(other)),
    }
}

async fn load_multipart(
    fields: Vec<crate::client::multipart::TextPart>,
    attachments: Vec<Attachment>,
) -> Result<Multipart, ClientError> {
    let mut files = Vec::with_capacity(attachments.len());
    for Attachment {
        field,
        filename,
        mime,
        source,
    } in attachments
    {
        files.push(FilePart {
            content: source.read().await?,
            field,
            filename,
            mime,
        });
    }
    Ok(Multipart { fields, files })
}

fn resolve_path(url: &str, path_params: &IndexMap<String, Value>) -> String {
    path_params
        .iter()
        .fold(url.to_string(), |url, (name, value)| {
            url.replace(&format!("{{{name}}}"), &query::path_segment(value))
        })
}
