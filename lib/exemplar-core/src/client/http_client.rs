use std::time::Duration;

use http::StatusCode;
use http::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

use super::engine::RequestBody;
use super::multipart::Multipart;
use super::{ClientError, Engine, HttpClientBuilder, PreparedCall, RawResponse};

/// A reqwest client bound to a base URL.
///
/// Statuses `>= 400` fail the call with [`ClientError::Status`] unless disabled with
/// [`HttpClientBuilder::with_error_for_status`]; the response is captured either way.
/// Absolute request URLs bypass the base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    pub(super) client: reqwest::Client,
    pub(super) base_url: String,
    pub(super) timeout: Option<Duration>,
    pub(super) error_for_status: bool,
}

impl HttpClient {
    /// Creates a builder, see [`HttpClientBuilder`].
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// The base URL, without trailing `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    http_verbs!();

    fn url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{url}", self.base_url)
        } else {
            format!("{}/{url}", self.base_url)
        }
    }
}

impl Engine for HttpClient {
    async fn exchange(&self, call: PreparedCall) -> Result<RawResponse, ClientError> {
        let mut request = self
            .client
            .request(call.method.clone(), self.url(&call.url))
            .headers(call.header_map()?);

        let pairs = call.query_pairs();
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }

        request = match &call.body {
            None => request,
            Some(RequestBody::Json(value)) => request.json(value),
            Some(RequestBody::Text(text)) if call.has_header(CONTENT_TYPE.as_str()) => {
                request.body(text.clone())
            }
            Some(RequestBody::Text(text)) => request
                .header(CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())
                .body(text.clone()),
            Some(RequestBody::Multipart(multipart)) => {
                let form = form(multipart)?;
                call.record_header(
                    CONTENT_TYPE.as_str(),
                    &format!("multipart/form-data; boundary={}", form.boundary()),
                );
                request.multipart(form)
            }
        };

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    fn rejects(&self, status: StatusCode) -> bool {
        self.error_for_status && (status.is_client_error() || status.is_server_error())
    }

    fn default_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

fn form(multipart: &Multipart) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for part in &multipart.fields {
        form = form.text(part.name.clone(), part.value.clone());
    }
    for file in &multipart.files {
        let mut part = Part::bytes(file.content.to_vec()).file_name(file.filename.clone());
        if let Some(mime) = &file.mime {
            part = part.mime_str(mime.as_ref())?;
        }
        form = form.part(file.field.clone(), part);
    }
    Ok(form)
}
