use url::Url;

use super::{ClientError, Engine, PreparedCall, RawResponse};

/// A bare fetch: reqwest as a transport only.
///
/// The query string and the body are encoded here rather than by reqwest, and every status,
/// including `4xx` and `5xx`, is returned as a response. Request URLs must be absolute unless
/// a base URL is set.
///
/// ```rust
/// use exemplar_core::client::FetchClient;
///
/// let client = FetchClient::new().with_base_url("http://localhost:3000/api/")?;
/// assert_eq!(client.base_url().map(|url| url.as_str()), Some("http://localhost:3000/api/"));
/// # Ok::<(), exemplar_core::client::ClientError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FetchClient {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl FetchClient {
    /// A client without base URL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative request URLs against `base_url`, read as a directory.
    ///
    /// # Errors
    ///
    /// Fails when `base_url` is not an absolute URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url).map_err(|err| ClientError::InvalidBaseUrl {
            error: format!("{base_url}: {err}"),
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.base_url = Some(base_url);
        Ok(self)
    }

    /// Uses a preconfigured reqwest client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The base URL, if any.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    http_verbs!();

    fn resolve(&self, url: &str) -> Result<Url, ClientError> {
        match &self.base_url {
            Some(base_url) => Ok(base_url.join(url.trim_start_matches('/'))?),
            None => Ok(Url::parse(url)?),
        }
    }
}

impl Engine for FetchClient {
    async fn exchange(&self, mut call: PreparedCall) -> Result<RawResponse, ClientError> {
        let body = call.encode_body()?;
        let url = self.resolve(&call.url_with_query())?;

        let mut request = self
            .client
            .request(call.method.clone(), url)
            .headers(call.header_map()?);
        if let Some(body) = body {
            request = request.body(body);
        }

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
}
