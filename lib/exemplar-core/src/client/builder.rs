use std::fmt::Debug;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use http::Uri;
use http::uri::{PathAndQuery, Scheme};

use super::{ClientError, HttpClient};

/// Builder for [`HttpClient`].
///
/// Defaults to `http://127.0.0.1:80`, no timeout, and statuses `>= 400` reported as errors.
///
/// ```rust
/// use std::time::Duration;
/// use exemplar_core::client::HttpClient;
///
/// let client = HttpClient::builder()
///     .with_host("api.example.com")
///     .with_port(8443)
///     .with_scheme(http::uri::Scheme::HTTPS)
///     .with_base_path("/api/v1")?
///     .with_timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok::<(), exemplar_core::client::ClientError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    client: reqwest::Client,
    scheme: Scheme,
    host: String,
    port: u16,
    base_path: Option<PathAndQuery>,
    timeout: Option<Duration>,
    error_for_status: bool,
}

impl HttpClientBuilder {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Fails when the parts do not form a valid base URL.
    pub fn build(self) -> Result<HttpClient, ClientError> {
        let Self {
            client,
            scheme,
            host,
            port,
            base_path,
            timeout,
            error_for_status,
        } = self;

        let base_uri = Uri::builder()
            .scheme(scheme)
            .authority(format!("{host}:{port}"))
            .path_and_query(base_path.as_ref().map_or("/", PathAndQuery::path))
            .build()?;

        Ok(HttpClient {
            client,
            base_url: base_uri.to_string().trim_end_matches('/').to_string(),
            timeout,
            error_for_status,
        })
    }

    /// Sets the scheme, `http` by default.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the host, `127.0.0.1` by default.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port, `80` by default.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Prefixes every request path.
    ///
    /// # Errors
    ///
    /// Fails when `base_path` is not a valid path.
    pub fn with_base_path<P>(mut self, base_path: P) -> Result<Self, ClientError>
    where
        P: TryInto<PathAndQuery>,
        P::Error: Debug + 'static,
    {
        let base_path = base_path
            .try_into()
            .map_err(|err| ClientError::InvalidBaseUrl {
                error: format!("{err:?}"),
            })?;
        self.base_path = Some(base_path);
        Ok(self)
    }

    /// Default timeout of the requests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether statuses `>= 400` are reported as [`ClientError::Status`], `true` by default.
    ///
    /// The response is captured either way.
    pub fn with_error_for_status(mut self, enabled: bool) -> Self {
        self.error_for_status = enabled;
        self
    }

    /// Uses a preconfigured reqwest client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            scheme: Scheme::HTTP,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST).to_string(),
            port: 80,
            base_path: None,
            timeout: None,
            error_for_status: true,
        }
    }
}
