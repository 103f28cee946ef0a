use std::time::Duration;

use axum::Router;
use axum::body::Body;
use http::{Request, Uri};
use tower::ServiceExt;

use super::{ClientError, Engine, PreparedCall, RawResponse};

/// Calls an [`axum::Router`] in memory.
///
/// Requests go straight to the router's service, so handlers run on the test task and the
/// scenario keeps recording inside them. Any status is a response.
///
/// ```rust
/// use axum::Router;
/// use axum::routing::get;
/// use exemplar_core::capture;
/// use exemplar_core::client::InProcessClient;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = InProcessClient::new(Router::new().route("/health", get(|| async { "ok" })));
///
/// let (response, store) = capture::record("health", None, || async {
///     client.get("/health").await
/// })
/// .await;
///
/// assert_eq!(response?.body, "ok");
/// assert_eq!(store.captured_requests.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InProcessClient {
    router: Router,
    timeout: Option<Duration>,
}

impl InProcessClient {
    /// Wraps the application under test.
    pub fn new(router: Router) -> Self {
        Self {
            router,
            timeout: None,
        }
    }

    /// Default timeout of the requests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    http_verbs!();
}

impl Engine for InProcessClient {
    async fn exchange(&self, mut call: PreparedCall) -> Result<RawResponse, ClientError> {
        let body = call.encode_body()?;
        let uri = call.url_with_query().parse::<Uri>().map_err(http::Error::from)?;

        let mut request = Request::builder()
            .method(call.method.clone())
            .uri(uri)
            .body(body.map_or_else(Body::empty, Body::from))?;
        *request.headers_mut() = call.header_map()?;

        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(infallible) => match infallible {},
        };

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX).await?;
        Ok(RawResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    fn default_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
