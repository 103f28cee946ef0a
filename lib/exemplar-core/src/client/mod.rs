//! Request builders mirroring their calls into the active scenario.
//!
//! Three adapters share one fluent contract, the [`Call`] builder:
//!
//! - [`InProcessClient`] drives an `axum::Router` directly, no socket involved,
//! - [`HttpClient`] is a configured reqwest client that fails on error statuses,
//! - [`FetchClient`] is a bare fetch over reqwest, any status is a response.
//!
//! For equivalent calls all three capture the same request and response shapes.
//!
//! ```rust,no_run
//! use exemplar_core::capture;
//! use exemplar_core::client::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::builder().with_port(8080).build()?;
//!
//! let (response, store) = capture::record("list users", None, || async {
//!     client.get("/users").query([("page", 1)]).await
//! })
//! .await;
//!
//! assert_eq!(response?.status, 200);
//! assert_eq!(store.captured_requests[0].query_params["page"], 1);
//! # Ok(())
//! # }
//! ```

macro_rules! http_verbs {
    () => {
        /// Starts a `GET` request.
        pub fn get(&self, url: impl Into<String>) -> $crate::client::Call<Self> {
            self.request(http::Method::GET, url)
        }

        /// Starts a `POST` request.
        pub fn post(&self, url: impl Into<String>) -> $crate::client::Call<Self> {
            self.request(http::Method::POST, url)
        }

        /// Starts a `PUT` request.
        pub fn put(&self, url: impl Into<String>) -> $crate::client::Call<Self> {
            self.request(http::Method::PUT, url)
        }

        /// Starts a `PATCH` request.
        pub fn patch(&self, url: impl Into<String>) -> $crate::client::Call<Self> {
            self.request(http::Method::PATCH, url)
        }

        /// Starts a `DELETE` request.
        pub fn delete(&self, url: impl Into<String>) -> $crate::client::Call<Self> {
            self.request(http::Method::DELETE, url)
        }

        /// Starts a `HEAD` request.
        pub fn head(&self, url: impl Into<String>) -> $crate::client::Call<Self> {
            self.request(http::Method::HEAD, url)
        }

        /// Starts an `OPTIONS` request.
        pub fn options(&self, url: impl Into<String>) -> $crate::client::Call<Self> {
            self.request(http::Method::OPTIONS, url)
        }

        /// Starts a request with any method.
        pub fn request(
            &self,
            method: http::Method,
            url: impl Into<String>,
        ) -> $crate::client::Call<Self> {
            $crate::client::Call::new(self.clone(), method, url)
        }
    };
}

mod call;
pub use self::call::Call;

mod engine;
pub use self::engine::{Engine, PreparedCall, RawResponse, RequestBody};

mod error;
pub use self::error::ClientError;

mod multipart;
pub use self::multipart::{FilePart, FileSource, Multipart, TextPart};

mod query;

mod in_process;
pub use self::in_process::InProcessClient;

mod builder;
pub use self::builder::HttpClientBuilder;

mod http_client;
pub use self::http_client::HttpClient;

mod fetch;
pub use self::fetch::FetchClient;
