//! # Exemplar Core
//!
//! Record the HTTP calls made by your tests, and turn the recorded examples into OpenAPI schemas.
//!
//! - **[`capture`]** - a scenario scope recording every request built inside it, across `.await`s
//! - **[`client`]** - request builders for an in-process `axum::Router`, a configured reqwest
//!   client, and a bare fetch, all capturing the same shapes
//! - **[`schema`]** - minimal OpenAPI schema fragments synthesized from captured values
//!
//! ## Quick Start
//!
//! ```rust
//! use axum::{Json, Router, routing::post};
//! use exemplar_core::capture;
//! use exemplar_core::client::InProcessClient;
//! use exemplar_core::schema::{SchemaValue, create_schema, documented};
//! use serde_json::{Value, json};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let app = Router::new().route("/users", post(|Json(user): Json<Value>| async move { Json(user) }));
//! let client = InProcessClient::new(app);
//!
//! let (response, store) = capture::record("create a user", None, || async {
//!     client
//!         .post("/users")
//!         .send(SchemaValue::object([
//!             ("name", SchemaValue::from("Ada")),
//!             ("email", SchemaValue::from(documented("ada@example.com").with_description("Login"))),
//!         ]))
//!         .await
//! })
//! .await;
//! assert_eq!(response?.body, json!({"name": "Ada", "email": "ada@example.com"}));
//!
//! // the captured body keeps the documentation
//! let body = store.captured_requests[0].body.as_ref().ok_or("no body")?;
//! let schema = create_schema(body, true);
//! assert_eq!(
//!     schema.to_json()["properties"]["email"],
//!     json!({
//!         "type": "string",
//!         "format": "email",
//!         "example": "ada@example.com",
//!         "description": "Login"
//!     })
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Scenarios
//!
//! Scenarios are scoped to the future passed to [`capture::run`]: concurrent scenarios never
//! see each other's requests, and nested ones get their own store. Use
//! [`capture::ScenarioCollector`] to gather the stores of a whole test suite.

pub mod capture;
pub mod client;
pub mod schema;

pub use self::capture::{CapturedRequest, CapturedResponse, ContextStore, ScenarioMetadata};
pub use self::client::{Call, ClientError, FetchClient, HttpClient, InProcessClient};
pub use self::schema::{Documented, SchemaFactory, SchemaValue, create_schema, documented};
