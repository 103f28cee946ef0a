#![allow(dead_code, missing_docs, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::extract::{Multipart, Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::info;

use exemplar_core::client::{FetchClient, HttpClient, InProcessClient};

/// A small user API, served on a random local port.
#[derive(Debug)]
pub struct TestApp {
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl TestApp {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind test listener")?;
        let addr = listener.local_addr()?;
        info!(%addr, "launching server");

        let server = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, router()).await {
                tracing::error!(?error, "test server stopped");
            }
        });
        Ok(Self { addr, server })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn in_process(&self) -> InProcessClient {
        InProcessClient::new(router())
    }

    pub fn http(&self) -> HttpClient {
        HttpClient::builder()
            .with_port(self.addr.port())
            .build()
            .expect("valid test client")
    }

    pub fn fetch(&self) -> FetchClient {
        FetchClient::new()
            .with_base_url(&format!("http://{}/", self.addr))
            .expect("valid base url")
    }

    /// A fetch client whose base URL points to a closed port.
    pub fn unreachable() -> FetchClient {
        let closed = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("free port");
        FetchClient::new()
            .with_base_url(&format!("http://{closed}/"))
            .expect("valid base url")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/headers", get(echo_headers))
        .route("/upload", post(upload))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                "late"
            }),
        )
}

async fn list_users(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let page = query
        .get("page")
        .and_then(|page| page.parse::<u32>().ok())
        .unwrap_or(1);
    Json(json!({
        "page": page,
        "users": [
            {"id": 1, "name": "Ada", "email": "ada@example.com"}
        ]
    }))
}

async fn create_user(Json(mut user): Json<Value>) -> impl IntoResponse {
    if let Some(user) = user.as_object_mut() {
        user.insert("id".to_string(), json!(2));
    }
    (StatusCode::CREATED, Json(user))
}

async fn get_user(Path(id): Path<u32>) -> impl IntoResponse {
    if id == 1 {
        (
            StatusCode::OK,
            Json(json!({"id": 1, "name": "Ada", "email": "ada@example.com"})),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("user {id} not found")})),
        )
    }
}

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let echoed = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-") || *name == "authorization")
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or_default().to_string();
            (name.as_str().to_string(), Value::String(value))
        })
        .collect::<serde_json::Map<_, _>>();
    Json(Value::Object(echoed))
}

async fn upload(mut multipart: Multipart) -> Result<Json<Value>, StatusCode> {
    let mut fields = serde_json::Map::new();
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let size = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?.len();
                files.push(json!({
                    "field": name,
                    "filename": filename,
                    "contentType": content_type,
                    "size": size
                }));
            }
            None => {
                let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                fields.insert(name, Value::String(text));
            }
        }
    }
    Ok(Json(json!({"fields": fields, "files": files})))
}
