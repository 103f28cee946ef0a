use std::future::Future;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::{ContextStore, ScenarioMetadata};

const CHANNEL_BUFFER_SIZE: usize = 64;

enum CollectorMessage {
    Push(ContextStore),
    GetScenarios(oneshot::Sender<Vec<ContextStore>>),
}

/// Gathers the stores of finished scenarios, in completion order.
///
/// The stores are owned by a background task; handles are cheap to clone and can be shared
/// by scenarios running concurrently.
///
/// ```rust
/// use exemplar_core::capture::{self, RequestPatch, ScenarioCollector};
/// use http::Method;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let collector = ScenarioCollector::spawn();
/// collector
///     .run("health check", None, || async {
///         capture::add_request(RequestPatch::call(Method::GET, "/health"));
///     })
///     .await;
///
/// let scenarios = collector.scenarios().await;
/// assert_eq!(scenarios[0].captured_requests[0].url, "/health");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioCollector {
    sender: mpsc::Sender<CollectorMessage>,
}

impl std::fmt::Debug for CollectorMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push(store) => f.debug_tuple("Push").field(&store.description).finish(),
            Self::GetScenarios(_) => f.write_str("GetScenarios"),
        }
    }
}

impl ScenarioCollector {
    /// Starts the collector task on the current tokio runtime.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        tokio::spawn(collector_task(receiver));
        Self { sender }
    }

    /// Runs `f` as a scenario (see [`super::run`]) and collects its store once it completes.
    pub async fn run<F, Fut>(
        &self,
        description: impl Into<String>,
        metadata: Option<ScenarioMetadata>,
        f: F,
    ) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let (output, store) = super::record(description, metadata, f).await;
        self.push(store).await;
        output
    }

    /// Adds an already recorded scenario.
    pub async fn push(&self, store: ContextStore) {
        if self.sender.send(CollectorMessage::Push(store)).await.is_err() {
            warn!("scenario collector stopped, scenario dropped");
        }
    }

    /// The scenarios collected so far.
    pub async fn scenarios(&self) -> Vec<ContextStore> {
        let (tx, rx) = oneshot::channel();
        if self
            .sender
            .send(CollectorMessage::GetScenarios(tx))
            .await
            .is_err()
        {
            warn!("scenario collector stopped");
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    /// The scenarios collected so far, as a JSON array.
    pub async fn to_json(&self) -> serde_json::Value {
        let scenarios = self.scenarios().await;
        serde_json::to_value(&scenarios).unwrap_or_else(|error| {
            warn!(%error, "failed to serialize scenarios");
            serde_json::Value::Array(Vec::new())
        })
    }
}

async fn collector_task(mut receiver: mpsc::Receiver<CollectorMessage>) {
    let mut scenarios = Vec::new();

    while let Some(message) = receiver.recv().await {
        match message {
            CollectorMessage::Push(store) => {
                debug!(description = %store.description, "scenario collected");
                scenarios.push(store);
            }
            CollectorMessage::GetScenarios(reply) => {
                // receiver may be gone if the caller was cancelled
                let _ = reply.send(scenarios.clone());
            }
        }
    }
}
