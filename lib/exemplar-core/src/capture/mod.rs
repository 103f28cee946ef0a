//! Ambient capture of the HTTP calls made by a scenario.
//!
//! [`run`] opens a capture scope around a future. Every request built inside that future,
//! across all of its `.await` points, is recorded into the scope's [`ContextStore`] without
//! passing anything around. Scopes are carried by a tokio task-local, so:
//!
//! - two scenarios interleaved on the same runtime never see each other's requests,
//! - a nested [`run`] gets its own store, invisible to (and unaffected by) its parent,
//! - the previous scope is restored however the future ends: output, error, panic or drop.
//!
//! Outside of any scope every operation here is a silent no-op.
//!
//! # Example
//!
//! ```rust
//! use exemplar_core::capture::{self, RequestPatch};
//! use http::Method;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (_, store) = capture::record("list users", None, || async {
//!     capture::add_request(RequestPatch::call(Method::GET, "/users"));
//! })
//! .await;
//!
//! assert_eq!(store.captured_requests.len(), 1);
//! assert!(!capture::is_active());
//! # }
//! ```
//!
//! Futures handed to `tokio::spawn` start outside of any scope; wrap them with [`propagate`]
//! to keep recording into the current one.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

mod collector;
pub use self::collector::ScenarioCollector;

mod store;
pub use self::store::{
    CapturedRequest, CapturedResponse, ContextStore, FileEntry, FormData, HeaderValues,
    RequestPatch, ScenarioMetadata,
};

type SharedStore = Arc<Mutex<ContextStore>>;

tokio::task_local! {
    static CURRENT: SharedStore;
}

fn lock(store: &SharedStore) -> MutexGuard<'_, ContextStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_current<R>(f: impl FnOnce(&SharedStore) -> R) -> Option<R> {
    CURRENT.try_with(f).ok()
}

/// Runs `f` inside a fresh capture scope and returns its output unchanged.
pub async fn run<F, Fut>(
    description: impl Into<String>,
    metadata: Option<ScenarioMetadata>,
    f: F,
) -> Fut::Output
where
    F: FnOnce() -> Fut,
    Fut: Future,
{
    let (output, _) = record(description, metadata, f).await;
    output
}

/// Like [`run`], and also returns the final state of the scenario's store.
pub async fn record<F, Fut>(
    description: impl Into<String>,
    metadata: Option<ScenarioMetadata>,
    f: F,
) -> (Fut::Output, ContextStore)
where
    F: FnOnce() -> Fut,
    Fut: Future,
{
    let description = description.into();
    debug!(%description, "scenario started");
    let store = Arc::new(Mutex::new(ContextStore::new(description, metadata)));

    let future = CURRENT.sync_scope(Arc::clone(&store), f);
    let output = CURRENT.scope(Arc::clone(&store), future).await;

    let snapshot = lock(&store).clone();
    debug!(
        description = %snapshot.description,
        requests = snapshot.captured_requests.len(),
        "scenario finished"
    );
    (output, snapshot)
}

/// `true` while inside a [`run`] scope.
pub fn is_active() -> bool {
    with_current(|_| ()).is_some()
}

/// A snapshot of the current store.
pub fn store() -> Option<ContextStore> {
    with_current(|store| lock(store).clone())
}

/// A snapshot of the requests captured so far, empty outside of a scope.
pub fn captured_requests() -> Vec<CapturedRequest> {
    with_current(|store| lock(store).captured_requests.clone()).unwrap_or_default()
}

/// Appends a record built from `patch`.
///
/// Missing `method`/`url` default to `GET` and an empty URL.
/// Returns a handle on the new record, `None` outside of a scope.
pub fn add_request(patch: RequestPatch) -> Option<RequestHandle> {
    with_current(|store| {
        let mut guard = lock(store);
        let mut request = CapturedRequest::new(http::Method::GET, "");
        request.apply(patch);
        debug!(method = %request.method, url = %request.url, "request captured");
        guard.captured_requests.push(request);
        RequestHandle {
            store: Arc::clone(store),
            index: guard.captured_requests.len() - 1,
            generation: guard.generation,
        }
    })
}

/// Merges `patch` into the most recently added record.
pub fn update_last_request(patch: RequestPatch) {
    with_current(|store| {
        if let Some(request) = lock(store).captured_requests.last_mut() {
            request.apply(patch);
        }
    });
}

/// Empties the current store, the scope stays open.
pub fn clear() {
    with_current(|store| lock(store).clear());
}

/// Makes `future` record into the current scope wherever it is polled.
///
/// Returns the future unchanged in behavior when called outside of a scope.
///
/// The scope is the one active when `propagate` is called, not when the future is polled.
pub fn propagate<Fut>(future: Fut) -> impl Future<Output = Fut::Output>
where
    Fut: Future,
{
    let store = with_current(Arc::clone);
    async move {
        match store {
            Some(store) => CURRENT.scope(store, future).await,
            None => future.await,
        }
    }
}

/// An owned reference to one captured record.
///
/// Request builders keep the handle of the record they created, so later updates and the
/// response land on that record even when other calls were issued in between.
/// Once the store is cleared the handle is stale and its updates are dropped.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    store: SharedStore,
    index: usize,
    generation: u64,
}

impl RequestHandle {
    /// Position of the record in its scenario.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Merges `patch` into the record.
    pub fn update(&self, patch: RequestPatch) {
        let mut store = lock(&self.store);
        if store.generation != self.generation {
            debug!(index = self.index, "store cleared, update dropped");
            return;
        }
        if let Some(request) = store.captured_requests.get_mut(self.index) {
            request.apply(patch);
        }
    }

    /// Sets the response of the record, unless one is already set.
    pub fn attach_response(&self, response: CapturedResponse) {
        self.update(RequestPatch::response(response));
    }

    /// A snapshot of the record, `None` once the store was cleared.
    pub fn snapshot(&self) -> Option<CapturedRequest> {
        let store = lock(&self.store);
        if store.generation != self.generation {
            return None;
        }
        store.captured_requests.get(self.index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::Method;
    use serde_json::json;

    use super::*;

    fn urls(requests: &[CapturedRequest]) -> Vec<&str> {
        requests.iter().map(|request| request.url.as_str()).collect()
    }

    #[tokio::test]
    async fn should_be_inactive_outside_of_scope() {
        assert!(!is_active());
        assert!(store().is_none());
        assert!(captured_requests().is_empty());
        assert!(add_request(RequestPatch::call(Method::GET, "/ignored")).is_none());
        update_last_request(RequestPatch::body("ignored"));
        clear();
    }

    #[tokio::test]
    async fn should_capture_in_call_order() {
        let (_, store) = record("ordered", None, || async {
            for index in 0..5 {
                add_request(RequestPatch::call(Method::GET, format!("/items/{index}")));
                tokio::task::yield_now().await;
            }
            assert!(is_active());
        })
        .await;

        assert_eq!(
            urls(&store.captured_requests),
            ["/items/0", "/items/1", "/items/2", "/items/3", "/items/4"]
        );
    }

    #[tokio::test]
    async fn should_ignore_update_before_any_request() {
        let (_, store) = record("empty", None, || async {
            update_last_request(RequestPatch::body(json!({"ignored": true})));
        })
        .await;

        assert!(store.captured_requests.is_empty());
    }

    #[tokio::test]
    async fn should_update_last_request() {
        let (_, store) = record("update", None, || async {
            add_request(RequestPatch::call(Method::GET, "/first"));
            add_request(RequestPatch::call(Method::POST, "/second"));
            update_last_request(RequestPatch::header("x-request-id", "42"));
        })
        .await;

        let [first, second] = store.captured_requests.as_slice() else {
            panic!("expected two requests");
        };
        assert!(first.headers.is_empty());
        assert_eq!(second.headers["x-request-id"], "42");
    }

    #[tokio::test]
    async fn should_isolate_nested_scopes() {
        let (inner, outer) = record("outer", None, || async {
            add_request(RequestPatch::call(Method::GET, "/outer/before"));
            let (_, inner) = record("inner", None, || async {
                add_request(RequestPatch::call(Method::GET, "/inner"));
                assert_eq!(urls(&captured_requests()), ["/inner"]);
            })
            .await;
            add_request(RequestPatch::call(Method::GET, "/outer/after"));
            inner
        })
        .await;

        assert_eq!(inner.description, "inner");
        assert_eq!(urls(&inner.captured_requests), ["/inner"]);
        assert_eq!(
            urls(&outer.captured_requests),
            ["/outer/before", "/outer/after"]
        );
    }

    #[tokio::test]
    async fn should_isolate_interleaved_scenarios() {
        let scenario = |name: &'static str, pause: u64| {
            record(name, None, move || async move {
                for step in 0..3 {
                    add_request(RequestPatch::call(Method::GET, format!("/{name}/{step}")));
                    tokio::time::sleep(Duration::from_millis(pause)).await;
                }
            })
        };

        let ((_, left), (_, right)) = tokio::join!(scenario("left", 3), scenario("right", 5));

        assert_eq!(urls(&left.captured_requests), ["/left/0", "/left/1", "/left/2"]);
        assert_eq!(
            urls(&right.captured_requests),
            ["/right/0", "/right/1", "/right/2"]
        );
    }

    #[tokio::test]
    async fn should_restore_scope_after_error() {
        let result: Result<(), &str> = run("failing", None, || async {
            add_request(RequestPatch::call(Method::GET, "/boom"));
            Err("boom")
        })
        .await;

        assert_eq!(result, Err("boom"));
        assert!(!is_active());
    }

    #[tokio::test]
    async fn should_restore_parent_scope_after_panic() {
        let (_, outer) = record("outer", None, || async {
            let inner = tokio::spawn(propagate(async {
                run("panicking", None, || async {
                    add_request(RequestPatch::call(Method::GET, "/panic"));
                    panic!("scenario failure");
                })
                .await;
            }));
            assert!(inner.await.is_err());

            add_request(RequestPatch::call(Method::GET, "/after"));
        })
        .await;

        assert_eq!(urls(&outer.captured_requests), ["/after"]);
    }

    #[tokio::test]
    async fn should_propagate_scope_into_spawned_tasks() {
        let (_, store) = record("spawned", None, || async {
            let lost = tokio::spawn(async { is_active() });
            let kept = tokio::spawn(propagate(async {
                add_request(RequestPatch::call(Method::GET, "/spawned"));
                is_active()
            }));
            assert!(!lost.await.expect("task completes"));
            assert!(kept.await.expect("task completes"));
        })
        .await;

        assert_eq!(urls(&store.captured_requests), ["/spawned"]);
    }

    #[tokio::test]
    async fn should_clear_without_closing() {
        let (_, store) = record("clear", Some(ScenarioMetadata::new().with_tag("users")), || async {
            add_request(RequestPatch::call(Method::GET, "/a"));
            clear();
            assert!(is_active());
            add_request(RequestPatch::call(Method::GET, "/b"));
        })
        .await;

        assert_eq!(urls(&store.captured_requests), ["/b"]);
        assert_eq!(
            store.metadata.map(|metadata| metadata.tags),
            Some(vec!["users".to_string()])
        );
    }

    #[tokio::test]
    async fn should_target_own_record_through_handle() {
        let (_, store) = record("handles", None, || async {
            let first = add_request(RequestPatch::call(Method::GET, "/first")).expect("active");
            let _second = add_request(RequestPatch::call(Method::GET, "/second"));
            first.update(RequestPatch::header("x-owner", "first"));
            assert_eq!(first.index(), 0);
            assert_eq!(
                first.snapshot().map(|request| request.headers["x-owner"].clone()),
                Some("first".to_string())
            );
        })
        .await;

        let [first, second] = store.captured_requests.as_slice() else {
            panic!("expected two requests");
        };
        assert_eq!(first.headers["x-owner"], "first");
        assert!(second.headers.is_empty());
    }

    #[tokio::test]
    async fn should_drop_updates_of_handles_created_before_clear() {
        let (_, store) = record("stale handle", None, || async {
            let old = add_request(RequestPatch::call(Method::GET, "/old")).expect("active");
            clear();
            let new = add_request(RequestPatch::call(Method::POST, "/new")).expect("active");
            assert_eq!(old.index(), new.index());

            old.update(RequestPatch::header("x-owner", "old"));
            old.attach_response(response(418));
            new.attach_response(response(201));

            assert!(old.snapshot().is_none());
            let status = new
                .snapshot()
                .and_then(|request| request.response)
                .map(|response| response.status);
            assert_eq!(status, Some(201));
        })
        .await;

        let [request] = store.captured_requests.as_slice() else {
            panic!("expected one request");
        };
        assert_eq!(request.url, "/new");
        assert!(request.headers.is_empty());
        assert_eq!(
            request.response.as_ref().map(|response| response.status),
            Some(201)
        );
    }

    fn response(status: u16) -> CapturedResponse {
        let status = http::StatusCode::from_u16(status).expect("valid status");
        CapturedResponse::from_parts(status, &http::HeaderMap::new(), b"")
    }
}
