//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the parsed config, the authenticator used by login, and one live
//! pose studio per logged-in identity. Session state itself lives in the
//! client's cookie; the server keeps none.
//!
//! Studios are bounded: logout releases the caller's studio, and once
//! `max_pose_studios` are live the least recently used one is dropped.
//! A dropped studio that is mid-analysis finishes on its own task.

use std::collections::HashMap;
use std::sync::Arc;

use portal::credentials::Authenticator;
use portal::directory::IdentityDirectory;
use portal::pose::PoseStudio;
use portal::storage::MemoryStore;
use tokio::sync::RwLock;

use crate::config::ServerConfig;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub authenticator: Authenticator,
    /// Pose studios keyed by identity id.
    pub studios: Arc<RwLock<StudioCache>>,
}

struct StudioSlot {
    studio: Arc<PoseStudio>,
    last_used: u64,
}

/// Live pose studios, evicted least recently used first.
pub struct StudioCache {
    slots: HashMap<String, StudioSlot>,
    clock: u64,
    capacity: usize,
}

impl StudioCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { slots: HashMap::new(), clock: 0, capacity: capacity.max(1) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn contains(&self, identity_id: &str) -> bool {
        self.slots.contains_key(identity_id)
    }

    /// Studio for `identity_id`, created with `open` when absent.
    pub fn get_or_open(&mut self, identity_id: &str, open: impl FnOnce() -> PoseStudio) -> Arc<PoseStudio> {
        self.clock += 1;
        let now = self.clock;
        if let Some(slot) = self.slots.get_mut(identity_id) {
            slot.last_used = now;
            return slot.studio.clone();
        }

        while self.slots.len() >= self.capacity {
            let Some(oldest) = self.slots.iter().min_by_key(|(_, slot)| slot.last_used).map(|(id, _)| id.clone())
            else {
                break;
            };
            self.slots.remove(&oldest);
            tracing::debug!(identity_id = %oldest, "evicted idle pose studio");
        }

        let studio = Arc::new(open());
        self.slots.insert(identity_id.to_owned(), StudioSlot { studio: studio.clone(), last_used: now });
        studio
    }

    /// Drop the studio for `identity_id`. Returns whether one was live.
    pub fn release(&mut self, identity_id: &str) -> bool {
        self.slots.remove(identity_id).is_some()
    }
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, directory: Arc<dyn IdentityDirectory>) -> Self {
        let authenticator = Authenticator::new(directory)
            .with_policy(config.password_policy)
            .with_delay(config.login_delay);
        let studios = Arc::new(RwLock::new(StudioCache::new(config.max_pose_studios)));
        Self { config: Arc::new(config), authenticator, studios }
    }

    /// Studio for `identity_id`, opened on first use.
    pub async fn studio_for(&self, identity_id: &str) -> Arc<PoseStudio> {
        let timing = self.config.pose_timing;
        self.studios
            .write()
            .await
            .get_or_open(identity_id, || PoseStudio::load(Arc::new(MemoryStore::new()), timing))
    }

    /// Forget the studio for `identity_id`, if any.
    pub async fn release_studio(&self, identity_id: &str) {
        if self.studios.write().await.release(identity_id) {
            tracing::debug!(%identity_id, "released pose studio");
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::time::Duration;

    use axum::body::{Body, Bytes};
    use axum::http::{HeaderMap, Request, StatusCode, header};
    use http_body_util::BodyExt;
    use portal::directory::MockDirectory;
    use portal::identity::Identity;
    use portal::pose::AnalysisTiming;
    use tower::ServiceExt;

    use super::*;

    /// Response pieces collected by [`send`].
    pub struct TestResponse {
        pub status: StatusCode,
        pub headers: HeaderMap,
        pub body: Bytes,
    }

    impl TestResponse {
        #[must_use]
        pub fn location(&self) -> Option<&str> {
            self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
        }

        /// All `Set-Cookie` header values.
        #[must_use]
        pub fn set_cookies(&self) -> Vec<String> {
            self.headers
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok().map(str::to_owned))
                .collect()
        }

        #[must_use]
        pub fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).expect("response body should be JSON")
        }

        #[must_use]
        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }
    }

    /// Drive one request through the full router.
    pub async fn send(state: AppState, request: Request<Body>) -> TestResponse {
        let response = crate::routes::app(state)
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes();
        TestResponse { status, headers, body }
    }

    /// `GET path`, optionally carrying a raw `kineticUser` cookie value.
    #[must_use]
    pub fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(value) = cookie {
            builder = builder.header(header::COOKIE, format!("kineticUser={value}"));
        }
        builder.body(Body::empty()).expect("valid request")
    }

    /// JSON request with an optional raw `kineticUser` cookie value.
    #[must_use]
    pub fn json_request(method: &str, path: &str, cookie: Option<&str>, body: &serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(value) = cookie {
            builder = builder.header(header::COOKIE, format!("kineticUser={value}"));
        }
        builder.body(Body::from(body.to_string())).expect("valid request")
    }

    /// Persisted cookie value for the demo account with `email`.
    #[must_use]
    pub fn cookie_for(email: &str) -> String {
        let known = MockDirectory::new()
            .entries()
            .iter()
            .find(|e| e.identity.email == email)
            .cloned()
            .expect("demo account exists");
        known.into_identity().to_persisted().expect("identity serializes")
    }

    /// Identity behind a cookie value produced by [`cookie_for`].
    #[must_use]
    pub fn identity_of(cookie: &str) -> Identity {
        Identity::from_persisted(cookie).expect("valid cookie")
    }

    /// App state with the demo directory and no artificial delays.
    #[must_use]
    pub fn test_app_state() -> AppState {
        test_app_state_with(ServerConfig {
            pose_timing: AnalysisTiming { base: Duration::ZERO, jitter: Duration::ZERO },
            ..ServerConfig::default()
        })
    }

    /// App state built from `config`, with login delay removed.
    #[must_use]
    pub fn test_app_state_with(config: ServerConfig) -> AppState {
        let config = ServerConfig { login_delay: Duration::ZERO, ..config };
        AppState::new(config, Arc::new(MockDirectory::new()))
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
