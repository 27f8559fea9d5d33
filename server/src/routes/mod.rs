//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Page routes sit behind the boundary middleware so cookie-based redirects
//! happen before any page renders. API routes authenticate per handler via
//! the `AuthIdentity` extractor.

pub mod auth;
pub mod boundary;
pub mod pages;
pub mod pose;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Page surfaces gated by the boundary check.
fn page_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login))
        .route("/login/{*portal}", get(pages::portal_login))
        .route("/dashboard", get(pages::dashboard_root))
        .route("/dashboard/{*rest}", get(pages::dashboard))
        .route("/pose-estimation", get(pages::pose_estimation))
        .route_layer(middleware::from_fn_with_state(state.clone(), boundary::enforce))
        .with_state(state)
}

fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/pose/models", get(pose::list_models))
        .route("/api/pose/studio", get(pose::studio))
        .route("/api/pose/studio/model", put(pose::select_model))
        .route("/api/pose/studio/camera", post(pose::toggle_camera))
        .route("/api/pose/studio/analyze", post(pose::analyze))
        .route("/api/pose/studio/report", get(pose::report))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    api_routes(state.clone())
        .merge(page_routes(state))
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
