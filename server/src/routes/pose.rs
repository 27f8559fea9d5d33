//! Pose studio routes. Every endpoint acts on the caller's own studio.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use portal::pose::{DEFAULT_SESSION_LABEL, PoseAnalysis, PoseError, PoseModel};
use serde::{Deserialize, Serialize};

use super::auth::AuthIdentity;
use crate::state::AppState;

pub(crate) fn pose_error_to_status(err: &PoseError) -> StatusCode {
    match err {
        PoseError::CameraInactive | PoseError::UnknownModel(_) => StatusCode::BAD_REQUEST,
        PoseError::AnalysisInProgress => StatusCode::CONFLICT,
        PoseError::NoResult => StatusCode::NOT_FOUND,
        PoseError::Storage(_) | PoseError::Timestamp(_) | PoseError::Task(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn pose_error_response(err: PoseError) -> Response {
    let status = pose_error_to_status(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "pose studio failure");
    }
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

#[derive(Serialize)]
pub struct ModelInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
}

#[derive(Serialize)]
pub struct StudioView {
    pub model: PoseModel,
    pub camera_active: bool,
    pub last_result: Option<PoseAnalysis>,
}

#[derive(Deserialize)]
pub struct SelectModel {
    model: String,
}

#[derive(Deserialize)]
pub struct CameraToggle {
    active: bool,
}

/// `GET /api/pose/models`
pub async fn list_models() -> Json<Vec<ModelInfo>> {
    Json(
        PoseModel::ALL
            .into_iter()
            .map(|m| ModelInfo { name: m.as_str(), version: m.version(), description: m.description() })
            .collect(),
    )
}

/// `GET /api/pose/studio`
pub async fn studio(State(state): State<AppState>, AuthIdentity(identity): AuthIdentity) -> Json<StudioView> {
    let studio = state.studio_for(&identity.id).await;
    Json(StudioView { model: studio.model(), camera_active: studio.camera_active(), last_result: studio.last_result() })
}

/// `PUT /api/pose/studio/model`
pub async fn select_model(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<SelectModel>,
) -> Response {
    let studio = state.studio_for(&identity.id).await;
    let result = body.model.parse::<PoseModel>().and_then(|m| studio.select_model(m));
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => pose_error_response(e),
    }
}

/// `POST /api/pose/studio/camera`
pub async fn toggle_camera(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(body): Json<CameraToggle>,
) -> StatusCode {
    let studio = state.studio_for(&identity.id).await;
    if body.active {
        studio.start_camera();
    } else {
        studio.stop_camera();
    }
    StatusCode::NO_CONTENT
}

/// `POST /api/pose/studio/analyze`
pub async fn analyze(State(state): State<AppState>, AuthIdentity(identity): AuthIdentity) -> Response {
    let studio = state.studio_for(&identity.id).await;
    match studio.analyze().await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(e) => pose_error_response(e),
    }
}

/// `GET /api/pose/studio/report`: latest analysis as a downloadable JSON file.
pub async fn report(State(state): State<AppState>, AuthIdentity(identity): AuthIdentity) -> Response {
    let studio = state.studio_for(&identity.id).await;
    let report = match studio.report(&identity.name, DEFAULT_SESSION_LABEL) {
        Ok(report) => report,
        Err(e) => return pose_error_response(e),
    };
    let disposition = format!("attachment; filename=\"{}\"", report.file_name());
    ([(header::CONTENT_DISPOSITION, disposition)], Json(report)).into_response()
}

#[cfg(test)]
#[path = "pose_test.rs"]
mod tests;
