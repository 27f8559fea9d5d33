//! Simulated pose-estimation studio.
//!
//! DESIGN
//! ======
//! No model runs here. An analysis waits a fixed base delay plus random
//! jitter and then fabricates symmetry, risk and timing figures. The selected
//! model is remembered in local storage under `poseModel`.
//!
//! Analyses cannot be cancelled once started: the delay and the result write
//! run on a spawned task, so dropping the caller's future leaves the analysis
//! running to completion. The camera is a flag only.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::storage::{KeyValueStore, StorageError};

pub const MODEL_KEY: &str = "poseModel";

pub const KEYPOINTS: [&str; 6] =
    ["Left Shoulder", "Right Shoulder", "Left Elbow", "Right Elbow", "Left Knee", "Right Knee"];

pub const DEFAULT_SESSION_LABEL: &str = "Shoulder Mobility Test";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PoseModel {
    #[default]
    MediaPipe,
    OpenPose,
}

impl PoseModel {
    pub const ALL: [Self; 2] = [Self::MediaPipe, Self::OpenPose];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MediaPipe => "MediaPipe",
            Self::OpenPose => "OpenPose",
        }
    }

    #[must_use]
    pub fn version(self) -> &'static str {
        match self {
            Self::MediaPipe => "v0.9",
            Self::OpenPose => "v1.7",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::MediaPipe => "Real-time pose detection optimized for mobile devices",
            Self::OpenPose => "High-accuracy pose estimation for detailed analysis",
        }
    }
}

impl std::fmt::Display for PoseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PoseModel {
    type Err = PoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PoseError::UnknownModel(s.to_owned()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    #[must_use]
    pub fn from_symmetry(percent: u8) -> Self {
        if percent > 90 {
            Self::Low
        } else if percent > 85 {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("Please activate your camera first")]
    CameraInactive,
    #[error("an analysis is already running")]
    AnalysisInProgress,
    #[error("no analysis result to report")]
    NoResult,
    #[error("unknown pose model: {0}")]
    UnknownModel(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Fabricated analysis outcome.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(into = "AnalysisRecord")]
pub struct PoseAnalysis {
    pub model: PoseModel,
    pub symmetry_percent: u8,
    pub risk_level: RiskLevel,
    pub keypoints: Vec<String>,
    /// Seconds, rounded to one decimal.
    pub analysis_secs: f64,
}

/// Display form of [`PoseAnalysis`]: percentages and durations as text.
#[derive(Serialize)]
struct AnalysisRecord {
    model: PoseModel,
    camera: &'static str,
    pose_symmetry: String,
    risk_level: RiskLevel,
    keypoints_detected: Vec<String>,
    analysis_time: String,
}

impl From<PoseAnalysis> for AnalysisRecord {
    fn from(a: PoseAnalysis) -> Self {
        Self {
            model: a.model,
            camera: "ON",
            pose_symmetry: format!("{}%", a.symmetry_percent),
            risk_level: a.risk_level,
            keypoints_detected: a.keypoints,
            analysis_time: format!("{:.1}s", a.analysis_secs),
        }
    }
}

/// Make up an analysis for `model`.
pub fn fabricate_analysis<R: Rng>(model: PoseModel, rng: &mut R) -> PoseAnalysis {
    let symmetry_percent: u8 = rng.random_range(80..95);
    let raw_secs = 3.0 + rng.random::<f64>() * 2.0;
    PoseAnalysis {
        model,
        symmetry_percent,
        risk_level: RiskLevel::from_symmetry(symmetry_percent),
        keypoints: KEYPOINTS.iter().map(|k| (*k).to_owned()).collect(),
        analysis_secs: (raw_secs * 10.0).round() / 10.0,
    }
}

/// Downloadable report wrapping an analysis.
#[derive(Clone, Debug, Serialize)]
pub struct PoseReport {
    pub timestamp: String,
    pub patient: String,
    pub session: String,
    #[serde(flatten)]
    pub analysis: PoseAnalysis,
}

impl PoseReport {
    /// `AI_Posture_Review_<Patient_Name>.json`, limited to `[A-Za-z0-9_.-]`
    /// so it can be quoted in a `Content-Disposition` header as is.
    #[must_use]
    pub fn file_name(&self) -> String {
        let patient: String = self
            .patient
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
            .collect();
        format!("AI_Posture_Review_{patient}.json")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalysisTiming {
    pub base: Duration,
    pub jitter: Duration,
}

impl Default for AnalysisTiming {
    fn default() -> Self {
        Self { base: Duration::from_millis(3000), jitter: Duration::from_millis(1000) }
    }
}

impl AnalysisTiming {
    fn sample<R: Rng>(self, rng: &mut R) -> Duration {
        self.base + self.jitter.mul_f64(rng.random::<f64>())
    }
}

#[derive(Default)]
struct StudioState {
    model: PoseModel,
    camera_active: bool,
    analyzing: bool,
    last: Option<PoseAnalysis>,
}

fn lock(state: &Mutex<StudioState>) -> MutexGuard<'_, StudioState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Held by a running analysis; clears the busy flag however the task ends.
struct AnalysisSlot(Arc<Mutex<StudioState>>);

impl Drop for AnalysisSlot {
    fn drop(&mut self) {
        lock(&self.0).analyzing = false;
    }
}

pub struct PoseStudio {
    store: Arc<dyn KeyValueStore>,
    timing: AnalysisTiming,
    state: Arc<Mutex<StudioState>>,
}

impl PoseStudio {
    /// Open the studio, restoring the last selected model.
    #[must_use]
    pub fn load(store: Arc<dyn KeyValueStore>, timing: AnalysisTiming) -> Self {
        let model = match store.get(MODEL_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "ignoring stored pose model");
                PoseModel::default()
            }),
            Ok(None) => PoseModel::default(),
            Err(e) => {
                warn!(error = %e, "failed to read stored pose model");
                PoseModel::default()
            }
        };
        let state = StudioState { model, ..StudioState::default() };
        Self { store, timing, state: Arc::new(Mutex::new(state)) }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut StudioState) -> R) -> R {
        f(&mut lock(&self.state))
    }

    #[must_use]
    pub fn model(&self) -> PoseModel {
        self.with_state(|s| s.model)
    }

    /// Select and remember a model.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Storage`] if the selection cannot be persisted.
    pub fn select_model(&self, model: PoseModel) -> Result<(), PoseError> {
        self.with_state(|s| s.model = model);
        self.store.set(MODEL_KEY, model.as_str())?;
        Ok(())
    }

    #[must_use]
    pub fn camera_active(&self) -> bool {
        self.with_state(|s| s.camera_active)
    }

    pub fn start_camera(&self) {
        self.with_state(|s| s.camera_active = true);
        info!("camera activated");
    }

    pub fn stop_camera(&self) {
        self.with_state(|s| s.camera_active = false);
        info!("camera stopped");
    }

    #[must_use]
    pub fn last_result(&self) -> Option<PoseAnalysis> {
        self.with_state(|s| s.last.clone())
    }

    /// Run a fabricated analysis with the selected model.
    ///
    /// The analysis runs on its own task. Dropping the returned future stops
    /// waiting for it but does not cancel it: the result is still recorded
    /// and the studio becomes free again when the delay has passed.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::CameraInactive`] when the camera is off,
    /// [`PoseError::AnalysisInProgress`] while another analysis runs and
    /// [`PoseError::Task`] if the analysis task panicked or was aborted.
    pub async fn analyze(&self) -> Result<PoseAnalysis, PoseError> {
        let model = self.with_state(|s| {
            if !s.camera_active {
                return Err(PoseError::CameraInactive);
            }
            if s.analyzing {
                return Err(PoseError::AnalysisInProgress);
            }
            s.analyzing = true;
            Ok(s.model)
        })?;
        let slot = AnalysisSlot(self.state.clone());

        let delay = self.timing.sample(&mut rand::rng());
        info!(%model, delay_ms = %delay.as_millis(), "starting pose analysis");

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let analysis = fabricate_analysis(model, &mut rand::rng());
            lock(&slot.0).last = Some(analysis.clone());
            drop(slot);
            info!(%model, symmetry = analysis.symmetry_percent, "pose analysis completed");
            analysis
        });
        Ok(task.await?)
    }

    /// Wrap the latest analysis into a report.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::NoResult`] before any analysis has completed.
    pub fn report(&self, patient: &str, session: &str) -> Result<PoseReport, PoseError> {
        let analysis = self.last_result().ok_or(PoseError::NoResult)?;
        build_report(analysis, patient, session)
    }
}

/// Stamp `analysis` with the current time.
///
/// # Errors
///
/// Returns [`PoseError::Timestamp`] if the timestamp cannot be formatted.
pub fn build_report(analysis: PoseAnalysis, patient: &str, session: &str) -> Result<PoseReport, PoseError> {
    Ok(PoseReport {
        timestamp: OffsetDateTime::now_utc().format(&Rfc3339)?,
        patient: patient.to_owned(),
        session: session.to_owned(),
        analysis,
    })
}

/// Fake a video upload: progress 0..=100 in steps of ten, one per `interval`.
#[must_use]
pub fn simulate_upload(interval: Duration) -> mpsc::Receiver<u8> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        for progress in (0..=100u8).step_by(10) {
            if progress > 0 {
                tokio::time::sleep(interval).await;
            }
            if tx.send(progress).await.is_err() {
                return;
            }
        }
    });
    rx
}

#[cfg(test)]
#[path = "pose_test.rs"]
mod tests;
