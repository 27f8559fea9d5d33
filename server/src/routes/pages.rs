//! Page surfaces behind the boundary middleware.
//!
//! Pages are placeholders: what matters is who reaches them. Dashboards run
//! the route guard on top of the boundary check.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{OriginalUri, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use portal::SESSION_KEY;
use portal::boundary::CookieSession;
use portal::guard::{Area, GuardDecision, RouteGuard};
use portal::identity::Identity;
use portal::session::Session;

// =============================================================================
// TEMPLATES
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub title: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub title: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/portal_login.html")]
pub struct PortalLoginTemplate {
    pub title: &'static str,
    pub blurb: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub title: &'static str,
    pub name: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "pages/pose_estimation.html")]
pub struct PoseEstimationTemplate {
    pub title: &'static str,
}

// =============================================================================
// HANDLERS
// =============================================================================

fn cookie_identity(jar: &CookieJar) -> Option<Identity> {
    match CookieSession::from_cookie(jar.get(SESSION_KEY).map(Cookie::value)) {
        CookieSession::Valid(identity) => Some(identity),
        CookieSession::Missing | CookieSession::Corrupt => None,
    }
}

/// `GET /`
pub async fn home() -> HomeTemplate {
    HomeTemplate { title: "Welcome to Kinetic" }
}

/// `GET /login`: portal chooser.
pub async fn login() -> LoginTemplate {
    LoginTemplate { title: "Choose your login portal" }
}

/// `GET /login/{*portal}`
pub async fn portal_login(Path(portal): Path<String>) -> Response {
    match portal.as_str() {
        "patient" => PortalLoginTemplate {
            title: "Patient Portal",
            blurb: "Sign in to follow your recovery plan.",
        }
        .into_response(),
        "provider" => PortalLoginTemplate {
            title: "Provider Portal",
            blurb: "Sign in to manage your patients.",
        }
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `GET /dashboard`: forward to the caller's own dashboard.
pub async fn dashboard_root(jar: CookieJar) -> Redirect {
    let target = cookie_identity(&jar).map_or(portal::LOGIN_PATH, |i| i.role.dashboard_path());
    Redirect::temporary(target)
}

/// `GET /dashboard/{*rest}`: role-gated dashboards.
pub async fn dashboard(OriginalUri(uri): OriginalUri, jar: CookieJar) -> Response {
    let Some(area) = Area::from_path(uri.path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let session = Session::settled(cookie_identity(&jar));
    match RouteGuard::new(area).evaluate(&session) {
        GuardDecision::Render => {
            let title = match area {
                Area::Patient => "Patient Dashboard",
                Area::Provider => "Provider Dashboard",
            };
            let name = session.identity.map(|i| i.name).unwrap_or_default();
            DashboardTemplate { title, name }.into_response()
        }
        GuardDecision::RedirectToLogin(to) | GuardDecision::RedirectToOwnDashboard(to) => {
            Redirect::temporary(to).into_response()
        }
        GuardDecision::Pending => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// `GET /pose-estimation`
pub async fn pose_estimation() -> PoseEstimationTemplate {
    PoseEstimationTemplate { title: "AI Pose Estimation" }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
