//! Boundary check: routing decisions from the session cookie alone.
//!
//! DESIGN
//! ======
//! Runs before any client code on each request to `/`, `/login*` and
//! `/dashboard*`. Other paths pass through. A cookie that does not parse is
//! treated as no session and the response deletes it.

use tracing::warn;

use crate::LOGIN_PATH;
use crate::guard::Area;
use crate::identity::Identity;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathClass {
    Home,
    Login,
    /// `/dashboard` or below; `area` is set for role-specific areas.
    Dashboard { area: Option<Area> },
    Unguarded,
}

#[must_use]
pub fn classify_path(path: &str) -> PathClass {
    if path == "/" {
        return PathClass::Home;
    }
    if path == "/login" || path.starts_with("/login/") {
        return PathClass::Login;
    }
    if path == "/dashboard" || path.starts_with("/dashboard/") {
        return PathClass::Dashboard { area: Area::from_path(path) };
    }
    PathClass::Unguarded
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundaryAction {
    Allow,
    Redirect(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryDecision {
    pub action: BoundaryAction,
    /// Response must expire the session cookie.
    pub clear_cookie: bool,
}

impl BoundaryDecision {
    fn allow() -> Self {
        Self { action: BoundaryAction::Allow, clear_cookie: false }
    }

    fn redirect(to: &'static str) -> Self {
        Self { action: BoundaryAction::Redirect(to), clear_cookie: false }
    }
}

/// Outcome of reading the cookie value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CookieSession {
    Missing,
    Corrupt,
    Valid(Identity),
}

impl CookieSession {
    #[must_use]
    pub fn from_cookie(value: Option<&str>) -> Self {
        match value {
            None | Some("") => Self::Missing,
            Some(raw) => match Identity::from_persisted(raw) {
                Ok(identity) => Self::Valid(identity),
                Err(e) => {
                    warn!(error = %e, "corrupt session cookie");
                    Self::Corrupt
                }
            },
        }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Valid(identity) => Some(identity),
            Self::Missing | Self::Corrupt => None,
        }
    }
}

/// Decide what to do with a request for `path` carrying `cookie`.
#[must_use]
pub fn check(path: &str, cookie: Option<&str>) -> BoundaryDecision {
    let session = CookieSession::from_cookie(cookie);
    let mut decision = decide(classify_path(path), session.identity());
    decision.clear_cookie = session == CookieSession::Corrupt;
    decision
}

fn decide(class: PathClass, identity: Option<&Identity>) -> BoundaryDecision {
    match (class, identity) {
        (PathClass::Unguarded, _) | (PathClass::Home | PathClass::Login, None) => BoundaryDecision::allow(),
        (PathClass::Home | PathClass::Login, Some(identity)) => {
            BoundaryDecision::redirect(identity.role.dashboard_path())
        }
        (PathClass::Dashboard { .. }, None) => BoundaryDecision::redirect(LOGIN_PATH),
        (PathClass::Dashboard { area: Some(area) }, Some(identity)) if !area.admits(identity.role) => {
            BoundaryDecision::redirect(identity.role.dashboard_path())
        }
        (PathClass::Dashboard { .. }, Some(_)) => BoundaryDecision::allow(),
    }
}

#[cfg(test)]
#[path = "boundary_test.rs"]
mod tests;
