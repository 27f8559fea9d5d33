//! Route guard for role-specific dashboard areas.
//!
//! SYSTEM CONTEXT
//! ==============
//! Evaluated on every navigation (and whenever the session changes) before a
//! protected view renders. The boundary check in [`crate::boundary`] applies
//! the same rules from the cookie alone.

use tokio::sync::watch;

use crate::identity::Role;
use crate::session::Session;

/// A role-gated dashboard area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Area {
    Patient,
    Provider,
}

impl Area {
    /// Area whose dashboard is the role's own dashboard.
    #[must_use]
    pub fn of_role(role: Role) -> Self {
        match role {
            Role::Provider => Self::Provider,
            Role::Patient | Role::Admin => Self::Patient,
        }
    }

    /// Area for `/dashboard/<area>` and anything below it.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let rest = path.strip_prefix("/dashboard/")?;
        match rest.split('/').next() {
            Some("patient") => Some(Self::Patient),
            Some("provider") => Some(Self::Provider),
            _ => None,
        }
    }

    #[must_use]
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Self::Patient => Role::Patient.dashboard_path(),
            Self::Provider => Role::Provider.dashboard_path(),
        }
    }

    /// Role-specific login surface for this area.
    #[must_use]
    pub fn login_path(self) -> &'static str {
        match self {
            Self::Patient => "/login/patient",
            Self::Provider => "/login/provider",
        }
    }

    #[must_use]
    pub fn admits(self, role: Role) -> bool {
        Self::of_role(role) == self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Unauthenticated,
    AuthenticatedMatchingRole,
    AuthenticatedWrongRole,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still loading: render nothing and decide later.
    Pending,
    Render,
    RedirectToLogin(&'static str),
    RedirectToOwnDashboard(&'static str),
}

impl GuardDecision {
    #[must_use]
    pub fn redirect_target(self) -> Option<&'static str> {
        match self {
            Self::RedirectToLogin(path) | Self::RedirectToOwnDashboard(path) => Some(path),
            Self::Pending | Self::Render => None,
        }
    }
}

#[must_use]
pub fn classify(session: &Session, area: Area) -> GuardState {
    if session.loading {
        return GuardState::Loading;
    }
    match &session.identity {
        None => GuardState::Unauthenticated,
        Some(identity) if area.admits(identity.role) => GuardState::AuthenticatedMatchingRole,
        Some(_) => GuardState::AuthenticatedWrongRole,
    }
}

#[must_use]
pub fn evaluate(session: &Session, area: Area) -> GuardDecision {
    match classify(session, area) {
        GuardState::Loading => GuardDecision::Pending,
        GuardState::Unauthenticated => GuardDecision::RedirectToLogin(area.login_path()),
        GuardState::AuthenticatedMatchingRole => GuardDecision::Render,
        GuardState::AuthenticatedWrongRole => {
            let role = session.identity.as_ref().map_or(Role::Patient, |i| i.role);
            GuardDecision::RedirectToOwnDashboard(role.dashboard_path())
        }
    }
}

/// Guard bound to one area.
#[derive(Clone, Copy, Debug)]
pub struct RouteGuard {
    area: Area,
}

impl RouteGuard {
    #[must_use]
    pub fn new(area: Area) -> Self {
        Self { area }
    }

    #[must_use]
    pub fn area(&self) -> Area {
        self.area
    }

    #[must_use]
    pub fn evaluate(&self, session: &Session) -> GuardDecision {
        evaluate(session, self.area)
    }

    /// Wait until the session has loaded, then decide.
    ///
    /// Stays [`GuardDecision::Pending`] if the session store goes away first.
    pub async fn settle(&self, sessions: &mut watch::Receiver<Session>) -> GuardDecision {
        match sessions.wait_for(|s| !s.loading).await {
            Ok(session) => evaluate(&session, self.area),
            Err(_) => GuardDecision::Pending,
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
