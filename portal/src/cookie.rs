//! The `kineticUser` cookie mirror of the session.
//!
//! The cookie lets the boundary check read session state before any client
//! code runs. It carries the same serialized identity as local storage.

use time::Duration;

use crate::SESSION_KEY;
use crate::identity::Identity;

/// Lifetime of the session cookie after login.
pub const SESSION_COOKIE_MAX_AGE: Duration = Duration::hours(24);

/// Date used to expire the cookie on logout.
pub const EXPIRED_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: &'static str,
    pub value: String,
    pub path: &'static str,
    /// `None` marks an already-expired (deleting) cookie.
    pub max_age: Option<Duration>,
}

impl SessionCookie {
    /// Cookie written on login.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity cannot be serialized.
    pub fn for_identity(identity: &Identity) -> Result<Self, serde_json::Error> {
        Ok(Self { name: SESSION_KEY, value: identity.to_persisted()?, path: "/", max_age: Some(SESSION_COOKIE_MAX_AGE) })
    }

    /// Cookie written on logout to delete the session cookie.
    #[must_use]
    pub fn expired() -> Self {
        Self { name: SESSION_KEY, value: String::new(), path: "/", max_age: None }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.max_age.is_none()
    }

    /// Render as a `document.cookie` / `Set-Cookie` string.
    #[must_use]
    pub fn header_value(&self) -> String {
        match self.max_age {
            Some(age) => format!("{}={}; path={}; max-age={}", self.name, self.value, self.path, age.whole_seconds()),
            None => format!("{}=; path={}; expires={EXPIRED_DATE}", self.name, self.path),
        }
    }
}

#[cfg(test)]
#[path = "cookie_test.rs"]
mod tests;
