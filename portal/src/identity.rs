//! Authenticated principal and its role.

use serde::{Deserialize, Serialize};

use crate::SESSION_KEY;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Provider,
    Admin,
}

impl Role {
    /// Dashboard an identity with this role lands on.
    ///
    /// Only providers have a dashboard of their own; everyone else is sent to
    /// the patient dashboard.
    #[must_use]
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Self::Provider => "/dashboard/provider",
            Self::Patient | Self::Admin => "/dashboard/patient",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Provider => "provider",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Self::Patient),
            "provider" => Ok(Self::Provider),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Role-tagged profile of the logged-in user. Never carries a password.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Identity {
    /// Serialize into the persisted `kineticUser` representation.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_persisted(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a persisted `kineticUser` value.
    ///
    /// # Errors
    ///
    /// Returns [`CorruptSession`] when the value is not a valid identity,
    /// including an unknown role.
    pub fn from_persisted(raw: &str) -> Result<Self, CorruptSession> {
        serde_json::from_str(raw).map_err(|e| CorruptSession { key: SESSION_KEY, reason: e.to_string() })
    }
}

/// A stored or cookie value that failed to deserialize into an [`Identity`].
///
/// Always repaired silently by discarding the record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("corrupt session record `{key}`: {reason}")]
pub struct CorruptSession {
    pub key: &'static str,
    pub reason: String,
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
