//! Mock credential resolution shared by the session store and the HTTP login.
//!
//! DESIGN
//! ======
//! Emails found in the directory resolve to the stored identity. Unknown
//! emails with a non-empty password synthesize a fresh identity whose role is
//! inferred from the email (or the portal the user logged in through).
//!
//! TRADE-OFFS
//! ==========
//! Under [`PasswordPolicy::Trust`] the submitted password is ignored for
//! directory matches. That mirrors the demo portal and is not a security
//! property; [`PasswordPolicy::Verify`] exists for anything closer to real.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::directory::IdentityDirectory;
use crate::identity::{Identity, Role};

/// Substrings of a lower-cased email that mark a provider account.
pub const PROVIDER_MARKERS: [&str; 6] = ["provider", "doctor", "dr.", "clinic", "physio", "therapist"];

pub const PROVIDER_AVATAR: &str = "/caring-doctor.png";
pub const PATIENT_AVATAR: &str = "/smiling-brown-haired-woman.png";

/// Default artificial latency before a login resolves.
pub const DEFAULT_LOGIN_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Please enter valid credentials")]
    InvalidCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordPolicy {
    /// Directory matches succeed regardless of the submitted password.
    #[default]
    Trust,
    /// Directory matches require the stored password.
    Verify,
}

/// Resolves submitted credentials into an [`Identity`].
#[derive(Clone)]
pub struct Authenticator {
    directory: Arc<dyn IdentityDirectory>,
    policy: PasswordPolicy,
    delay: Duration,
}

impl Authenticator {
    #[must_use]
    pub fn new(directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { directory, policy: PasswordPolicy::default(), delay: DEFAULT_LOGIN_DELAY }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn policy(&self) -> PasswordPolicy {
        self.policy
    }

    /// Resolve `email`/`password` after the configured delay.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the email is unknown and
    /// either field is empty, or when [`PasswordPolicy::Verify`] rejects the
    /// password of a known account.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        intended_role: Option<Role>,
    ) -> Result<Identity, AuthError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(known) = self.directory.find_by_email(email).await {
            if self.policy == PasswordPolicy::Verify && known.password != password {
                debug!(email, "password rejected for known account");
                return Err(AuthError::InvalidCredentials);
            }
            info!(id = %known.identity.id, role = %known.identity.role, "login matched known account");
            return Ok(known.into_identity());
        }

        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = synthesize_identity(email, intended_role, now_millis());
        info!(id = %identity.id, role = %identity.role, "login synthesized new account");
        Ok(identity)
    }
}

/// Build an identity for an email the directory does not know.
#[must_use]
pub fn synthesize_identity(email: &str, intended_role: Option<Role>, id_millis: i128) -> Identity {
    let role = infer_role(email, intended_role);
    let avatar = match role {
        Role::Provider => PROVIDER_AVATAR,
        Role::Patient | Role::Admin => PATIENT_AVATAR,
    };
    Identity {
        id: id_millis.to_string(),
        email: email.to_owned(),
        name: display_name_from_email(email),
        role,
        avatar: Some(avatar.to_owned()),
    }
}

/// `provider` if requested explicitly or hinted by the email, else `patient`.
#[must_use]
pub fn infer_role(email: &str, intended_role: Option<Role>) -> Role {
    let lowered = email.to_lowercase();
    if intended_role == Some(Role::Provider) || PROVIDER_MARKERS.iter().any(|m| lowered.contains(m)) {
        Role::Provider
    } else {
        Role::Patient
    }
}

/// `dr.siti@x` -> `Dr Siti`: split the local part on `.` and capitalize each piece.
#[must_use]
pub fn display_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    local.split('.').map(capitalize_first).collect::<Vec<_>>().join(" ")
}

fn capitalize_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn now_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
