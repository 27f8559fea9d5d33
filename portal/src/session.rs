//! Session store: the single authority for "who is logged in".
//!
//! LIFECYCLE
//! =========
//! 1. `SessionStore::new` wires storage, cookie jar and authenticator. The
//!    session starts in the loading state.
//! 2. `initialize` rehydrates the persisted identity once. Loading turns
//!    false and stays false for the life of the store.
//! 3. `login` / `logout` write through to storage and publish the new session
//!    to every subscriber.
//! 4. Dropping the store drops the channel; subscribers see it close.
//!
//! ERROR HANDLING
//! ==============
//! A persisted record that does not parse is a consistency problem, not a
//! user error: it is removed and the session continues unauthenticated.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::cookie::SessionCookie;
use crate::credentials::{AuthError, Authenticator};
use crate::identity::{Identity, Role};
use crate::storage::{CookieMirror, KeyValueStore, StorageError};
use crate::{LOGIN_PATH, SESSION_KEY};

/// Current identity plus the one-time loading flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub identity: Option<Identity>,
    pub loading: bool,
}

impl Session {
    /// State before rehydration has run.
    #[must_use]
    pub fn loading() -> Self {
        Self { identity: None, loading: true }
    }

    /// A settled session for `identity`.
    #[must_use]
    pub fn settled(identity: Option<Identity>) -> Self {
        Self { identity, loading: false }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to serialize identity: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct SessionStore {
    local: Arc<dyn KeyValueStore>,
    cookies: Arc<dyn CookieMirror>,
    authenticator: Authenticator,
    state: watch::Sender<Session>,
}

impl SessionStore {
    #[must_use]
    pub fn new(local: Arc<dyn KeyValueStore>, cookies: Arc<dyn CookieMirror>, authenticator: Authenticator) -> Self {
        let (state, _) = watch::channel(Session::loading());
        Self { local, cookies, authenticator, state }
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Rehydrate from local storage. Only the first call does any work.
    pub fn initialize(&self) -> Session {
        if !self.state.borrow().loading {
            return self.session();
        }

        let identity = self.read_persisted();
        self.state.send_if_modified(|s| {
            if !s.loading {
                return false;
            }
            s.identity = identity;
            s.loading = false;
            true
        });

        let session = self.session();
        info!(authenticated = session.is_authenticated(), "session initialized");
        session
    }

    fn read_persisted(&self) -> Option<Identity> {
        let raw = match self.local.get(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "failed to read persisted session");
                return None;
            }
        };

        match Identity::from_persisted(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!(error = %e, "discarding corrupt persisted session");
                if let Err(e) = self.local.remove(SESSION_KEY) {
                    warn!(error = %e, "failed to remove corrupt session record");
                }
                None
            }
        }
    }

    /// Authenticate and persist the resulting identity.
    ///
    /// Settles the session: a later [`Self::initialize`] is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Auth`] for rejected credentials and
    /// [`SessionError::Storage`] when the identity cannot be persisted.
    pub async fn login(&self, email: &str, password: &str, intended_role: Option<Role>) -> Result<Identity, SessionError> {
        let identity = self.authenticator.authenticate(email, password, intended_role).await?;

        self.local.set(SESSION_KEY, &identity.to_persisted()?)?;
        self.cookies.write_cookie(&SessionCookie::for_identity(&identity)?)?;

        let published = identity.clone();
        self.state.send_modify(|s| {
            s.identity = Some(published);
            s.loading = false;
        });
        Ok(identity)
    }

    /// Clear the persisted identity and return the path callers navigate to.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] when storage cannot be cleared.
    pub fn logout(&self) -> Result<&'static str, SessionError> {
        self.local.remove(SESSION_KEY)?;
        self.cookies.write_cookie(&SessionCookie::expired())?;
        self.state.send_modify(|s| {
            s.identity = None;
            s.loading = false;
        });
        info!("session cleared");
        Ok(LOGIN_PATH)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
