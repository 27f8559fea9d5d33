//! Known-identity lookup.
//!
//! DESIGN
//! ======
//! Login resolves emails through the [`IdentityDirectory`] trait so the fixed
//! demo table can be swapped for a real credential backend without touching
//! the session or routing code.

use crate::identity::{Identity, Role};

/// Directory entry: an identity plus the password it was provisioned with.
#[derive(Clone, Debug)]
pub struct KnownIdentity {
    pub identity: Identity,
    pub password: String,
}

impl KnownIdentity {
    /// Drop the password and return the bare identity.
    #[must_use]
    pub fn into_identity(self) -> Identity {
        self.identity
    }
}

#[async_trait::async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Find an identity by email, case-insensitively.
    async fn find_by_email(&self, email: &str) -> Option<KnownIdentity>;
}

/// The fixed demo accounts.
#[derive(Clone, Debug)]
pub struct MockDirectory {
    entries: Vec<KnownIdentity>,
}

fn entry(id: &str, email: &str, password: &str, name: &str, role: Role, avatar: Option<&str>) -> KnownIdentity {
    KnownIdentity {
        identity: Identity {
            id: id.to_owned(),
            email: email.to_owned(),
            name: name.to_owned(),
            role,
            avatar: avatar.map(str::to_owned),
        },
        password: password.to_owned(),
    }
}

impl MockDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: vec![
                entry(
                    "1",
                    "ayu.wulandari@kinetic.co.id",
                    "password123",
                    "Ayu Wulandari",
                    Role::Patient,
                    Some("/smiling-brown-haired-woman.png"),
                ),
                entry(
                    "2",
                    "dr.budi.santoso@kinetic.co.id",
                    "doctor123",
                    "Dr. Budi Santoso",
                    Role::Provider,
                    Some("/caring-doctor.png"),
                ),
                entry("3", "admin@kinetic.co.id", "admin123", "Admin Kinetic", Role::Admin, None),
                entry(
                    "4",
                    "agus.pratama@kinetic.co.id",
                    "password123",
                    "Agus Pratama",
                    Role::Patient,
                    Some("/athletic-man-short-hair.png"),
                ),
                entry("5", "melati.sari@kinetic.co.id", "password123", "Melati Sari", Role::Patient, None),
                entry("6", "dr.lisa.tan@kinetic.co.id", "doctor123", "Dr. Lisa Tan", Role::Provider, None),
                entry(
                    "7",
                    "dr.wijaya@kinetic.co.id",
                    "provider",
                    "Dr. Wijaya Saputra",
                    Role::Provider,
                    Some("/older-man-glasses.png"),
                ),
            ],
        }
    }

    /// Build a directory from arbitrary entries.
    #[must_use]
    pub fn with_entries(entries: Vec<KnownIdentity>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[KnownIdentity] {
        &self.entries
    }
}

impl Default for MockDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IdentityDirectory for MockDirectory {
    async fn find_by_email(&self, email: &str) -> Option<KnownIdentity> {
        let needle = email.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.identity.email.to_lowercase() == needle)
            .cloned()
    }
}

#[cfg(test)]
#[path = "directory_test.rs"]
mod tests;
