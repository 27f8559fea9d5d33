//! Shared domain model for the Kinetic portal.
//!
//! This crate owns identity, session, and routing rules used by both `server`
//! and `cli`. Nothing here knows about HTTP transport: the server maps the
//! decisions onto responses, the CLI maps them onto terminal output.

pub mod boundary;
pub mod cookie;
pub mod credentials;
pub mod directory;
pub mod guard;
pub mod identity;
pub mod pose;
pub mod session;
pub mod storage;

/// Storage key and cookie name carrying the serialized [`identity::Identity`].
pub const SESSION_KEY: &str = "kineticUser";

/// Generic login surface.
pub const LOGIN_PATH: &str = "/login";
