//! Server configuration parsed from environment variables.

use std::time::Duration;

use portal::credentials::{DEFAULT_LOGIN_DELAY, PasswordPolicy};
use portal::pose::AnalysisTiming;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_POSE_STUDIOS: usize = 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub cookie_secure: bool,
    pub login_delay: Duration,
    pub password_policy: PasswordPolicy,
    pub pose_timing: AnalysisTiming,
    /// Live pose studios kept before the least recently used one is dropped.
    pub max_pose_studios: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cookie_secure: false,
            login_delay: DEFAULT_LOGIN_DELAY,
            password_policy: PasswordPolicy::Trust,
            pose_timing: AnalysisTiming::default(),
            max_pose_studios: DEFAULT_MAX_POSE_STUDIOS,
        }
    }
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `COOKIE_SECURE`: mark the session cookie `Secure` (default false)
    /// - `LOGIN_DELAY_MS`: artificial login latency, default 500
    /// - `STRICT_PASSWORDS`: verify passwords of known accounts (default false)
    /// - `POSE_ANALYSIS_BASE_MS`: default 3000
    /// - `POSE_ANALYSIS_JITTER_MS`: default 1000
    /// - `MAX_POSE_STUDIOS`: default 1024, at least 1
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a set variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a set variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port = parse_or("PORT", lookup("PORT"), defaults.port)?;
        let cookie_secure = bool_or("COOKIE_SECURE", lookup("COOKIE_SECURE"), defaults.cookie_secure)?;
        let login_delay = millis_or("LOGIN_DELAY_MS", lookup("LOGIN_DELAY_MS"), defaults.login_delay)?;
        let password_policy = if bool_or("STRICT_PASSWORDS", lookup("STRICT_PASSWORDS"), false)? {
            PasswordPolicy::Verify
        } else {
            PasswordPolicy::Trust
        };
        let pose_timing = AnalysisTiming {
            base: millis_or("POSE_ANALYSIS_BASE_MS", lookup("POSE_ANALYSIS_BASE_MS"), defaults.pose_timing.base)?,
            jitter: millis_or("POSE_ANALYSIS_JITTER_MS", lookup("POSE_ANALYSIS_JITTER_MS"), defaults.pose_timing.jitter)?,
        };

        let max_pose_studios = parse_or("MAX_POSE_STUDIOS", lookup("MAX_POSE_STUDIOS"), defaults.max_pose_studios)?;
        if max_pose_studios == 0 {
            return Err(ConfigError::Invalid { key: "MAX_POSE_STUDIOS", value: lookup("MAX_POSE_STUDIOS").unwrap_or_default() });
        }

        Ok(Self { port, cookie_secure, login_delay, password_policy, pose_timing, max_pose_studios })
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn bool_or(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid { key, value }),
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn millis_or(key: &'static str, raw: Option<String>, default: Duration) -> Result<Duration, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => parse_or::<u64>(key, Some(value), 0).map(Duration::from_millis),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
