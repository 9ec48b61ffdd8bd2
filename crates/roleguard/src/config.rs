//! Guard configuration, loadable from JSON.

use std::path::Path;

use roleguard_protocol::{LOGIN_ROUTE, RoleRouteTable, SharedRoute};
use roleguard_session::SessionConfig;
use roleguard_tick::PollConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Routes that never trigger a session check.
pub const DEFAULT_PUBLIC_ROUTES: [&str; 5] = [
    "/login",
    "/register",
    "/verify-email",
    "/forgot-password",
    "/reset-password",
];

/// Everything the guards need to know, in one place.
///
/// Missing fields fall back to their defaults, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Seconds between background expiry checks. Default: 30.
    pub poll_interval_secs: u64,

    /// Milliseconds the re-entrancy flag stays set after an invalidation
    /// flow ends. Default: 1000.
    pub release_delay_ms: u64,

    /// Where invalidated users are sent. Default: `/login`.
    pub login_route: String,

    /// Paths the route-change guard lets through unchecked.
    pub public_routes: Vec<String>,

    /// Pages opened to roles other than the one owning the prefix.
    pub shared_routes: Vec<SharedRoute>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            poll_interval_secs: PollConfig::default().interval_secs,
            release_delay_ms: session.release_delay_ms,
            login_route: LOGIN_ROUTE.to_string(),
            public_routes: DEFAULT_PUBLIC_ROUTES.iter().map(|r| r.to_string()).collect(),
            shared_routes: RoleRouteTable::default_shared_routes(),
        }
    }
}

impl GuardConfig {
    /// # Errors
    /// Returns [`ConfigError::Json`] if `json` isn't a valid config object.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str::<Self>(json)?.validated())
    }

    /// # Errors
    /// Returns [`ConfigError::Io`] if the file can't be read, or
    /// [`ConfigError::Json`] if its contents aren't a valid config.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loaded guard config");
        Self::from_json_str(&raw)
    }

    /// Fix out-of-range values. A zero poll interval becomes one second.
    pub fn validated(mut self) -> Self {
        self.poll_interval_secs = PollConfig::with_interval_secs(self.poll_interval_secs)
            .validated()
            .interval_secs;
        self
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            release_delay_ms: self.release_delay_ms,
            login_route: self.login_route.clone(),
            ..SessionConfig::default()
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig::with_interval_secs(self.poll_interval_secs)
    }

    pub fn route_table(&self) -> RoleRouteTable {
        RoleRouteTable::with_shared_routes(self.shared_routes.clone())
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_routes.iter().any(|route| route == path)
    }
}
