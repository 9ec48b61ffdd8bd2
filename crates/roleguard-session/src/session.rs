//! Session types: what a check asks, and what it answers.
//!
//! A check is built from a [`SessionCheckContext`] (which roles the page
//! needs, where the user is) and answered with a [`SessionVerdict`]. The
//! verdict is consumed immediately: either the caller renders, or it hands
//! the verdict to [`SessionManager::handle_invalid_session`](crate::SessionManager::handle_invalid_session).

use std::fmt;
use std::time::Duration;

use roleguard_protocol::{LOGIN_ROUTE, RoleName};
use serde::{Deserialize, Serialize};

use crate::{Notice, Severity};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long (in milliseconds) the re-entrancy flag stays set after an
    /// invalidation flow ends. Checks during this window are skipped.
    ///
    /// Default: 1000.
    pub release_delay_ms: u64,

    /// Where invalidated users are sent.
    pub login_route: String,

    /// Title of the invalidation notice.
    pub notice_title: String,

    /// Label of the notice's acknowledge button.
    pub confirm_label: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            release_delay_ms: 1000,
            login_route: LOGIN_ROUTE.to_string(),
            notice_title: "Attention".to_string(),
            confirm_label: "Accept".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// SessionCheckContext
// ---------------------------------------------------------------------------

/// What a single check should verify beyond "is there a live session".
///
/// An empty `required_roles` means "any authenticated role". A missing
/// `current_path` skips the route-ownership check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCheckContext {
    pub required_roles: Vec<RoleName>,
    pub current_path: Option<String>,
}

impl SessionCheckContext {
    /// A bare check: credentials present and token not expired.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roles(mut self, roles: &[RoleName]) -> Self {
        self.required_roles = roles.to_vec();
        self
    }

    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.current_path = Some(path.into());
        self
    }
}

// ---------------------------------------------------------------------------
// InvalidReason
// ---------------------------------------------------------------------------

/// Why a session failed a check. Every reason is terminal for the current
/// navigation and resolved the same way (logout, notice, login redirect);
/// they differ only in the copy and severity shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvalidReason {
    NoAuth,
    TokenExpired,
    InsufficientPermissions,
    UnauthorizedRouteAccess,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAuth => "NO_AUTH",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::UnauthorizedRouteAccess => "UNAUTHORIZED_ROUTE_ACCESS",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// InvalidSession
// ---------------------------------------------------------------------------

/// A failed check: the reason plus the copy to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSession {
    pub reason: InvalidReason,
    pub message: String,
    pub severity: Severity,
}

impl InvalidSession {
    /// The standard copy and severity for `reason`.
    pub fn for_reason(reason: InvalidReason) -> Self {
        let (message, severity) = match reason {
            InvalidReason::NoAuth => (
                "You must log in to access this section.",
                Severity::Warning,
            ),
            InvalidReason::TokenExpired => (
                "Your session has expired. Please log in again.",
                Severity::Error,
            ),
            InvalidReason::InsufficientPermissions => (
                "You do not have permission to access this section.",
                Severity::Error,
            ),
            InvalidReason::UnauthorizedRouteAccess => (
                "Unauthorized access detected. Your session has been closed for security.",
                Severity::Error,
            ),
        };
        Self {
            reason,
            message: message.to_string(),
            severity,
        }
    }

    /// The notice presented for this failure, titled per `config`.
    pub fn notice(&self, config: &SessionConfig) -> Notice {
        Notice {
            title: config.notice_title.clone(),
            message: self.message.clone(),
            severity: self.severity,
            confirm_label: config.confirm_label.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionVerdict
// ---------------------------------------------------------------------------

/// The outcome of a session check.
///
/// ```text
///   Valid                      → render
///   Skipped                    → an invalidation is already in flight;
///                                do nothing visible
///   Invalid(reason, msg, sev)  → logout + notice + redirect
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionVerdict {
    Valid,
    Skipped,
    Invalid(InvalidSession),
}

impl SessionVerdict {
    pub fn invalid(reason: InvalidReason) -> Self {
        Self::Invalid(InvalidSession::for_reason(reason))
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// The failure reason, if this verdict is `Invalid`.
    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            Self::Invalid(invalid) => Some(invalid.reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_reason_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&InvalidReason::UnauthorizedRouteAccess).unwrap();
        assert_eq!(json, "\"UNAUTHORIZED_ROUTE_ACCESS\"");
        assert_eq!(InvalidReason::NoAuth.to_string(), "NO_AUTH");
    }

    #[test]
    fn test_for_reason_severities() {
        assert_eq!(InvalidSession::for_reason(InvalidReason::NoAuth).severity, Severity::Warning);
        for reason in [
            InvalidReason::TokenExpired,
            InvalidReason::InsufficientPermissions,
            InvalidReason::UnauthorizedRouteAccess,
        ] {
            assert_eq!(InvalidSession::for_reason(reason).severity, Severity::Error);
        }
    }

    #[test]
    fn test_notice_uses_config_labels() {
        let config = SessionConfig {
            notice_title: "Atención".into(),
            confirm_label: "Aceptar".into(),
            ..SessionConfig::default()
        };
        let notice = InvalidSession::for_reason(InvalidReason::TokenExpired).notice(&config);

        assert_eq!(notice.title, "Atención");
        assert_eq!(notice.confirm_label, "Aceptar");
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.contains("expired"));
    }

    #[test]
    fn test_verdict_reason_only_for_invalid() {
        assert_eq!(SessionVerdict::Valid.reason(), None);
        assert_eq!(SessionVerdict::Skipped.reason(), None);
        assert_eq!(
            SessionVerdict::invalid(InvalidReason::NoAuth).reason(),
            Some(InvalidReason::NoAuth)
        );
    }

    #[test]
    fn test_session_config_partial_json_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"release_delay_ms": 250}"#).unwrap();
        assert_eq!(config.release_delay(), Duration::from_millis(250));
        assert_eq!(config.login_route, "/login");
    }

    #[test]
    fn test_check_context_builder() {
        let ctx = SessionCheckContext::new()
            .with_roles(&[RoleName::Cliente])
            .at_path("/dashboard/cliente/tasks");
        assert_eq!(ctx.required_roles, vec![RoleName::Cliente]);
        assert_eq!(ctx.current_path.as_deref(), Some("/dashboard/cliente/tasks"));
    }
}
