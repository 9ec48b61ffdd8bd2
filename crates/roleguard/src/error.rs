//! Unified error type for roleguard.

use roleguard_protocol::ProtocolError;
use roleguard_session::{NavigationError, SessionError, StoreError};

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `roleguard` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoleguardError {
    /// A protocol-level error (malformed token, unknown role).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (store, notifier, navigation during logout).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The credential store failed outside a session check.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A navigation outside the invalidation flow was rejected.
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// The guard configuration couldn't be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors loading a [`GuardConfig`](crate::GuardConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidRole("Auditor".into());
        let top: RoleguardError = err.into();
        assert!(matches!(top, RoleguardError::Protocol(_)));
        assert!(top.to_string().contains("Auditor"));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::Store(StoreError::Unavailable("quota".into()));
        let top: RoleguardError = err.into();
        assert!(matches!(top, RoleguardError::Session(_)));
        assert!(top.to_string().contains("quota"));
    }

    #[test]
    fn test_from_navigation_error() {
        let err = NavigationError {
            path: "/dashboard/cliente".into(),
            reason: "router unmounted".into(),
        };
        let top: RoleguardError = err.into();
        assert!(matches!(top, RoleguardError::Navigation(_)));
    }

    #[test]
    fn test_from_config_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let top: RoleguardError = ConfigError::from(json_err).into();
        assert!(matches!(top, RoleguardError::Config(ConfigError::Json(_))));
    }
}
