//! Error types for the session layer.

/// Errors surfaced by [`SessionManager`](crate::SessionManager).
///
/// None of these are retried. A failure inside the invalidation flow is
/// reported to the caller after the re-entrancy flag has been scheduled
/// for release, so a broken collaborator can't wedge later checks.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or clearing the credential store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The notice could not be shown or acknowledged.
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// Navigating to the login route failed.
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// Errors from a [`CredentialStore`](crate::CredentialStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing storage can't be reached (quota, permissions, gone).
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    /// A persisted user record isn't valid JSON.
    #[error("stored user record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A notifier failed to present or resolve a notice.
#[derive(Debug, thiserror::Error)]
#[error("notice could not be shown: {0}")]
pub struct NotifyError(pub String);

/// A navigation request was rejected.
#[derive(Debug, thiserror::Error)]
#[error("navigation to {path} failed: {reason}")]
pub struct NavigationError {
    pub path: String,
    pub reason: String,
}
