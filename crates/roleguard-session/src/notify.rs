//! The user-notification hook.
//!
//! Invalidating a session is the one place where user interaction gates
//! control flow: the notice must be acknowledged before the redirect to
//! login happens. The [`Notifier`] trait is that seam: a modal dialog in a
//! UI, a log line in a headless process, a recorder in tests.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::NotifyError;

/// How alarming a notice is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

/// A message presented to the user, resolved when acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub confirm_label: String,
}

/// Presents a notice and waits for the user to acknowledge it.
///
/// The method returns `impl Future + Send`, so implementors can write
/// `async fn` and the manager stays usable from spawned tasks.
pub trait Notifier: Send + Sync + 'static {
    /// Shows `notice`; the future resolves once it has been acknowledged.
    ///
    /// # Errors
    /// Returns [`NotifyError`] if the notice couldn't be presented.
    fn notify(
        &self,
        notice: &Notice,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

/// Logs the notice and acknowledges it immediately.
///
/// For headless processes where nobody is there to click "Accept".
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        match notice.severity {
            Severity::Error => tracing::error!(title = %notice.title, "{}", notice.message),
            Severity::Warning => tracing::warn!(title = %notice.title, "{}", notice.message),
            Severity::Info => tracing::info!(title = %notice.title, "{}", notice.message),
        }
        Ok(())
    }
}

/// Keeps every notice it was asked to show. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    shown: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notice shown so far, oldest first.
    pub fn shown(&self) -> Vec<Notice> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.shown.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
        Ok(())
    }
}
