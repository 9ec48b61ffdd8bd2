//! The navigation hook.
//!
//! Guards decide *where* the user should be; a [`Navigator`] is how they
//! get there. In a UI it wraps the router; headless hosts and tests use
//! [`RecordingNavigator`].

use std::sync::{Arc, Mutex, PoisonError};

use roleguard_session::NavigationError;

/// Options for a single navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

impl NavigateOptions {
    pub fn replace() -> Self {
        Self { replace: true }
    }
}

/// Moves the user to another path.
pub trait Navigator: Send + Sync + 'static {
    /// # Errors
    /// Returns [`NavigationError`] if the router refused the request.
    fn navigate(&self, path: &str, options: NavigateOptions) -> Result<(), NavigationError>;
}

/// One recorded navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
    pub replace: bool,
}

/// Records every navigation and tracks the current path. Clones share
/// history.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    history: Arc<Mutex<Vec<Navigation>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every navigation so far, oldest first.
    pub fn history(&self) -> Vec<Navigation> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The path of the latest navigation, if any.
    pub fn current(&self) -> Option<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|nav| nav.path.clone())
    }

    pub fn count(&self) -> usize {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str, options: NavigateOptions) -> Result<(), NavigationError> {
        tracing::debug!(path, replace = options.replace, "navigate");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Navigation {
                path: path.to_string(),
                replace: options.replace,
            });
        Ok(())
    }
}
