//! The session manager: one per application, shared by every guard.
//!
//! It's responsible for:
//! - Answering session checks (delegating to [`SessionValidator`])
//! - Running the invalidation flow: clear credentials, reset auth state,
//!   show the notice, redirect to login
//! - Making sure only one invalidation flow runs at a time
//!
//! # The re-entrancy flag
//!
//! Several guards can notice the same dead session at nearly the same
//! moment: a route change and the expiry timer, say. Without coordination
//! each would log out, show a dialog, and redirect. The manager holds a
//! single flag:
//!
//! ```text
//!   idle ──(handle_invalid_session)──→ handling ──(flow ends)──→ cooldown
//!    ↑                                                             │
//!    └──────────────────(release delay elapses)────────────────────┘
//! ```
//!
//! While the flag is set, `check_session` answers [`SessionVerdict::Skipped`]
//! and `handle_invalid_session` is a silent no-op. The flag is held by a
//! [`HandlingLease`]; dropping the lease (on success, error, or panic)
//! schedules the release, so a failing collaborator can't leave it stuck.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use roleguard_protocol::{RoleRouteTable, TokenCodec, UserRecord};

use crate::{
    CredentialStore, NavigationError, Notifier, SessionCheckContext, SessionConfig, SessionError,
    SessionValidator, SessionVerdict,
};

/// Orchestrates checks and the invalidation flow.
///
/// Construct once at startup and share with `Arc`.
pub struct SessionManager<S: CredentialStore, N: Notifier> {
    store: S,
    notifier: N,
    validator: SessionValidator,
    config: SessionConfig,
    /// `true` while an invalidation flow is running or cooling down.
    handling: Arc<AtomicBool>,
}

impl<S: CredentialStore, N: Notifier> SessionManager<S, N> {
    /// A manager using the system clock, default config, and the
    /// application's shared-route grants.
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            validator: SessionValidator::new(
                TokenCodec::system(),
                RoleRouteTable::with_shared_routes(RoleRouteTable::default_shared_routes()),
            ),
            config: SessionConfig::default(),
            handling: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_codec(mut self, codec: TokenCodec) -> Self {
        self.validator = SessionValidator::new(codec, self.validator.routes().clone());
        self
    }

    pub fn with_routes(mut self, routes: RoleRouteTable) -> Self {
        self.validator = SessionValidator::new(self.validator.codec().clone(), routes);
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn codec(&self) -> &TokenCodec {
        self.validator.codec()
    }

    /// Returns `true` while an invalidation flow is running or within its
    /// release delay.
    pub fn is_handling_session(&self) -> bool {
        self.handling.load(Ordering::SeqCst)
    }

    /// Checks the stored session against `context`.
    ///
    /// Returns [`SessionVerdict::Skipped`] without touching the store while
    /// an invalidation is in flight.
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] if credentials can't be read.
    pub fn check_session(
        &self,
        context: &SessionCheckContext,
    ) -> Result<SessionVerdict, SessionError> {
        if self.is_handling_session() {
            tracing::debug!("session check skipped: invalidation in flight");
            return Ok(SessionVerdict::Skipped);
        }

        let verdict = self.validator.check(context, &self.store)?;
        match &verdict {
            SessionVerdict::Invalid(invalid) => tracing::info!(
                reason = %invalid.reason,
                path = context.current_path.as_deref().unwrap_or(""),
                "session check failed"
            ),
            _ => tracing::debug!(
                path = context.current_path.as_deref().unwrap_or(""),
                "session check passed"
            ),
        }
        Ok(verdict)
    }

    /// The canonical route of the stored user, or `/login` if there is none.
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] if the user can't be read.
    pub fn route_for_current_user(&self) -> Result<&'static str, SessionError> {
        let role = self.store.user()?.as_ref().and_then(UserRecord::role);
        Ok(RoleRouteTable::route_for(role))
    }

    /// Invalidates the session described by `verdict`.
    ///
    /// In order: clear the credential store, call `on_logout` (reset
    /// in-memory auth state), show the verdict's notice and wait for it to
    /// be acknowledged, then call `on_navigate` with the login route.
    ///
    /// Does nothing for `Valid` or `Skipped` verdicts, or if another flow
    /// already holds the flag.
    ///
    /// # Errors
    /// The first failing step's error. Later steps don't run; the flag is
    /// released on schedule regardless.
    pub async fn handle_invalid_session<L, F>(
        &self,
        verdict: &SessionVerdict,
        on_logout: L,
        on_navigate: F,
    ) -> Result<(), SessionError>
    where
        L: FnOnce() + Send,
        F: FnOnce(&str) -> Result<(), NavigationError> + Send,
    {
        let SessionVerdict::Invalid(invalid) = verdict else {
            return Ok(());
        };
        let Some(_lease) = self.try_acquire() else {
            tracing::debug!(reason = %invalid.reason, "invalidation already in flight");
            return Ok(());
        };

        tracing::info!(reason = %invalid.reason, "invalidating session");

        self.store.clear()?;
        on_logout();

        if !invalid.message.is_empty() {
            self.notifier.notify(&invalid.notice(&self.config)).await?;
        }

        on_navigate(&self.config.login_route)?;
        tracing::info!(to = %self.config.login_route, "redirected to login");
        Ok(())
    }

    fn try_acquire(&self) -> Option<HandlingLease> {
        self.handling
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| HandlingLease {
                flag: Arc::clone(&self.handling),
                release_after: self.config.release_delay(),
            })
    }
}

/// Holds the re-entrancy flag for one invalidation flow.
///
/// Dropping it schedules the flag's release `release_after` from the moment
/// of the drop. Since `Drop` is synchronous, the wait runs on a
/// fire-and-forget task; with no runtime available the flag is released
/// immediately.
struct HandlingLease {
    flag: Arc<AtomicBool>,
    release_after: Duration,
}

impl Drop for HandlingLease {
    fn drop(&mut self) {
        let flag = Arc::clone(&self.flag);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let deadline = tokio::time::Instant::now() + self.release_after;
                runtime.spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    flag.store(false, Ordering::SeqCst);
                    tracing::debug!("session handling flag released");
                });
            }
            Err(_) => flag.store(false, Ordering::SeqCst),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
