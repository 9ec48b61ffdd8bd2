//! Per-route role guard.
//!
//! Wraps one protected element. Every time the path or the allowed roles
//! change, the host calls [`RoleGuard::check`]; until the check resolves
//! the guard shows a loading view, and it only ever renders the element
//! after a `Valid` verdict.
//!
//! ```text
//!   Checking ──Valid──────────────────→ Authorized  (Render)
//!      │
//!      └──Invalid / Skipped / error──→ Redirecting (Redirect to login)
//! ```

use std::sync::Arc;

use roleguard_protocol::RoleName;
use roleguard_session::{
    AuthState, CredentialStore, Notifier, SessionCheckContext, SessionManager, SessionVerdict,
};

/// Where a role guard is in its check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGuardState {
    Checking,
    Authorized,
    Redirecting,
}

/// What the host should display for a guarded route.
#[derive(Debug, PartialEq, Eq)]
pub enum View<'a, E> {
    /// A check is in progress.
    Loading,
    /// Access granted; show the element.
    Render(&'a E),
    /// Access denied; replace the current entry with this path.
    Redirect(&'a str),
}

pub struct RoleGuard<E, S: CredentialStore, N: Notifier> {
    element: E,
    allowed_roles: Vec<RoleName>,
    state: RoleGuardState,
    manager: Arc<SessionManager<S, N>>,
    auth: Arc<AuthState>,
}

impl<E, S: CredentialStore, N: Notifier> RoleGuard<E, S, N> {
    pub fn new(
        manager: Arc<SessionManager<S, N>>,
        auth: Arc<AuthState>,
        element: E,
        allowed_roles: &[RoleName],
    ) -> Self {
        Self {
            element,
            allowed_roles: allowed_roles.to_vec(),
            state: RoleGuardState::Checking,
            manager,
            auth,
        }
    }

    pub fn state(&self) -> RoleGuardState {
        self.state
    }

    pub fn allowed_roles(&self) -> &[RoleName] {
        &self.allowed_roles
    }

    /// Replaces the allowed roles. The guard goes back to `Checking`; call
    /// [`check`](Self::check) again to resolve it.
    pub fn set_allowed_roles(&mut self, allowed_roles: &[RoleName]) {
        self.allowed_roles = allowed_roles.to_vec();
        self.state = RoleGuardState::Checking;
    }

    /// Runs the session check for `current_path` and settles the state.
    ///
    /// On an invalid verdict the guard runs the invalidation flow and
    /// settles on `Redirecting`. The flow's own navigation is a no-op: the
    /// redirect is expressed by [`view`](Self::view).
    pub async fn check(&mut self, current_path: &str) -> RoleGuardState {
        let context = SessionCheckContext::new()
            .with_roles(&self.allowed_roles)
            .at_path(current_path);

        self.state = match self.manager.check_session(&context) {
            Ok(SessionVerdict::Valid) => RoleGuardState::Authorized,
            Ok(SessionVerdict::Skipped) => {
                tracing::debug!(path = current_path, "check skipped, redirecting");
                RoleGuardState::Redirecting
            }
            Ok(verdict) => {
                let auth = &self.auth;
                if let Err(e) = self
                    .manager
                    .handle_invalid_session(&verdict, || auth.logout(), |_| Ok(()))
                    .await
                {
                    tracing::warn!(error = %e, path = current_path, "session invalidation failed");
                }
                RoleGuardState::Redirecting
            }
            Err(e) => {
                tracing::warn!(error = %e, path = current_path, "session check failed");
                RoleGuardState::Redirecting
            }
        };
        self.state
    }

    pub fn view(&self) -> View<'_, E> {
        match self.state {
            RoleGuardState::Checking => View::Loading,
            RoleGuardState::Authorized => View::Render(&self.element),
            RoleGuardState::Redirecting => View::Redirect(&self.manager.config().login_route),
        }
    }
}
