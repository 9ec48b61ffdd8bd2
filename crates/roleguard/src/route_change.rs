//! Global route-change guard.
//!
//! Runs on every path change, independently of any per-route
//! [`RoleGuard`](crate::RoleGuard). It catches two things:
//! an authenticated user typing another role's dashboard URL, and an
//! authenticated user landing on `/`.

use std::sync::Arc;

use roleguard_protocol::RoleRouteTable;
use roleguard_session::{
    AuthState, CredentialStore, InvalidReason, Notifier, SessionCheckContext, SessionManager,
};

use crate::config::DEFAULT_PUBLIC_ROUTES;
use crate::{NavigateOptions, Navigator, RoleguardError};

/// What the guard did for a path change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// A public route; nothing was checked.
    Public,
    /// Nothing to do.
    Allowed,
    /// The user was sent to their own dashboard (history entry replaced).
    Redirected(String),
    /// Unauthorized route access: the session was invalidated.
    LoggedOut,
}

pub struct RouteChangeGuard<S: CredentialStore, N: Notifier, V: Navigator> {
    manager: Arc<SessionManager<S, N>>,
    auth: Arc<AuthState>,
    navigator: Arc<V>,
    public_routes: Vec<String>,
}

impl<S: CredentialStore, N: Notifier, V: Navigator> RouteChangeGuard<S, N, V> {
    pub fn new(manager: Arc<SessionManager<S, N>>, auth: Arc<AuthState>, navigator: Arc<V>) -> Self {
        Self {
            manager,
            auth,
            navigator,
            public_routes: DEFAULT_PUBLIC_ROUTES.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn with_public_routes(mut self, public_routes: Vec<String>) -> Self {
        self.public_routes = public_routes;
        self
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_routes.iter().any(|route| route == path)
    }

    /// Reacts to the user arriving at `path`.
    ///
    /// # Errors
    /// Store failures during the check, and any failure inside the
    /// invalidation flow or the `/` redirect.
    pub async fn on_path_change(&self, path: &str) -> Result<RouteDecision, RoleguardError> {
        if self.is_public(path) {
            tracing::trace!(path, "public route");
            return Ok(RouteDecision::Public);
        }
        if !self.auth.is_authenticated() {
            return Ok(RouteDecision::Allowed);
        }

        if RoleRouteTable::is_dashboard_path(path) {
            let verdict = self
                .manager
                .check_session(&SessionCheckContext::new().at_path(path))?;

            if verdict.reason() == Some(InvalidReason::UnauthorizedRouteAccess) {
                tracing::info!(path, "unauthorized route access");
                let auth = &self.auth;
                let navigator = &self.navigator;
                self.manager
                    .handle_invalid_session(
                        &verdict,
                        || auth.logout(),
                        |to| navigator.navigate(to, NavigateOptions::default()),
                    )
                    .await?;
                return Ok(RouteDecision::LoggedOut);
            }
        }

        if path == "/" {
            // Unknown roles have no dashboard; leave them on `/`.
            if let Some(target) = self.auth.dashboard_route() {
                self.navigator.navigate(target, NavigateOptions::replace())?;
                tracing::debug!(to = target, "sent authenticated user to their dashboard");
                return Ok(RouteDecision::Redirected(target.to_string()));
            }
        }

        Ok(RouteDecision::Allowed)
    }
}
