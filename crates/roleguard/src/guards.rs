//! Wiring: one session manager and auth state shared by every guard.

use std::sync::Arc;

use roleguard_protocol::{RoleName, TokenCodec};
use roleguard_session::{AuthState, CredentialStore, Notifier, SessionManager};

use crate::{
    GuardConfig, Navigator, RoleGuard, RoleguardError, RouteChangeGuard, TokenExpirationGuard,
};

/// The shared services behind the guards, built from a [`GuardConfig`].
///
/// Create once at startup, then hand out guards:
///
/// ```rust,ignore
/// let guards = Guards::new(GuardConfig::default(), store, LogNotifier, router)?;
/// let route_guard = guards.route_change_guard();
/// let watch = guards.token_expiration_guard().spawn();
/// let mut page = guards.role_guard(tasks_page, &[RoleName::Cliente]);
/// ```
pub struct Guards<S: CredentialStore, N: Notifier, V: Navigator> {
    config: GuardConfig,
    manager: Arc<SessionManager<S, N>>,
    auth: Arc<AuthState>,
    navigator: Arc<V>,
}

impl<S: CredentialStore, N: Notifier, V: Navigator> Guards<S, N, V> {
    /// Builds the services with the system clock.
    ///
    /// # Errors
    /// Returns [`RoleguardError::Store`] if persisted credentials can't be
    /// read while restoring auth state.
    pub fn new(config: GuardConfig, store: S, notifier: N, navigator: V) -> Result<Self, RoleguardError> {
        Self::with_codec(config, TokenCodec::system(), store, notifier, navigator)
    }

    /// Same as [`new`](Self::new) with an explicit token codec.
    ///
    /// # Errors
    /// See [`new`](Self::new).
    pub fn with_codec(
        config: GuardConfig,
        codec: TokenCodec,
        store: S,
        notifier: N,
        navigator: V,
    ) -> Result<Self, RoleguardError> {
        let config = config.validated();
        let auth = AuthState::initialize(&store)?;
        let manager = SessionManager::new(store, notifier)
            .with_codec(codec)
            .with_routes(config.route_table())
            .with_config(config.session_config());

        tracing::info!(
            authenticated = auth.is_authenticated(),
            poll_interval_secs = config.poll_interval_secs,
            "guards ready"
        );

        Ok(Self {
            config,
            manager: Arc::new(manager),
            auth: Arc::new(auth),
            navigator: Arc::new(navigator),
        })
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn manager(&self) -> &Arc<SessionManager<S, N>> {
        &self.manager
    }

    pub fn auth(&self) -> &Arc<AuthState> {
        &self.auth
    }

    pub fn navigator(&self) -> &Arc<V> {
        &self.navigator
    }

    pub fn role_guard<E>(&self, element: E, allowed_roles: &[RoleName]) -> RoleGuard<E, S, N> {
        RoleGuard::new(
            Arc::clone(&self.manager),
            Arc::clone(&self.auth),
            element,
            allowed_roles,
        )
    }

    pub fn route_change_guard(&self) -> RouteChangeGuard<S, N, V> {
        RouteChangeGuard::new(
            Arc::clone(&self.manager),
            Arc::clone(&self.auth),
            Arc::clone(&self.navigator),
        )
        .with_public_routes(self.config.public_routes.clone())
    }

    pub fn token_expiration_guard(&self) -> TokenExpirationGuard<S, N, V> {
        TokenExpirationGuard::new(
            Arc::clone(&self.manager),
            Arc::clone(&self.auth),
            Arc::clone(&self.navigator),
        )
        .with_poll_config(self.config.poll_config())
    }
}
