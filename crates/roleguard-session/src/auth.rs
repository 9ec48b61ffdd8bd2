//! In-memory authentication state.
//!
//! The credential store is what survives a reload; [`AuthState`] is what
//! the running application believes right now. Guards read it to decide
//! whether a check is even worth running (`is_authenticated`), and the
//! invalidation flow resets it through `logout`.
//!
//! State lives in a `tokio::sync::watch` channel so long-running guards can
//! [`subscribe`](AuthState::subscribe) and react the moment the user logs
//! out instead of discovering it on their next timer tick.

use roleguard_protocol::{Credential, RoleName, RoleRouteTable, TokenCodec, UserRecord};
use tokio::sync::watch;

use crate::{CredentialStore, StoreError};

/// A point-in-time view of who is signed in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSnapshot {
    pub token: Option<String>,
    pub user: Option<UserRecord>,
}

impl AuthSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Shared, observable authentication state.
#[derive(Debug)]
pub struct AuthState {
    tx: watch::Sender<AuthSnapshot>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthState {
    /// Signed-out state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthSnapshot::default());
        Self { tx }
    }

    /// Restores state from persisted credentials, as on page load.
    ///
    /// Only a complete credential (token and user) signs the user in; a
    /// half-written store leaves the state signed out.
    ///
    /// # Errors
    /// Returns the store's error if it can't be read.
    pub fn initialize(store: &impl CredentialStore) -> Result<Self, StoreError> {
        let state = Self::new();
        if let Some(credential) = store.credential()? {
            state.sign_in(credential);
        }
        Ok(state)
    }

    /// Records a successful login.
    pub fn sign_in(&self, credential: Credential) {
        tracing::info!(
            user_id = %credential.user.id,
            role = %credential.user.nombre_rol,
            "signed in"
        );
        self.tx.send_replace(AuthSnapshot {
            token: Some(credential.token),
            user: Some(credential.user),
        });
    }

    /// Forgets the in-memory session. Persisted credentials are the
    /// store's business and are not touched here.
    pub fn logout(&self) {
        let previous = self.tx.send_replace(AuthSnapshot::default());
        if previous.is_authenticated() {
            tracing::info!("signed out");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.tx.borrow().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.tx.borrow().token.clone()
    }

    /// Returns `true` if the signed-in user holds one of `allowed`.
    pub fn has_role(&self, allowed: &[RoleName]) -> bool {
        self.tx
            .borrow()
            .user
            .as_ref()
            .is_some_and(|user| user.has_any_role(allowed))
    }

    /// The signed-in user's canonical route, or `/login`.
    pub fn correct_route(&self) -> &'static str {
        let role = self.tx.borrow().user.as_ref().and_then(UserRecord::role);
        RoleRouteTable::route_for(role)
    }

    /// The signed-in user's dashboard, or `None` when nobody is signed in
    /// or the stored role is not one we route.
    pub fn dashboard_route(&self) -> Option<&'static str> {
        let role = self.tx.borrow().user.as_ref().and_then(UserRecord::role);
        role.map(RoleRouteTable::dashboard_for)
    }

    /// Returns `true` if there is no token or it has expired.
    pub fn is_token_expired(&self, codec: &TokenCodec) -> bool {
        self.tx
            .borrow()
            .token
            .as_deref()
            .is_none_or(|token| codec.is_expired(token))
    }

    /// A receiver that wakes on every sign-in and logout.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use roleguard_protocol::{FixedClock, UserId, unsigned_token};

    use super::*;
    use crate::MemoryCredentialStore;

    fn credential(role: RoleName) -> Credential {
        Credential {
            token: unsigned_token(&serde_json::json!({ "exp": 2_000 })).unwrap(),
            user: UserRecord::new(UserId(5), role),
        }
    }

    #[test]
    fn test_initialize_from_full_store_is_authenticated() {
        let store = MemoryCredentialStore::with_credential(credential(RoleName::Cliente));
        let auth = AuthState::initialize(&store).unwrap();

        assert!(auth.is_authenticated());
        assert_eq!(auth.correct_route(), "/dashboard/cliente");
    }

    #[test]
    fn test_initialize_from_empty_store_is_signed_out() {
        let auth = AuthState::initialize(&MemoryCredentialStore::new()).unwrap();
        assert!(!auth.is_authenticated());
        assert_eq!(auth.correct_route(), "/login");
    }

    #[test]
    fn test_dashboard_route_unknown_role_is_none() {
        let mut credential = credential(RoleName::Cliente);
        credential.user.nombre_rol = "Auditor".into();
        let auth = AuthState::new();
        assert_eq!(auth.dashboard_route(), None);

        auth.sign_in(credential);

        assert!(auth.is_authenticated());
        assert_eq!(auth.dashboard_route(), None);
        assert_eq!(auth.correct_route(), "/login");
    }

    #[test]
    fn test_logout_clears_memory_but_not_store() {
        let store = MemoryCredentialStore::with_credential(credential(RoleName::Cliente));
        let auth = AuthState::initialize(&store).unwrap();

        auth.logout();

        assert!(!auth.is_authenticated());
        assert_eq!(auth.user(), None);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_has_role() {
        let auth = AuthState::new();
        assert!(!auth.has_role(&RoleName::ALL));

        auth.sign_in(credential(RoleName::Colaborador));
        assert!(auth.has_role(&[RoleName::Colaborador, RoleName::Cliente]));
        assert!(!auth.has_role(&[RoleName::Administrador]));
    }

    #[test]
    fn test_is_token_expired() {
        let auth = AuthState::new();
        let codec = TokenCodec::new(FixedClock::at(1_000));
        assert!(auth.is_token_expired(&codec));

        auth.sign_in(credential(RoleName::Cliente));
        assert!(!auth.is_token_expired(&codec));
        assert!(auth.is_token_expired(&TokenCodec::new(FixedClock::at(3_000))));
    }

    #[test]
    fn test_subscribe_sees_logout() {
        let auth = AuthState::new();
        auth.sign_in(credential(RoleName::Cliente));
        let mut rx = auth.subscribe();
        assert!(rx.borrow_and_update().is_authenticated());

        auth.logout();

        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_authenticated());
    }
}
