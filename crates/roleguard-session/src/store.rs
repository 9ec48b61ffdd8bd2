//! Credential storage: where the token and user live between page loads.
//!
//! The guards never create credentials; the login flow does. They only
//! read them on every check and wipe them when a session is invalidated.
//! Storage itself is an external concern, so it sits behind the
//! [`CredentialStore`] trait.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use roleguard_protocol::{Credential, UserRecord};

use crate::StoreError;

/// Read/clear access to persisted credentials.
///
/// `Send + Sync + 'static` because the store is owned by the
/// [`SessionManager`](crate::SessionManager), which guards share across
/// tasks.
pub trait CredentialStore: Send + Sync + 'static {
    /// The stored bearer token, if any.
    fn token(&self) -> Result<Option<String>, StoreError>;

    /// The stored user record, if any.
    fn user(&self) -> Result<Option<UserRecord>, StoreError>;

    /// Removes the token and user. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StoreError>;

    /// Both halves of the credential, or `None` if either is missing.
    fn credential(&self) -> Result<Option<Credential>, StoreError> {
        let token = self.token()?;
        let user = self.user()?;
        Ok(token.zip(user).map(|(token, user)| Credential { token, user }))
    }
}

// ---------------------------------------------------------------------------
// MemoryCredentialStore
// ---------------------------------------------------------------------------

/// A typed, in-process store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    slot: Arc<Mutex<Option<Credential>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        let store = Self::new();
        store.set(credential);
        store
    }

    /// Replaces whatever is stored (what a login does).
    pub fn set(&self, credential: Credential) {
        *self.lock() = Some(credential);
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Credential>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .lock()
            .as_ref()
            .map(|c| c.token.clone())
            .filter(|t| !t.is_empty()))
    }

    fn user(&self) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.lock().as_ref().map(|c| c.user.clone()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.lock() = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// KeyValueCredentialStore
// ---------------------------------------------------------------------------

/// Key under which the token is stored.
pub const TOKEN_KEY: &str = "token";
/// Key under which the user record is stored, as JSON.
pub const USER_KEY: &str = "user";

/// A string key/value store laid out like browser local storage: the token
/// as a plain string under `token`, the user as JSON under `user`.
///
/// Unlike [`MemoryCredentialStore`], the two halves are independent keys,
/// so a half-written login (token without user) is representable and reads
/// as "no credential". A `user` value that isn't valid JSON is reported as
/// [`StoreError::Corrupt`] rather than silently ignored.
#[derive(Debug, Clone, Default)]
pub struct KeyValueCredentialStore {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl KeyValueCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn set_item(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    pub fn remove_item(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Writes both keys the way the login flow does.
    ///
    /// # Errors
    /// Returns [`StoreError::Corrupt`] if the user can't be serialized.
    pub fn persist(&self, credential: &Credential) -> Result<(), StoreError> {
        let user = serde_json::to_string(&credential.user)?;
        let mut items = self.lock();
        items.insert(TOKEN_KEY.to_string(), credential.token.clone());
        items.insert(USER_KEY.to_string(), user);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for KeyValueCredentialStore {
    fn token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.get_item(TOKEN_KEY).filter(|t| !t.is_empty()))
    }

    fn user(&self) -> Result<Option<UserRecord>, StoreError> {
        self.get_item(USER_KEY)
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StoreError::Corrupt)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut items = self.lock();
        items.remove(TOKEN_KEY);
        items.remove(USER_KEY);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use roleguard_protocol::{RoleName, UserId};

    use super::*;

    fn credential() -> Credential {
        Credential {
            token: "h.p.s".into(),
            user: UserRecord::new(UserId(3), RoleName::Cliente),
        }
    }

    #[test]
    fn test_memory_store_clone_shares_slot() {
        let store = MemoryCredentialStore::new();
        let other = store.clone();

        store.set(credential());
        assert_eq!(other.token().unwrap().as_deref(), Some("h.p.s"));

        other.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.credential().unwrap(), None);
    }

    #[test]
    fn test_memory_store_empty_token_reads_as_absent() {
        let store = MemoryCredentialStore::with_credential(Credential {
            token: String::new(),
            ..credential()
        });
        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.credential().unwrap(), None);
    }

    #[test]
    fn test_key_value_store_persist_then_read() {
        let store = KeyValueCredentialStore::new();
        store.persist(&credential()).unwrap();

        assert_eq!(store.credential().unwrap(), Some(credential()));
        assert!(store.get_item(USER_KEY).unwrap().contains("\"nombre_rol\":\"Cliente\""));
    }

    #[test]
    fn test_key_value_store_token_without_user_is_no_credential() {
        let store = KeyValueCredentialStore::new();
        store.set_item(TOKEN_KEY, "h.p.s");

        assert_eq!(store.token().unwrap().as_deref(), Some("h.p.s"));
        assert_eq!(store.credential().unwrap(), None);
    }

    #[test]
    fn test_key_value_store_empty_token_reads_as_absent() {
        let store = KeyValueCredentialStore::new();
        store.set_item(TOKEN_KEY, "");
        assert_eq!(store.token().unwrap(), None);
    }

    #[test]
    fn test_key_value_store_corrupt_user_is_error() {
        let store = KeyValueCredentialStore::new();
        store.set_item(TOKEN_KEY, "h.p.s");
        store.set_item(USER_KEY, "{not json");

        assert!(matches!(store.user(), Err(StoreError::Corrupt(_))));
        assert!(store.credential().is_err());
    }

    #[test]
    fn test_key_value_store_clear_leaves_other_keys() {
        let store = KeyValueCredentialStore::new();
        store.persist(&credential()).unwrap();
        store.set_item("theme", "dark");

        store.clear().unwrap();

        assert_eq!(store.credential().unwrap(), None);
        assert_eq!(store.get_item("theme").as_deref(), Some("dark"));
    }
}
