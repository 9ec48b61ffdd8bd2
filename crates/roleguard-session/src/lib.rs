//! Session checks and the invalidation flow for roleguard.
//!
//! This crate decides whether the stored session is still good and, when it
//! isn't, tears it down exactly once:
//!
//! 1. **Credentials**: what survived the last reload ([`CredentialStore`])
//! 2. **Auth state**: what the running app believes right now ([`AuthState`])
//! 3. **Validation**: the ordered check producing a [`SessionVerdict`]
//!    ([`SessionValidator`])
//! 4. **Invalidation**: clear, reset, notify, redirect, guarded by a
//!    re-entrancy flag ([`SessionManager`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Guard Layer (above)  ← role, route-change, and expiry guards
//!     ↕
//! Session Layer (this crate)  ← verdicts and the invalidation flow
//!     ↕
//! Protocol Layer (below)  ← RoleName, UserRecord, TokenCodec, routes
//! ```

mod auth;
mod error;
mod manager;
mod notify;
mod session;
mod store;
mod validator;

pub use auth::{AuthSnapshot, AuthState};
pub use error::{NavigationError, NotifyError, SessionError, StoreError};
pub use manager::SessionManager;
pub use notify::{LogNotifier, Notice, Notifier, RecordingNotifier, Severity};
pub use session::{
    InvalidReason, InvalidSession, SessionCheckContext, SessionConfig, SessionVerdict,
};
pub use store::{
    CredentialStore, KeyValueCredentialStore, MemoryCredentialStore, TOKEN_KEY, USER_KEY,
};
pub use validator::SessionValidator;
