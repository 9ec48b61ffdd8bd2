//! Shared vocabulary for roleguard.
//!
//! This crate defines what every other layer talks about:
//!
//! - **Types** ([`RoleName`], [`UserRecord`], [`Credential`]): who the
//!   user is and what they persisted at login.
//! - **Routes** ([`RoleRouteTable`]): which dashboard each role lives
//!   under, and which shared pages are open to several roles.
//! - **Codec** ([`TokenCodec`]): reading the `exp` claim out of a bearer
//!   token, against an injectable [`Clock`].
//! - **Errors** ([`ProtocolError`]).
//!
//! It holds no state and does no I/O.
//!
//! ```text
//! Guards (roleguard) → Session (validator, manager) → Protocol (this crate)
//! ```

mod codec;
mod error;
mod routes;
mod types;

pub use codec::{Clock, FixedClock, SystemClock, TokenClaims, TokenCodec, unsigned_token};
pub use error::ProtocolError;
pub use routes::{DASHBOARD_PREFIX, LOGIN_ROUTE, RoleRouteTable, SharedRoute};
pub use types::{Credential, RoleName, UserId, UserRecord};
