//! The ordered session check.
//!
//! Checks run from the weakest guarantee to the strongest and stop at the
//! first failure, so each step can assume the ones before it held:
//!
//! ```text
//!   credentials present?  ──no──→ NO_AUTH
//!          │
//!   token not expired?    ──no──→ TOKEN_EXPIRED
//!          │
//!   role in required set? ──no──→ INSUFFICIENT_PERMISSIONS
//!          │
//!   path owned by role?   ──no──→ UNAUTHORIZED_ROUTE_ACCESS
//!          │
//!        Valid
//! ```
//!
//! The re-entrancy check that precedes all of these belongs to the
//! [`SessionManager`](crate::SessionManager), which owns the flag.

use roleguard_protocol::{RoleRouteTable, TokenCodec};

use crate::{CredentialStore, InvalidReason, SessionCheckContext, SessionError, SessionVerdict};

/// Stateless validator over a token codec and a route table.
#[derive(Debug, Clone)]
pub struct SessionValidator {
    codec: TokenCodec,
    routes: RoleRouteTable,
}

impl SessionValidator {
    pub fn new(codec: TokenCodec, routes: RoleRouteTable) -> Self {
        Self { codec, routes }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn routes(&self) -> &RoleRouteTable {
        &self.routes
    }

    /// Checks the credentials in `store` against `context`.
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] if the store can't be read. A store
    /// that reads fine but is empty is a `NO_AUTH` verdict, not an error.
    pub fn check(
        &self,
        context: &SessionCheckContext,
        store: &impl CredentialStore,
    ) -> Result<SessionVerdict, SessionError> {
        let token = store.token()?;
        let user = store.user()?;
        let (Some(token), Some(user)) = (token, user) else {
            return Ok(SessionVerdict::invalid(InvalidReason::NoAuth));
        };

        if self.codec.is_expired(&token) {
            return Ok(SessionVerdict::invalid(InvalidReason::TokenExpired));
        }

        if !context.required_roles.is_empty() && !user.has_any_role(&context.required_roles) {
            return Ok(SessionVerdict::invalid(InvalidReason::InsufficientPermissions));
        }

        if let Some(path) = context.current_path.as_deref() {
            if self.routes.is_unauthorized(path, user.role()) {
                return Ok(SessionVerdict::invalid(InvalidReason::UnauthorizedRouteAccess));
            }
        }

        Ok(SessionVerdict::Valid)
    }
}
