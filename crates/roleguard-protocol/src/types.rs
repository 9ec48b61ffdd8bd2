//! Core identity types shared by every roleguard layer.
//!
//! These are the shapes the guards exchange with the rest of the
//! application: who the user is, which role they hold, and the credential
//! pair (token + user) the login flow persisted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user account.
///
/// Newtype over `u64` so a user id can't be confused with a role id.
/// `#[serde(transparent)]` keeps the JSON form a plain number, matching
/// what the backend returns in the login response.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoleName
// ---------------------------------------------------------------------------

/// The closed set of roles the application knows about.
///
/// The serialized names are the exact strings the backend stores in
/// `nombre_rol`, so a `RoleName` round-trips through the persisted user
/// record unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleName {
    Superadministrador,
    Administrador,
    Colaborador,
    Cliente,
}

impl RoleName {
    /// Every role, in descending order of privilege.
    pub const ALL: [RoleName; 4] = [
        RoleName::Superadministrador,
        RoleName::Administrador,
        RoleName::Colaborador,
        RoleName::Cliente,
    ];

    /// The wire name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superadministrador => "Superadministrador",
            Self::Administrador => "Administrador",
            Self::Colaborador => "Colaborador",
            Self::Cliente => "Cliente",
        }
    }

    /// Parses a raw `nombre_rol` string. Matching is exact; the backend
    /// never sends other casings.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == raw)
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoleName {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ProtocolError::InvalidRole(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// UserRecord
// ---------------------------------------------------------------------------

/// The user object stored next to the token after login.
///
/// Only `nombre_rol` matters to the guards. It is kept as the raw string
/// (not a [`RoleName`]) so that a record carrying a role this build doesn't
/// know about still deserializes; such a user simply has no canonical
/// route and fails every role check.
///
/// Profile fields the guards never read are preserved in `profile` via
/// `#[serde(flatten)]`, so re-serializing the record loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: UserId,

    /// Role name as stored by the backend.
    pub nombre_rol: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_rol: Option<u64>,

    /// Everything else the backend put in the user object.
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl UserRecord {
    /// Creates a minimal record with the given id and role.
    pub fn new(id: UserId, role: RoleName) -> Self {
        Self {
            id,
            nombre_rol: role.as_str().to_string(),
            nombre: None,
            email: None,
            id_rol: None,
            profile: Map::new(),
        }
    }

    /// The parsed role, or `None` if `nombre_rol` is not a known role.
    pub fn role(&self) -> Option<RoleName> {
        RoleName::parse(&self.nombre_rol)
    }

    /// Returns `true` if the user's role is one of `allowed`.
    ///
    /// An unknown role is never a member of any list.
    pub fn has_any_role(&self, allowed: &[RoleName]) -> bool {
        self.role().is_some_and(|role| allowed.contains(&role))
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// A persisted login: bearer token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub user: UserRecord,
}

// =========================================================================
// Tests
// =========================================================================
