//! Role → route mapping.
//!
//! Every role operates under exactly one canonical dashboard prefix. A
//! user found on another role's dashboard is treated as a security event
//! and logged out, unless the path is a [`SharedRoute`] explicitly opened
//! to their role (meeting pages reachable from several dashboards, the
//! superadmin catalogue pages administrators also manage).

use serde::{Deserialize, Serialize};

use crate::RoleName;

/// Prefix shared by every role dashboard.
pub const DASHBOARD_PREFIX: &str = "/dashboard/";

/// Where users without a (known) role are sent.
pub const LOGIN_ROUTE: &str = "/login";

/// A dashboard path that more than one role may visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedRoute {
    /// Exact path, without trailing slash.
    pub path: String,
    /// Roles allowed on this path in addition to its owner.
    pub roles: Vec<RoleName>,
}

impl SharedRoute {
    pub fn new(path: impl Into<String>, roles: &[RoleName]) -> Self {
        Self {
            path: path.into(),
            roles: roles.to_vec(),
        }
    }

    fn grants(&self, path: &str, role: RoleName) -> bool {
        normalize(&self.path) == normalize(path) && self.roles.contains(&role)
    }
}

/// Static role → canonical route table, plus shared-route grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRouteTable {
    shared: Vec<SharedRoute>,
}

impl RoleRouteTable {
    /// A table with no shared routes: strict one-prefix-per-role.
    pub fn strict() -> Self {
        Self::default()
    }

    /// A table that also honors the given shared-route grants.
    pub fn with_shared_routes(shared: Vec<SharedRoute>) -> Self {
        Self { shared }
    }

    /// The multi-role routes of the application's router.
    pub fn default_shared_routes() -> Vec<SharedRoute> {
        use RoleName::*;

        let mut shared: Vec<SharedRoute> = [
            "portfolios",
            "programs",
            "projects",
            "tasks",
            "documents",
        ]
        .iter()
        .map(|page| {
            SharedRoute::new(
                format!("/dashboard/superadmin/{page}"),
                &[Administrador, Superadministrador],
            )
        })
        .collect();

        shared.push(SharedRoute::new(
            "/dashboard/superadmin/meetings",
            &[Superadministrador, Administrador, Colaborador, Cliente],
        ));
        for prefix in ["/dashboard/administrador", "/dashboard/colaborador", "/dashboard/cliente"] {
            shared.push(SharedRoute::new(
                format!("{prefix}/meetings"),
                &[Administrador, Colaborador, Cliente],
            ));
        }

        shared
    }

    /// The dashboard prefix owned by `role`.
    pub fn dashboard_for(role: RoleName) -> &'static str {
        match role {
            RoleName::Superadministrador => "/dashboard/superadmin",
            RoleName::Administrador => "/dashboard/admin",
            RoleName::Colaborador => "/dashboard/colaborador",
            RoleName::Cliente => "/dashboard/cliente",
        }
    }

    /// The canonical route prefix for `role`, or `/login` for no role.
    pub fn route_for(role: Option<RoleName>) -> &'static str {
        role.map_or(LOGIN_ROUTE, Self::dashboard_for)
    }

    /// Same as [`route_for`](Self::route_for) but from a raw `nombre_rol`.
    pub fn route_for_name(raw: &str) -> &'static str {
        Self::route_for(RoleName::parse(raw))
    }

    /// Returns `true` for any path under `/dashboard/`.
    pub fn is_dashboard_path(path: &str) -> bool {
        path.starts_with(DASHBOARD_PREFIX)
    }

    /// Shared-route grants honored by this table.
    pub fn shared_routes(&self) -> &[SharedRoute] {
        &self.shared
    }

    /// Returns `true` if `path` is a dashboard path that `role` has no
    /// business on.
    ///
    /// Non-dashboard paths are never unauthorized here. A missing or unknown
    /// role is unauthorized on every dashboard path. Otherwise the path must
    /// start with the role's canonical prefix or be granted to the role by
    /// a shared route.
    ///
    /// The prefix match is plain `starts_with`, so `/dashboard/admin` also
    /// covers `/dashboard/administrador/...`.
    pub fn is_unauthorized(&self, path: &str, role: Option<RoleName>) -> bool {
        if !Self::is_dashboard_path(path) {
            return false;
        }
        let Some(role) = role else {
            return true;
        };
        if path.starts_with(Self::dashboard_for(role)) {
            return false;
        }
        !self.shared.iter().any(|route| route.grants(path, role))
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}
