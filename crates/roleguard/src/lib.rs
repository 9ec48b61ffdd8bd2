//! # Roleguard
//!
//! Role-based route guards and session invalidation for dashboard
//! applications.
//!
//! Each user holds exactly one role, and each role owns a dashboard prefix.
//! Three guards keep users inside their own area and out of the app once
//! their session is gone:
//!
//! - [`RoleGuard`]: wraps one protected element; renders it only after a
//!   valid session check.
//! - [`RouteChangeGuard`]: runs on every path change; logs out users who
//!   type another role's dashboard URL, and sends `/` to the right
//!   dashboard.
//! - [`TokenExpirationGuard`]: a background task that notices expired
//!   tokens on a timer and when the app becomes visible.
//!
//! All three share one [`SessionManager`](roleguard_session::SessionManager),
//! which makes sure a dead session is torn down (and the user told) once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roleguard::prelude::*;
//!
//! # async fn run() -> Result<(), RoleguardError> {
//! roleguard::logging::init();
//!
//! let guards = Guards::new(
//!     GuardConfig::default(),
//!     KeyValueCredentialStore::new(),
//!     LogNotifier,
//!     RecordingNavigator::new(),
//! )?;
//!
//! let _watch = guards.token_expiration_guard().spawn();
//! let decision = guards.route_change_guard().on_path_change("/").await?;
//! # let _ = decision;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;

mod guards;
mod navigate;
mod role_guard;
mod route_change;
mod token_expiration;

pub use config::{DEFAULT_PUBLIC_ROUTES, GuardConfig};
pub use error::{ConfigError, RoleguardError};
pub use guards::Guards;
pub use navigate::{NavigateOptions, Navigation, Navigator, RecordingNavigator};
pub use role_guard::{RoleGuard, RoleGuardState, View};
pub use route_change::{RouteChangeGuard, RouteDecision};
pub use token_expiration::{ExpirationWatch, TokenExpirationGuard};

pub mod prelude {
    //! Everything a host application usually needs.

    pub use crate::{
        ExpirationWatch, GuardConfig, Guards, NavigateOptions, Navigator, RecordingNavigator,
        RoleGuard, RoleGuardState, RoleguardError, RouteChangeGuard, RouteDecision,
        TokenExpirationGuard, View,
    };
    pub use roleguard_protocol::{
        Credential, RoleName, RoleRouteTable, TokenCodec, UserId, UserRecord,
    };
    pub use roleguard_session::{
        AuthState, CredentialStore, InvalidReason, KeyValueCredentialStore, LogNotifier,
        MemoryCredentialStore, Notice, Notifier, SessionCheckContext, SessionManager,
        SessionVerdict,
    };
    pub use roleguard_tick::PollConfig;
}
