use std::time::{Duration, SystemTime, UNIX_EPOCH};

use roleguard::prelude::*;
use roleguard_protocol::unsigned_token;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A login as the backend would hand it out, valid for `ttl_secs`.
fn login(role: RoleName, ttl_secs: u64) -> Result<Credential, Box<dyn std::error::Error>> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let token = unsigned_token(&serde_json::json!({ "exp": now + ttl_secs, "sub": "7" }))?;
    let mut user = UserRecord::new(UserId(7), role);
    user.nombre = Some("Demo User".into());
    Ok(Credential { token, user })
}

fn sign_in(
    guards: &Guards<KeyValueCredentialStore, LogNotifier, RecordingNavigator>,
    credential: Credential,
) -> Result<(), RoleguardError> {
    guards.manager().store().persist(&credential)?;
    guards.auth().sign_in(credential);
    Ok(())
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    roleguard::logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => GuardConfig::from_path(path)?,
        None => GuardConfig {
            poll_interval_secs: 1,
            ..GuardConfig::default()
        },
    };

    let router = RecordingNavigator::new();
    let guards = Guards::new(
        config,
        KeyValueCredentialStore::new(),
        LogNotifier,
        router.clone(),
    )?;
    let route_guard = guards.route_change_guard();

    // 1. A collaborator signs in and opens the app root.
    sign_in(&guards, login(RoleName::Colaborador, 3600)?)?;
    let decision = route_guard.on_path_change("/").await?;
    tracing::info!(?decision, "opened /");

    let mut board = guards.role_guard("collaborator board", &[RoleName::Colaborador]);
    board.check("/dashboard/colaborador").await;
    tracing::info!(view = ?board.view(), "collaborator board");

    // 2. They edit the URL to reach the client area.
    let decision = route_guard.on_path_change("/dashboard/cliente").await?;
    tracing::info!(?decision, current = ?router.current(), "tampered URL");

    // Let the re-entrancy flag clear before the next login.
    tokio::time::sleep(guards.manager().config().release_delay() + Duration::from_millis(50)).await;

    // 3. A client signs in with a token that expires in two seconds.
    sign_in(&guards, login(RoleName::Cliente, 2)?)?;
    let watch = guards.token_expiration_guard().spawn();

    while guards.auth().is_authenticated() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    tracing::info!(
        checks = watch.checks_run(),
        armed = watch.is_armed(),
        current = ?router.current(),
        "expiry caught"
    );
    watch.stop();

    eprintln!("navigation history:");
    for nav in router.history() {
        eprintln!("  {}{}", nav.path, if nav.replace { " (replace)" } else { "" });
    }
    Ok(())
}
