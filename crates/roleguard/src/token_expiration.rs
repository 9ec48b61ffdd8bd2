//! Background token-expiry watcher.
//!
//! While the user is signed in, a watcher task checks the session on a
//! fixed interval and whenever the host reports that the app became
//! visible again (a laptop lid opening, a tab regaining focus). Only a
//! `TOKEN_EXPIRED` verdict triggers the invalidation flow; every other
//! failure is left to the guards that own it.
//!
//! The task is an actor: a spawned loop owning its state, driven through a
//! channel by a handle.
//!
//! ```text
//!   ExpirationWatch ──(VisibilityRegained / Stop)──→ WatchTask
//!                                                      │  select! {
//!                                                      │    command,
//!                                                      │    auth change,
//!                                                      │    poll tick,
//!                                                      │  }
//! ```
//!
//! The poll is armed only while someone is signed in. A logout disarms it
//! and a later sign-in re-arms it with a fresh schedule; visibility signals
//! received while signed out are ignored. The task itself ends only when
//! the handle is dropped or on [`ExpirationWatch::stop`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use roleguard_session::{
    AuthSnapshot, AuthState, CredentialStore, InvalidReason, Notifier, SessionCheckContext,
    SessionManager,
};
use roleguard_tick::{PollConfig, PollInfo, PollScheduler};
use tokio::sync::{mpsc, watch};

use crate::{NavigateOptions, Navigator};

const COMMAND_CHANNEL_SIZE: usize = 8;

/// Spawns expiry watchers.
pub struct TokenExpirationGuard<S: CredentialStore, N: Notifier, V: Navigator> {
    manager: Arc<SessionManager<S, N>>,
    auth: Arc<AuthState>,
    navigator: Arc<V>,
    poll: PollConfig,
}

impl<S: CredentialStore, N: Notifier, V: Navigator> TokenExpirationGuard<S, N, V> {
    pub fn new(manager: Arc<SessionManager<S, N>>, auth: Arc<AuthState>, navigator: Arc<V>) -> Self {
        Self {
            manager,
            auth,
            navigator,
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Starts a watcher that follows the auth state for as long as the
    /// returned handle lives.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self) -> ExpirationWatch {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let finished = Arc::new(AtomicBool::new(false));
        let armed = Arc::new(AtomicBool::new(false));
        let checks = Arc::new(AtomicU64::new(0));

        let mut task = WatchTask {
            manager: Arc::clone(&self.manager),
            auth: Arc::clone(&self.auth),
            auth_changes: self.auth.subscribe(),
            navigator: Arc::clone(&self.navigator),
            poll: self.poll.clone(),
            scheduler: None,
            commands: rx,
            finished: Arc::clone(&finished),
            armed: Arc::clone(&armed),
            checks: Arc::clone(&checks),
        };
        if task.auth_changes.borrow_and_update().is_authenticated() {
            task.arm();
        }
        tokio::spawn(task.run());

        ExpirationWatch {
            commands: tx,
            finished,
            armed,
            checks,
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

enum WatchCommand {
    VisibilityRegained,
    Stop,
}

/// Handle to a running expiry watcher. Dropping it stops the watcher.
#[derive(Debug)]
pub struct ExpirationWatch {
    commands: mpsc::Sender<WatchCommand>,
    finished: Arc<AtomicBool>,
    armed: Arc<AtomicBool>,
    checks: Arc<AtomicU64>,
}

impl ExpirationWatch {
    /// Reports that the app became visible; the watcher checks right away
    /// if someone is signed in.
    ///
    /// Returns `false` if the watcher has already stopped. If several
    /// signals are already queued, this one is coalesced with them.
    pub fn visibility_regained(&self) -> bool {
        match self.commands.try_send(WatchCommand::VisibilityRegained) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => !self.is_finished(),
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Asks the watcher to stop. Takes effect at its next wakeup.
    pub fn stop(&self) {
        // A full queue or a closed channel both mean the task will end
        // (or has ended) without our Stop.
        if self.commands.try_send(WatchCommand::Stop).is_err() {
            tracing::trace!("stop not queued");
        }
    }

    /// Returns `true` once the watcher task has exited.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Returns `true` while the periodic poll is running, i.e. while
    /// someone is signed in and the watcher hasn't stopped.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// How many session checks the watcher has run.
    pub fn checks_run(&self) -> u64 {
        self.checks.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

struct WatchTask<S: CredentialStore, N: Notifier, V: Navigator> {
    manager: Arc<SessionManager<S, N>>,
    auth: Arc<AuthState>,
    auth_changes: watch::Receiver<AuthSnapshot>,
    navigator: Arc<V>,
    poll: PollConfig,
    /// `Some` while signed in.
    scheduler: Option<PollScheduler>,
    commands: mpsc::Receiver<WatchCommand>,
    finished: Arc<AtomicBool>,
    armed: Arc<AtomicBool>,
    checks: Arc<AtomicU64>,
}

impl<S: CredentialStore, N: Notifier, V: Navigator> WatchTask<S, N, V> {
    async fn run(mut self) {
        tracing::debug!(armed = self.scheduler.is_some(), "expiry watch started");

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(WatchCommand::VisibilityRegained) => self.check("visibility").await,
                    Some(WatchCommand::Stop) | None => break,
                },
                changed = self.auth_changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let signed_in = self.auth_changes.borrow_and_update().is_authenticated();
                    match (signed_in, self.scheduler.is_some()) {
                        (true, false) => self.arm(),
                        (false, true) => self.disarm(),
                        _ => {}
                    }
                }
                poll = next_poll(&mut self.scheduler) => {
                    tracing::trace!(poll = poll.poll, "expiry poll");
                    self.check("poll").await;
                }
            }
        }

        self.armed.store(false, Ordering::SeqCst);
        self.finished.store(true, Ordering::SeqCst);
        tracing::debug!(checks = self.checks.load(Ordering::SeqCst), "expiry watch stopped");
    }

    /// Starts a fresh poll schedule, first check one interval from now.
    fn arm(&mut self) {
        let scheduler = PollScheduler::new(self.poll.clone());
        tracing::debug!(interval_secs = scheduler.interval().as_secs(), "expiry poll armed");
        self.scheduler = Some(scheduler);
        self.armed.store(true, Ordering::SeqCst);
    }

    fn disarm(&mut self) {
        self.scheduler = None;
        self.armed.store(false, Ordering::SeqCst);
        tracing::debug!("expiry poll disarmed");
    }

    async fn check(&mut self, trigger: &'static str) {
        if !self.auth.is_authenticated() {
            return;
        }
        self.checks.fetch_add(1, Ordering::SeqCst);

        let verdict = match self.manager.check_session(&SessionCheckContext::new()) {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, trigger, "expiry check failed");
                return;
            }
        };
        if verdict.reason() != Some(InvalidReason::TokenExpired) {
            return;
        }

        tracing::info!(trigger, "token expired");
        let auth = &self.auth;
        let navigator = &self.navigator;
        if let Err(e) = self
            .manager
            .handle_invalid_session(
                &verdict,
                || auth.logout(),
                |to| navigator.navigate(to, NavigateOptions::default()),
            )
            .await
        {
            tracing::warn!(error = %e, "session invalidation failed");
        }
    }
}

/// The next poll, or never while disarmed.
async fn next_poll(scheduler: &mut Option<PollScheduler>) -> PollInfo {
    match scheduler {
        Some(scheduler) => scheduler.wait_for_poll().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use roleguard_protocol::{Credential, FixedClock, RoleName, TokenCodec, UserId, UserRecord, unsigned_token};
    use roleguard_session::{MemoryCredentialStore, RecordingNotifier};

    use super::*;
    use crate::RecordingNavigator;

    const NOW: u64 = 1_700_000_000;

    type Guard = TokenExpirationGuard<MemoryCredentialStore, RecordingNotifier, RecordingNavigator>;

    struct Fixture {
        guard: Guard,
        clock: FixedClock,
        auth: Arc<AuthState>,
        manager: Arc<SessionManager<MemoryCredentialStore, RecordingNotifier>>,
        nav: RecordingNavigator,
    }

    fn credential(exp: u64) -> Credential {
        Credential {
            token: unsigned_token(&serde_json::json!({ "exp": exp })).unwrap(),
            user: UserRecord::new(UserId(2), RoleName::Colaborador),
        }
    }

    fn fixture(signed_in: bool, exp: u64) -> Fixture {
        let store = MemoryCredentialStore::new();
        if signed_in {
            store.set(credential(exp));
        }
        let clock = FixedClock::at(NOW);
        let auth = Arc::new(AuthState::initialize(&store).unwrap());
        let manager = Arc::new(
            SessionManager::new(store, RecordingNotifier::new())
                .with_codec(TokenCodec::new(clock.clone())),
        );
        let nav = RecordingNavigator::new();
        let guard = TokenExpirationGuard::new(
            Arc::clone(&manager),
            Arc::clone(&auth),
            Arc::new(nav.clone()),
        );
        Fixture {
            guard,
            clock,
            auth,
            manager,
            nav,
        }
    }

    /// Lets spawned tasks run to their next await point.
    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_unauthenticated_idles_without_checks() {
        let f = fixture(false, 0);
        let watch = f.guard.spawn();
        assert!(!watch.is_armed());

        assert!(watch.visibility_regained());
        tokio::time::sleep(Duration::from_secs(90)).await;
        settle().await;

        assert!(!watch.is_finished());
        assert_eq!(watch.checks_run(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_after_spawn_arms_poll() {
        let f = fixture(false, 0);
        let watch = f.guard.spawn();
        settle().await;

        f.auth.sign_in(credential(NOW + 600));
        settle().await;
        assert!(watch.is_armed());

        tokio::time::sleep(Duration::from_secs(31)).await;
        settle().await;
        assert_eq!(watch.checks_run(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_detects_expiry_and_logs_out() {
        let f = fixture(true, NOW + 45);
        let watch = f.guard.spawn();

        tokio::time::sleep(Duration::from_secs(31)).await;
        settle().await;
        assert_eq!(watch.checks_run(), 1);
        assert!(f.auth.is_authenticated());

        f.clock.advance(60);
        tokio::time::sleep(Duration::from_secs(30)).await;
        settle().await;

        assert_eq!(watch.checks_run(), 2);
        assert!(!f.auth.is_authenticated());
        assert_eq!(f.manager.notifier().count(), 1);
        assert_eq!(f.nav.current().as_deref(), Some("/login"));
        settle().await;
        assert!(!watch.is_armed());
        assert!(!watch.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_re_login_after_expiry_is_watched_again() {
        let f = fixture(true, NOW + 20);
        let watch = f.guard.spawn();

        f.clock.advance(25);
        tokio::time::sleep(Duration::from_secs(31)).await;
        settle().await;
        assert!(!f.auth.is_authenticated());
        assert!(!watch.is_armed());

        // The user logs back in with a token good for another 40 seconds.
        let credential = credential(NOW + 25 + 40);
        f.manager.store().set(credential.clone());
        f.auth.sign_in(credential);
        settle().await;
        assert!(watch.is_armed());

        f.clock.advance(45);
        tokio::time::sleep(Duration::from_secs(31)).await;
        settle().await;

        assert_eq!(watch.checks_run(), 2);
        assert!(!f.auth.is_authenticated());
        assert_eq!(f.manager.notifier().count(), 2);
        assert_eq!(f.nav.count(), 2);
        assert!(!watch.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_visibility_regained_checks_immediately() {
        let f = fixture(true, NOW + 600);
        let watch = f.guard.spawn();

        f.clock.advance(601);
        assert!(watch.visibility_regained());
        settle().await;

        assert_eq!(watch.checks_run(), 1);
        assert!(!f.auth.is_authenticated());
        assert_eq!(f.nav.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_failures_are_ignored() {
        // Route and role problems belong to the other guards.
        let f = fixture(true, NOW + 600);
        f.manager.store().clear().unwrap();
        let watch = f.guard.spawn();

        assert!(watch.visibility_regained());
        settle().await;

        assert_eq!(watch.checks_run(), 1);
        assert_eq!(f.manager.notifier().count(), 0);
        assert_eq!(f.nav.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_logout_disarms_poll() {
        let f = fixture(true, NOW + 600);
        let watch = f.guard.spawn();
        settle().await;
        assert!(watch.is_armed());

        f.auth.logout();
        settle().await;
        assert!(!watch.is_armed());

        assert!(watch.visibility_regained());
        tokio::time::sleep(Duration::from_secs(90)).await;
        settle().await;

        assert!(!watch.is_finished());
        assert_eq!(watch.checks_run(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_watch() {
        let f = fixture(true, NOW + 600);
        let watch = f.guard.spawn();

        watch.stop();
        settle().await;

        assert!(watch.is_finished());
        assert!(!watch.visibility_regained());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_ends_watch() {
        let f = fixture(true, NOW + 600);
        let watch = f.guard.spawn();
        let finished = Arc::clone(&watch.finished);

        drop(watch);
        settle().await;

        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_poll_interval() {
        let f = fixture(true, NOW + 600);
        let guard = f.guard.with_poll_config(PollConfig::with_interval_secs(5));
        let watch = guard.spawn();

        tokio::time::sleep(Duration::from_secs(16)).await;
        settle().await;

        assert_eq!(watch.checks_run(), 3);
    }
}
