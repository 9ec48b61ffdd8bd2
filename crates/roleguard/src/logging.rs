//! Subscriber setup for binaries embedding the guards.
//!
//! Libraries only emit `tracing` events; installing a subscriber is the
//! application's call. [`init`] is the default one: human-readable output
//! filtered by `RUST_LOG`, falling back to `info`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber.
///
/// Returns `false` if a subscriber was already installed, in which case
/// nothing changes. Safe to call more than once.
pub fn init() -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("logging initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_second_call_is_noop() {
        // Another test may have installed a subscriber first; either way
        // the second call reports that one is already present.
        init();
        assert!(!init());
    }
}
