//! Tracing setup for test binaries
//!
//! The library only emits `tracing` events; nothing is printed unless a
//! subscriber is installed. These helpers install a `fmt` subscriber filtered
//! by `RUST_LOG` and are safe to call from every test.

use tracing_subscriber::EnvFilter;

/// Default filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "ledger_testkit=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a global subscriber writing to stderr.
///
/// Returns `false` if a subscriber was already installed.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Install a global subscriber that writes through the test harness so output
/// is captured per test.
pub fn init_for_tests() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_for_tests();
        assert!(!init_for_tests());
        assert!(!init());
    }
}
