// ── Runtime core configuration ──
//
// Plain data describing *how* the core behaves. The embedding layer
// constructs a `CoreConfig` and hands it in — the core never reads
// config files.

use std::time::Duration;

/// How OUT_OF_SERVICE interacts with derived transitions.
///
/// The override state is never *entered* automatically either way; the
/// policy only controls whether derived transitions may *leave* it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfServicePolicy {
    /// OUT_OF_SERVICE is frozen: derived transitions leave the machine
    /// state untouched until an administrator overrides it back. Record
    /// transitions (and the open-fault counter) still proceed.
    #[default]
    Frozen,
    /// Derived transitions overwrite OUT_OF_SERVICE like any other state.
    Automatic,
}

/// Configuration for the lifecycle core.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Bound on waiting for a machine's exclusive section. Expiry surfaces
    /// as [`CoreError::ConcurrencyTimeout`](crate::CoreError::ConcurrencyTimeout).
    pub lock_timeout: Duration,
    /// OUT_OF_SERVICE interaction with derived transitions.
    pub out_of_service: OutOfServicePolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            // Transitions are a few memory operations plus one sink write;
            // anything slower than this indicates a stuck holder.
            lock_timeout: Duration::from_secs(5),
            out_of_service: OutOfServicePolicy::default(),
        }
    }
}
