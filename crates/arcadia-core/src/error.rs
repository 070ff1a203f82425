// ── Core error types ──
//
// User-facing errors from arcadia-core. Callers see domain terms, never
// storage internals. Invalid transitions are rejected requests, not system
// faults; `is_retryable` encodes which failures a caller may retry.

use thiserror::Error;

use crate::model::{FaultId, MachineId, MaintenanceId};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    #[error("machine not found: {id}")]
    MachineNotFound { id: MachineId },

    #[error("fault not found: {id}")]
    FaultNotFound { id: FaultId },

    #[error("maintenance not found: {id}")]
    MaintenanceNotFound { id: MaintenanceId },

    // ── Transition errors ────────────────────────────────────────────
    /// The requested status change violates the record's state machine.
    #[error("invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    // ── Concurrency errors ───────────────────────────────────────────
    /// Could not acquire the machine's exclusive section within the
    /// configured bound. Retryable.
    #[error("timed out after {waited_ms}ms waiting for exclusive access to machine {machine}")]
    ConcurrencyTimeout { machine: MachineId, waited_ms: u64 },

    // ── Persistence errors ───────────────────────────────────────────
    /// The underlying store rejected the transition. No partial state was
    /// committed; the caller may retry the whole operation.
    #[error("persistence failed: {message}")]
    Persistence { message: String },
}

impl CoreError {
    /// Whether the caller may meaningfully retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyTimeout { .. } | Self::Persistence { .. }
        )
    }
}
