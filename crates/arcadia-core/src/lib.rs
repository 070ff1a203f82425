//! Equipment lifecycle state machine for arcade-machine fleets.
//!
//! This crate owns the one hard invariant of an arcade maintenance system:
//! a machine's availability state never contradicts the state of its open
//! fault and maintenance records, even under concurrent transitions from
//! multiple reporters and technicians.
//!
//! - **[`EquipmentService`]** — Facade the embedding API layer uses.
//!   Machine administration, fault operations
//!   ([`report_fault`](EquipmentService::report_fault) /
//!   [`start_fault_processing`](EquipmentService::start_fault_processing) /
//!   [`resolve_fault`](EquipmentService::resolve_fault)), maintenance
//!   operations (schedule / start / finish / cancel), reads, and a
//!   broadcast stream of committed [`LifecycleEvent`]s.
//!
//! - **[`EquipmentRegistry`]** — Canonical machine state: availability,
//!   lifetime fault frequency, open-fault counter, last-maintenance date.
//!   A pure state holder; it is only mutated inside a machine's exclusive
//!   section.
//!
//! - **[`Coordinator`]** — Per-machine exclusive sections (a keyed async
//!   mutex table). Transitions on one machine are serialized in arrival
//!   order with a bounded wait; different machines never block each other.
//!
//! - **Collaborator seams** — [`Clock`] for timestamps and
//!   [`TransitionSink`] for persistence. The sink sees every transition as
//!   one record + machine pair *before* in-memory state changes; a sink
//!   error aborts the transition whole.
//!
//! Derived machine transitions are computed as a pure function of the
//! current state, the transition kind, and the open-fault counter, so the
//! machine reverts to AVAILABLE only when its last open fault resolves,
//! and a maintenance ending on a still-faulted machine hands it back as
//! FAULTED.

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod model;
pub mod persist;
pub mod service;
pub mod store;

mod faults;
mod maintenance;
mod transition;

// ── Primary re-exports ──────────────────────────────────────────────
pub use clock::{Clock, SystemClock};
pub use config::{CoreConfig, OutOfServicePolicy};
pub use coordinator::Coordinator;
pub use error::CoreError;
pub use event::LifecycleEvent;
pub use persist::{NullSink, SinkError, TransitionSink};
pub use service::EquipmentService;
pub use store::EquipmentRegistry;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Fault,
    FaultId,
    FaultPriority,
    FaultStatus,
    // Core entities
    Machine,
    MachineId,
    MachineState,
    Maintenance,
    MaintenanceId,
    MaintenanceKind,
    MaintenancePlan,
    MaintenanceState,
    NewMachine,
    Resolution,
    // External identities
    UserId,
};
