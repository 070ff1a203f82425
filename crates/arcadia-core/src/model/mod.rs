// ── Unified domain model ──
//
// Canonical representations of every entity the lifecycle core owns.
// The machine's availability state lives only on `Machine` — fault and
// maintenance records never carry a denormalized copy of it.

pub mod fault;
pub mod id;
pub mod machine;
pub mod maintenance;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use arcadia_core::model::*` gives you everything.

// Core identity
pub use id::{FaultId, MachineId, MaintenanceId, UserId};

// Machine
pub use machine::{Machine, MachineState, NewMachine};

// Fault
pub use fault::{Fault, FaultPriority, FaultStatus, Resolution};

// Maintenance
pub use maintenance::{Maintenance, MaintenanceKind, MaintenancePlan, MaintenanceState};
