// ── Lifecycle events ──
//
// One event per committed transition, carrying the post-state of the
// record and (when the transition touched it) the post-state of the
// machine. This pair is the atomic unit: the persistence sink sees it
// before any in-memory mutation, and subscribers see it after.

use serde::Serialize;

use crate::model::{Fault, Machine, Maintenance};

/// A committed lifecycle transition.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleEvent {
    MachineRegistered {
        machine: Machine,
    },
    /// Administrative override of the machine state.
    MachineStateOverridden {
        machine: Machine,
    },

    FaultReported {
        fault: Fault,
        machine: Machine,
    },
    FaultProcessingStarted {
        fault: Fault,
    },
    FaultResolved {
        fault: Fault,
        machine: Machine,
    },

    MaintenanceScheduled {
        maintenance: Maintenance,
    },
    MaintenanceStarted {
        maintenance: Maintenance,
        machine: Machine,
    },
    MaintenanceFinished {
        maintenance: Maintenance,
        machine: Machine,
    },
    MaintenanceCancelled {
        maintenance: Maintenance,
        machine: Machine,
    },
}

impl LifecycleEvent {
    /// Short name for logging and sink routing.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MachineRegistered { .. } => "MACHINE_REGISTERED",
            Self::MachineStateOverridden { .. } => "MACHINE_STATE_OVERRIDDEN",
            Self::FaultReported { .. } => "FAULT_REPORTED",
            Self::FaultProcessingStarted { .. } => "FAULT_PROCESSING_STARTED",
            Self::FaultResolved { .. } => "FAULT_RESOLVED",
            Self::MaintenanceScheduled { .. } => "MAINTENANCE_SCHEDULED",
            Self::MaintenanceStarted { .. } => "MAINTENANCE_STARTED",
            Self::MaintenanceFinished { .. } => "MAINTENANCE_FINISHED",
            Self::MaintenanceCancelled { .. } => "MAINTENANCE_CANCELLED",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Machine, NewMachine};
    use chrono::{NaiveDate, Utc};

    fn sample_machine() -> Machine {
        Machine::register(
            NewMachine {
                name: "Pole Position".into(),
                game_type: "racing".into(),
                zone: "main-floor".into(),
                manufactured_on: NaiveDate::from_ymd_opt(1990, 3, 14).unwrap(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn events_tag_with_wire_kind() {
        let event = LifecycleEvent::MachineRegistered {
            machine: sample_machine(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "MACHINE_REGISTERED");
        assert_eq!(json["machine"]["state"], "AVAILABLE");
        assert_eq!(event.kind(), "MACHINE_REGISTERED");
    }
}
