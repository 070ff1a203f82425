// ── Machine domain types ──

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::id::MachineId;

/// Machine availability state.
///
/// Derived from the machine's open faults and maintenances, except
/// [`OutOfService`](MachineState::OutOfService) which is only ever set by an
/// administrative override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineState {
    Available,
    Faulted,
    UnderMaintenance,
    OutOfService,
}

impl MachineState {
    /// Whether players can currently use the machine.
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Available)
    }

    /// Whether this state was produced by derived transitions (as opposed
    /// to the administrative override).
    pub fn is_derived(&self) -> bool {
        !matches!(self, Self::OutOfService)
    }
}

/// A registered arcade machine. Single source of truth for availability.
///
/// `fault_frequency` counts AVAILABLE→FAULTED edges over the machine's
/// life; `open_faults` counts currently non-terminal fault records and is
/// maintained transactionally with every fault transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    pub game_type: String,
    pub zone: String,
    pub state: MachineState,
    pub manufactured_on: NaiveDate,
    pub fault_frequency: u32,
    pub open_faults: u32,
    pub last_maintenance_on: Option<NaiveDate>,
    pub registered_at: DateTime<Utc>,
}

/// Fields supplied when registering a machine. Everything else starts at
/// its zero value (AVAILABLE, no faults, never maintained).
#[derive(Debug, Clone)]
pub struct NewMachine {
    pub name: String,
    pub game_type: String,
    pub zone: String,
    pub manufactured_on: NaiveDate,
}

impl Machine {
    pub(crate) fn register(spec: NewMachine, now: DateTime<Utc>) -> Self {
        Self {
            id: MachineId::new(),
            name: spec.name,
            game_type: spec.game_type,
            zone: spec.zone,
            state: MachineState::Available,
            manufactured_on: spec.manufactured_on,
            fault_frequency: 0,
            open_faults: 0,
            last_maintenance_on: None,
            registered_at: now,
        }
    }
}
