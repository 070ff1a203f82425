// ── Maintenance domain types ──

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;

use super::id::{MachineId, MaintenanceId, UserId};

/// Maintenance record state.
///
/// PLANNED → IN_PROGRESS → DONE, with CANCELLED reachable from PLANNED or
/// IN_PROGRESS. DONE and CANCELLED have no outgoing edges; other fields may
/// still be corrected on a terminal record, but never the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceState {
    Planned,
    InProgress,
    Done,
    Cancelled,
}

impl MaintenanceState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// Whether the state machine permits advancing to `next`.
    pub fn can_advance_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Planned, Self::InProgress)
                | (Self::InProgress, Self::Done)
                | (Self::Planned, Self::Cancelled)
                | (Self::InProgress, Self::Cancelled)
        )
    }
}

/// Why the maintenance exists. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceKind {
    Preventive,
    Corrective,
    Predictive,
}

/// A planned or corrective service action, tracked from scheduling through
/// completion. `actual_start`/`actual_end` are stamped exactly once, on
/// entering IN_PROGRESS and DONE respectively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maintenance {
    pub id: MaintenanceId,
    pub machine_id: MachineId,
    pub technician: UserId,
    pub state: MaintenanceState,
    pub kind: MaintenanceKind,
    pub planned_start: NaiveDate,
    pub planned_end: Option<NaiveDate>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub cost: Decimal,
    pub description: Option<String>,
    pub parts_used: Option<String>,
}

/// Fields supplied when scheduling a maintenance.
#[derive(Debug, Clone)]
pub struct MaintenancePlan {
    pub machine_id: MachineId,
    pub technician: UserId,
    pub kind: MaintenanceKind,
    pub planned_start: NaiveDate,
    pub planned_end: Option<NaiveDate>,
    pub cost: Decimal,
    pub description: Option<String>,
}

impl Maintenance {
    pub(crate) fn schedule(plan: MaintenancePlan) -> Self {
        Self {
            id: MaintenanceId::new(),
            machine_id: plan.machine_id,
            technician: plan.technician,
            state: MaintenanceState::Planned,
            kind: plan.kind,
            planned_start: plan.planned_start,
            planned_end: plan.planned_end,
            actual_start: None,
            actual_end: None,
            cost: plan.cost,
            description: plan.description,
            parts_used: None,
        }
    }
}
