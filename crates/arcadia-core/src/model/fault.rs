// ── Fault domain types ──

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;

use super::id::{FaultId, MachineId, UserId};

/// Fault record status. Strictly linear: a fault never moves backward,
/// and RESOLVED is terminal. The direct REPORTED→RESOLVED edge exists for
/// faults repaired on the spot without a processing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultStatus {
    Reported,
    InProgress,
    Resolved,
}

impl FaultStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }

    /// Whether the linear state machine permits advancing to `next`.
    pub fn can_advance_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Reported, Self::InProgress)
                | (Self::Reported, Self::Resolved)
                | (Self::InProgress, Self::Resolved)
        )
    }
}

/// Reporter-assigned urgency. Informational only — it never influences the
/// machine state derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// A reported malfunction, tracked from report through repair.
///
/// All three timestamps are set exactly once: `reported_at` at creation,
/// `processing_started_at` on entering IN_PROGRESS, `resolved_at` on
/// entering RESOLVED.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fault {
    pub id: FaultId,
    pub machine_id: MachineId,
    pub reported_by: UserId,
    pub description: String,
    pub status: FaultStatus,
    pub priority: FaultPriority,
    pub reported_at: DateTime<Utc>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub technician: Option<UserId>,
    pub notes: Option<String>,
    pub parts_replaced: Option<String>,
    pub repair_cost: Option<Decimal>,
}

/// Optional fields merged into a fault on resolution.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub technician: Option<UserId>,
    pub notes: Option<String>,
    pub parts_replaced: Option<String>,
    pub cost: Option<Decimal>,
}

impl Fault {
    /// Time between processing start and resolution, or `None` while
    /// either timestamp is unset.
    pub fn repair_duration(&self) -> Option<Duration> {
        Some(self.resolved_at? - self.processing_started_at?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_order_allows_only_forward_edges() {
        use FaultStatus::{InProgress, Reported, Resolved};

        assert!(Reported.can_advance_to(InProgress));
        assert!(Reported.can_advance_to(Resolved));
        assert!(InProgress.can_advance_to(Resolved));

        assert!(!InProgress.can_advance_to(Reported));
        assert!(!Resolved.can_advance_to(InProgress));
        assert!(!Resolved.can_advance_to(Reported));
        assert!(!Reported.can_advance_to(Reported));
    }

    #[test]
    fn resolved_is_terminal() {
        assert!(FaultStatus::Resolved.is_terminal());
        assert!(!FaultStatus::InProgress.is_terminal());
    }

    #[test]
    fn repair_duration_needs_both_timestamps() {
        let started = Utc::now();
        let fault = Fault {
            id: FaultId::new(),
            machine_id: MachineId::new(),
            reported_by: UserId::from("player1"),
            description: "coin slot jammed".into(),
            status: FaultStatus::Resolved,
            priority: FaultPriority::Medium,
            reported_at: started,
            processing_started_at: Some(started),
            resolved_at: Some(started + Duration::minutes(42)),
            technician: None,
            notes: None,
            parts_replaced: None,
            repair_cost: None,
        };
        assert_eq!(fault.repair_duration(), Some(Duration::minutes(42)));

        let unprocessed = Fault {
            processing_started_at: None,
            ..fault
        };
        assert_eq!(unprocessed.repair_duration(), None);
    }
}
