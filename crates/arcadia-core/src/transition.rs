// ── Derived machine-state transitions ──
//
// The machine mutation for each record transition, computed as a pure
// function of (current state, transition kind, open-fault counter,
// out-of-service policy). Managers validate the record transition first,
// call in here, then commit record + effect as one unit inside the
// machine's exclusive section.

use crate::config::OutOfServicePolicy;
use crate::model::MachineState;

/// Record transitions that may touch the owning machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransitionKind {
    /// A fault was reported. The counter is the open-fault count *after*
    /// the report.
    FaultReported,
    /// A fault was resolved. The counter is the open-fault count *after*
    /// the resolve.
    FaultResolved,
    /// A maintenance moved to IN_PROGRESS.
    MaintenanceStarted,
    /// A maintenance left IN_PROGRESS (finished, or cancelled mid-work).
    MaintenanceEnded,
}

/// What the registry must do to the machine, alongside the record commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MachineEffect {
    /// Leave the machine state untouched.
    None,
    /// Overwrite the state; optionally bump the lifetime fault frequency.
    Set {
        state: MachineState,
        bump_fault_frequency: bool,
    },
}

impl MachineEffect {
    /// Apply the effect to an owned machine value. Used to build the
    /// post-state the sink and event subscribers see.
    pub(crate) fn apply_to(self, machine: &mut crate::model::Machine) {
        if let Self::Set {
            state,
            bump_fault_frequency,
        } = self
        {
            machine.state = state;
            if bump_fault_frequency {
                machine.fault_frequency += 1;
            }
        }
    }

    /// Commit the effect through the registry's mutators. Only valid inside
    /// the machine's exclusive section.
    pub(crate) fn commit(
        self,
        registry: &crate::store::EquipmentRegistry,
        id: crate::model::MachineId,
    ) -> Result<std::sync::Arc<crate::model::Machine>, crate::error::CoreError> {
        match self {
            Self::None => registry.get(id),
            Self::Set {
                state,
                bump_fault_frequency,
            } => {
                if bump_fault_frequency {
                    registry.increment_fault_frequency(id)?;
                }
                registry.set_state(id, state)
            }
        }
    }
}

/// Compute the machine effect for a record transition.
///
/// `open_faults` is the non-terminal fault count as it will stand once the
/// record commit lands. Under the `Frozen` policy, OUT_OF_SERVICE absorbs
/// every derived transition (the record still advances; only the machine
/// state is pinned).
pub(crate) fn machine_effect(
    current: MachineState,
    kind: TransitionKind,
    open_faults: u32,
    policy: OutOfServicePolicy,
) -> MachineEffect {
    if current == MachineState::OutOfService && policy == OutOfServicePolicy::Frozen {
        return MachineEffect::None;
    }

    match kind {
        TransitionKind::FaultReported => {
            if current == MachineState::Faulted {
                // Another open fault already marked the machine; counting it
                // again would double-book the frequency.
                MachineEffect::None
            } else {
                MachineEffect::Set {
                    state: MachineState::Faulted,
                    bump_fault_frequency: true,
                }
            }
        }
        TransitionKind::FaultResolved => {
            if current == MachineState::Faulted && open_faults == 0 {
                MachineEffect::Set {
                    state: MachineState::Available,
                    bump_fault_frequency: false,
                }
            } else {
                // Either other faults are still open, or the machine is in a
                // state faults do not own (e.g. UNDER_MAINTENANCE).
                MachineEffect::None
            }
        }
        TransitionKind::MaintenanceStarted => MachineEffect::Set {
            state: MachineState::UnderMaintenance,
            bump_fault_frequency: false,
        },
        TransitionKind::MaintenanceEnded => MachineEffect::Set {
            state: if open_faults > 0 {
                MachineState::Faulted
            } else {
                MachineState::Available
            },
            bump_fault_frequency: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutOfServicePolicy::{Automatic, Frozen};
    use crate::model::MachineState::{Available, Faulted, OutOfService, UnderMaintenance};

    #[test]
    fn first_report_marks_faulted_and_bumps_frequency() {
        assert_eq!(
            machine_effect(Available, TransitionKind::FaultReported, 1, Frozen),
            MachineEffect::Set {
                state: Faulted,
                bump_fault_frequency: true
            }
        );
        // A machine under maintenance is still marked faulted.
        assert_eq!(
            machine_effect(UnderMaintenance, TransitionKind::FaultReported, 1, Frozen),
            MachineEffect::Set {
                state: Faulted,
                bump_fault_frequency: true
            }
        );
    }

    #[test]
    fn report_against_faulted_machine_is_a_no_op() {
        assert_eq!(
            machine_effect(Faulted, TransitionKind::FaultReported, 2, Frozen),
            MachineEffect::None
        );
    }

    #[test]
    fn resolve_reclaims_only_when_last_open_fault_closes() {
        assert_eq!(
            machine_effect(Faulted, TransitionKind::FaultResolved, 0, Frozen),
            MachineEffect::Set {
                state: Available,
                bump_fault_frequency: false
            }
        );
        assert_eq!(
            machine_effect(Faulted, TransitionKind::FaultResolved, 1, Frozen),
            MachineEffect::None
        );
        // Resolve never touches a machine that is under maintenance.
        assert_eq!(
            machine_effect(UnderMaintenance, TransitionKind::FaultResolved, 0, Frozen),
            MachineEffect::None
        );
    }

    #[test]
    fn maintenance_start_always_claims_the_machine() {
        for current in [Available, Faulted] {
            assert_eq!(
                machine_effect(current, TransitionKind::MaintenanceStarted, 0, Frozen),
                MachineEffect::Set {
                    state: UnderMaintenance,
                    bump_fault_frequency: false
                }
            );
        }
    }

    #[test]
    fn maintenance_end_reclaims_by_open_fault_count() {
        assert_eq!(
            machine_effect(UnderMaintenance, TransitionKind::MaintenanceEnded, 0, Frozen),
            MachineEffect::Set {
                state: Available,
                bump_fault_frequency: false
            }
        );
        assert_eq!(
            machine_effect(UnderMaintenance, TransitionKind::MaintenanceEnded, 3, Frozen),
            MachineEffect::Set {
                state: Faulted,
                bump_fault_frequency: false
            }
        );
    }

    #[test]
    fn frozen_out_of_service_absorbs_everything() {
        for kind in [
            TransitionKind::FaultReported,
            TransitionKind::FaultResolved,
            TransitionKind::MaintenanceStarted,
            TransitionKind::MaintenanceEnded,
        ] {
            assert_eq!(
                machine_effect(OutOfService, kind, 1, Frozen),
                MachineEffect::None,
                "{kind:?}"
            );
        }
    }

    #[test]
    fn automatic_policy_lets_transitions_leave_out_of_service() {
        assert_eq!(
            machine_effect(OutOfService, TransitionKind::FaultReported, 1, Automatic),
            MachineEffect::Set {
                state: Faulted,
                bump_fault_frequency: true
            }
        );
        assert_eq!(
            machine_effect(OutOfService, TransitionKind::MaintenanceStarted, 0, Automatic),
            MachineEffect::Set {
                state: UnderMaintenance,
                bump_fault_frequency: false
            }
        );
    }
}
