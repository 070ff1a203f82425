// ── Fault lifecycle manager ──
//
// Owns fault records and their status transitions. Every transition that
// touches the machine runs inside the machine's exclusive section: the
// record transition is validated, the machine effect is computed as a pure
// function, the sink sees the pair, then both commits land together.

use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::OutOfServicePolicy;
use crate::coordinator::Coordinator;
use crate::error::CoreError;
use crate::event::LifecycleEvent;
use crate::model::{Fault, FaultId, FaultPriority, FaultStatus, MachineId, Resolution, UserId};
use crate::persist::TransitionSink;
use crate::store::{Collection, EquipmentRegistry};
use crate::transition::{TransitionKind, machine_effect};

pub(crate) struct FaultManager {
    faults: Collection<FaultId, Fault>,
    registry: Arc<EquipmentRegistry>,
    coordinator: Arc<Coordinator>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn TransitionSink>,
    events: tokio::sync::broadcast::Sender<Arc<LifecycleEvent>>,
    policy: OutOfServicePolicy,
}

impl FaultManager {
    pub(crate) fn new(
        registry: Arc<EquipmentRegistry>,
        coordinator: Arc<Coordinator>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn TransitionSink>,
        events: tokio::sync::broadcast::Sender<Arc<LifecycleEvent>>,
        policy: OutOfServicePolicy,
    ) -> Self {
        Self {
            faults: Collection::new(),
            registry,
            coordinator,
            clock,
            sink,
            events,
            policy,
        }
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Report a fault against a machine. The fault starts REPORTED; if the
    /// machine is not already FAULTED, it becomes FAULTED and its lifetime
    /// fault frequency is bumped — exactly once even when several faults
    /// are reported back to back.
    pub(crate) async fn report(
        &self,
        machine_id: MachineId,
        description: String,
        priority: FaultPriority,
        reporter: UserId,
    ) -> Result<Arc<Fault>, CoreError> {
        self.coordinator
            .with_machine_lock(machine_id, || async {
                let machine = self.registry.get(machine_id)?;

                let fault = Fault {
                    id: FaultId::new(),
                    machine_id,
                    reported_by: reporter,
                    description,
                    status: FaultStatus::Reported,
                    priority,
                    reported_at: self.clock.now(),
                    processing_started_at: None,
                    resolved_at: None,
                    technician: None,
                    notes: None,
                    parts_replaced: None,
                    repair_cost: None,
                };

                let open_after = machine.open_faults + 1;
                let effect =
                    machine_effect(machine.state, TransitionKind::FaultReported, open_after, self.policy);

                let mut next_machine = (*machine).clone();
                next_machine.open_faults = open_after;
                effect.apply_to(&mut next_machine);

                let event = LifecycleEvent::FaultReported {
                    fault: fault.clone(),
                    machine: next_machine,
                };
                self.sink
                    .commit(&event)
                    .map_err(|e| CoreError::Persistence {
                        message: e.to_string(),
                    })?;

                self.faults.upsert(fault.id, fault.clone());
                self.registry.adjust_open_faults(machine_id, 1)?;
                let committed = effect.commit(&self.registry, machine_id)?;

                info!(
                    machine = %machine_id,
                    fault = %fault.id,
                    priority = %fault.priority,
                    machine_state = %committed.state,
                    "fault reported"
                );
                let _ = self.events.send(Arc::new(event));
                Ok(Arc::new(fault))
            })
            .await
    }

    /// Move a REPORTED fault to IN_PROGRESS, assigning the technician and
    /// stamping the processing-start time once. No machine side effect —
    /// the machine was already marked FAULTED at report time.
    pub(crate) async fn start_processing(
        &self,
        fault_id: FaultId,
        technician: UserId,
    ) -> Result<Arc<Fault>, CoreError> {
        let machine_id = self.machine_of(fault_id)?;

        self.coordinator
            .with_machine_lock(machine_id, || async {
                let fault = self.get(fault_id)?;
                ensure_fault_edge(&fault, FaultStatus::InProgress)?;

                let mut next = (*fault).clone();
                next.status = FaultStatus::InProgress;
                next.technician = Some(technician);
                if next.processing_started_at.is_none() {
                    next.processing_started_at = Some(self.clock.now());
                }

                let event = LifecycleEvent::FaultProcessingStarted {
                    fault: next.clone(),
                };
                self.sink
                    .commit(&event)
                    .map_err(|e| CoreError::Persistence {
                        message: e.to_string(),
                    })?;

                let committed = self
                    .faults
                    .update(&fault_id, |_| next)
                    .ok_or(CoreError::FaultNotFound { id: fault_id })?;

                debug!(machine = %machine_id, fault = %fault_id, "fault processing started");
                let _ = self.events.send(Arc::new(event));
                Ok(committed)
            })
            .await
    }

    /// Resolve a fault from REPORTED or IN_PROGRESS, stamping the
    /// resolution time once and merging resolution details. The machine
    /// reverts to AVAILABLE only when this was its last open fault and it
    /// is currently FAULTED.
    pub(crate) async fn resolve(
        &self,
        fault_id: FaultId,
        resolution: Resolution,
    ) -> Result<Arc<Fault>, CoreError> {
        let machine_id = self.machine_of(fault_id)?;

        self.coordinator
            .with_machine_lock(machine_id, || async {
                let fault = self.get(fault_id)?;
                ensure_fault_edge(&fault, FaultStatus::Resolved)?;
                let machine = self.registry.get(machine_id)?;

                let mut next = (*fault).clone();
                next.status = FaultStatus::Resolved;
                if next.resolved_at.is_none() {
                    next.resolved_at = Some(self.clock.now());
                }
                if let Some(technician) = resolution.technician {
                    next.technician = Some(technician);
                }
                if let Some(notes) = resolution.notes {
                    next.notes = Some(notes);
                }
                if let Some(parts) = resolution.parts_replaced {
                    next.parts_replaced = Some(parts);
                }
                if let Some(cost) = resolution.cost {
                    next.repair_cost = Some(cost);
                }

                let open_after = machine.open_faults.saturating_sub(1);
                let effect =
                    machine_effect(machine.state, TransitionKind::FaultResolved, open_after, self.policy);

                let mut next_machine = (*machine).clone();
                next_machine.open_faults = open_after;
                effect.apply_to(&mut next_machine);

                let event = LifecycleEvent::FaultResolved {
                    fault: next.clone(),
                    machine: next_machine,
                };
                self.sink
                    .commit(&event)
                    .map_err(|e| CoreError::Persistence {
                        message: e.to_string(),
                    })?;

                let committed = self
                    .faults
                    .update(&fault_id, |_| next)
                    .ok_or(CoreError::FaultNotFound { id: fault_id })?;
                self.registry.adjust_open_faults(machine_id, -1)?;
                let machine_after = effect.commit(&self.registry, machine_id)?;

                info!(
                    machine = %machine_id,
                    fault = %fault_id,
                    machine_state = %machine_after.state,
                    open_faults = machine_after.open_faults,
                    "fault resolved"
                );
                let _ = self.events.send(Arc::new(event));
                Ok(committed)
            })
            .await
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub(crate) fn get(&self, id: FaultId) -> Result<Arc<Fault>, CoreError> {
        self.faults.get(&id).ok_or(CoreError::FaultNotFound { id })
    }

    /// All faults for a machine, newest report first.
    pub(crate) fn for_machine(&self, machine_id: MachineId) -> Vec<Arc<Fault>> {
        let mut faults: Vec<Arc<Fault>> = self
            .faults
            .snapshot()
            .iter()
            .filter(|f| f.machine_id == machine_id)
            .cloned()
            .collect();
        faults.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
        faults
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Resolve the owning machine before taking its lock. The fault is
    /// re-read inside the section; its machine reference never changes.
    fn machine_of(&self, fault_id: FaultId) -> Result<MachineId, CoreError> {
        Ok(self.get(fault_id)?.machine_id)
    }
}

fn ensure_fault_edge(fault: &Fault, next: FaultStatus) -> Result<(), CoreError> {
    if fault.status.can_advance_to(next) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: "fault",
            from: fault.status.to_string(),
            to: next.to_string(),
        })
    }
}
