// ── Maintenance lifecycle manager ──
//
// Owns maintenance records and their state transitions. Scheduling never
// touches the machine; start claims it (UNDER_MAINTENANCE); finish and
// cancel-while-in-progress reclaim it based on the open-fault counter, so
// a fault reported mid-maintenance is not silently cleared.

use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::OutOfServicePolicy;
use crate::coordinator::Coordinator;
use crate::error::CoreError;
use crate::event::LifecycleEvent;
use crate::model::{Machine, MachineId, Maintenance, MaintenanceId, MaintenancePlan, MaintenanceState};
use crate::persist::TransitionSink;
use crate::store::{Collection, EquipmentRegistry};
use crate::transition::{MachineEffect, TransitionKind, machine_effect};

pub(crate) struct MaintenanceManager {
    maintenances: Collection<MaintenanceId, Maintenance>,
    registry: Arc<EquipmentRegistry>,
    coordinator: Arc<Coordinator>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn TransitionSink>,
    events: tokio::sync::broadcast::Sender<Arc<LifecycleEvent>>,
    policy: OutOfServicePolicy,
}

impl MaintenanceManager {
    pub(crate) fn new(
        registry: Arc<EquipmentRegistry>,
        coordinator: Arc<Coordinator>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn TransitionSink>,
        events: tokio::sync::broadcast::Sender<Arc<LifecycleEvent>>,
        policy: OutOfServicePolicy,
    ) -> Self {
        Self {
            maintenances: Collection::new(),
            registry,
            coordinator,
            clock,
            sink,
            events,
            policy,
        }
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Schedule a maintenance in PLANNED. The machine keeps whatever state
    /// it currently has.
    pub(crate) fn schedule(&self, plan: MaintenancePlan) -> Result<Arc<Maintenance>, CoreError> {
        let machine_id = plan.machine_id;
        if !self.registry.contains(machine_id) {
            return Err(CoreError::MachineNotFound { id: machine_id });
        }

        let maintenance = Maintenance::schedule(plan);
        let event = LifecycleEvent::MaintenanceScheduled {
            maintenance: maintenance.clone(),
        };
        self.sink
            .commit(&event)
            .map_err(|e| CoreError::Persistence {
                message: e.to_string(),
            })?;

        self.maintenances
            .upsert(maintenance.id, maintenance.clone());

        info!(
            machine = %machine_id,
            maintenance = %maintenance.id,
            kind = %maintenance.kind,
            planned_start = %maintenance.planned_start,
            "maintenance scheduled"
        );
        let _ = self.events.send(Arc::new(event));
        Ok(Arc::new(maintenance))
    }

    /// Start a PLANNED maintenance: stamp the actual start and claim the
    /// machine (UNDER_MAINTENANCE), unconditionally.
    pub(crate) async fn start(&self, id: MaintenanceId) -> Result<Arc<Maintenance>, CoreError> {
        let machine_id = self.machine_of(id)?;

        self.coordinator
            .with_machine_lock(machine_id, || async {
                let maintenance = self.get(id)?;
                ensure_maintenance_edge(&maintenance, MaintenanceState::InProgress)?;
                let machine = self.registry.get(machine_id)?;

                let mut next = (*maintenance).clone();
                next.state = MaintenanceState::InProgress;
                if next.actual_start.is_none() {
                    next.actual_start = Some(self.clock.now());
                }

                let effect = machine_effect(
                    machine.state,
                    TransitionKind::MaintenanceStarted,
                    machine.open_faults,
                    self.policy,
                );
                let next_machine = preview(&machine, effect);

                let event = LifecycleEvent::MaintenanceStarted {
                    maintenance: next.clone(),
                    machine: next_machine,
                };
                self.sink
                    .commit(&event)
                    .map_err(|e| CoreError::Persistence {
                        message: e.to_string(),
                    })?;

                let committed = self
                    .maintenances
                    .update(&id, |_| next)
                    .ok_or(CoreError::MaintenanceNotFound { id })?;
                let machine_after = effect.commit(&self.registry, machine_id)?;

                info!(
                    machine = %machine_id,
                    maintenance = %id,
                    machine_state = %machine_after.state,
                    "maintenance started"
                );
                let _ = self.events.send(Arc::new(event));
                Ok(committed)
            })
            .await
    }

    /// Finish an IN_PROGRESS maintenance: stamp the actual end, record it
    /// as the machine's last-maintenance date, and reclaim the machine
    /// (FAULTED if open faults remain, AVAILABLE otherwise).
    pub(crate) async fn finish(&self, id: MaintenanceId) -> Result<Arc<Maintenance>, CoreError> {
        let machine_id = self.machine_of(id)?;

        self.coordinator
            .with_machine_lock(machine_id, || async {
                let maintenance = self.get(id)?;
                ensure_maintenance_edge(&maintenance, MaintenanceState::Done)?;
                let machine = self.registry.get(machine_id)?;

                let mut next = (*maintenance).clone();
                next.state = MaintenanceState::Done;
                let actual_end = next.actual_end.unwrap_or_else(|| self.clock.now());
                next.actual_end = Some(actual_end);

                let effect = machine_effect(
                    machine.state,
                    TransitionKind::MaintenanceEnded,
                    machine.open_faults,
                    self.policy,
                );
                let mut next_machine = preview(&machine, effect);
                next_machine.last_maintenance_on = Some(actual_end.date_naive());

                let event = LifecycleEvent::MaintenanceFinished {
                    maintenance: next.clone(),
                    machine: next_machine,
                };
                self.sink
                    .commit(&event)
                    .map_err(|e| CoreError::Persistence {
                        message: e.to_string(),
                    })?;

                let committed = self
                    .maintenances
                    .update(&id, |_| next)
                    .ok_or(CoreError::MaintenanceNotFound { id })?;
                self.registry
                    .set_last_maintenance_date(machine_id, actual_end.date_naive())?;
                let machine_after = effect.commit(&self.registry, machine_id)?;

                info!(
                    machine = %machine_id,
                    maintenance = %id,
                    machine_state = %machine_after.state,
                    "maintenance finished"
                );
                let _ = self.events.send(Arc::new(event));
                Ok(committed)
            })
            .await
    }

    /// Cancel a PLANNED or IN_PROGRESS maintenance. Cancelling from
    /// PLANNED never touches the machine; cancelling mid-work reclaims it
    /// the same way `finish` does.
    pub(crate) async fn cancel(&self, id: MaintenanceId) -> Result<Arc<Maintenance>, CoreError> {
        let machine_id = self.machine_of(id)?;

        self.coordinator
            .with_machine_lock(machine_id, || async {
                let maintenance = self.get(id)?;
                ensure_maintenance_edge(&maintenance, MaintenanceState::Cancelled)?;
                let machine = self.registry.get(machine_id)?;

                let was_in_progress = maintenance.state == MaintenanceState::InProgress;
                let mut next = (*maintenance).clone();
                next.state = MaintenanceState::Cancelled;

                let effect = if was_in_progress {
                    machine_effect(
                        machine.state,
                        TransitionKind::MaintenanceEnded,
                        machine.open_faults,
                        self.policy,
                    )
                } else {
                    MachineEffect::None
                };
                let next_machine = preview(&machine, effect);

                let event = LifecycleEvent::MaintenanceCancelled {
                    maintenance: next.clone(),
                    machine: next_machine,
                };
                self.sink
                    .commit(&event)
                    .map_err(|e| CoreError::Persistence {
                        message: e.to_string(),
                    })?;

                let committed = self
                    .maintenances
                    .update(&id, |_| next)
                    .ok_or(CoreError::MaintenanceNotFound { id })?;
                let machine_after = effect.commit(&self.registry, machine_id)?;

                debug!(
                    machine = %machine_id,
                    maintenance = %id,
                    was_in_progress,
                    machine_state = %machine_after.state,
                    "maintenance cancelled"
                );
                let _ = self.events.send(Arc::new(event));
                Ok(committed)
            })
            .await
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub(crate) fn get(&self, id: MaintenanceId) -> Result<Arc<Maintenance>, CoreError> {
        self.maintenances
            .get(&id)
            .ok_or(CoreError::MaintenanceNotFound { id })
    }

    /// All maintenances for a machine, latest planned start first.
    pub(crate) fn for_machine(&self, machine_id: MachineId) -> Vec<Arc<Maintenance>> {
        let mut maintenances: Vec<Arc<Maintenance>> = self
            .maintenances
            .snapshot()
            .iter()
            .filter(|m| m.machine_id == machine_id)
            .cloned()
            .collect();
        maintenances.sort_by(|a, b| b.planned_start.cmp(&a.planned_start));
        maintenances
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn machine_of(&self, id: MaintenanceId) -> Result<MachineId, CoreError> {
        Ok(self.get(id)?.machine_id)
    }
}

fn preview(machine: &Machine, effect: MachineEffect) -> Machine {
    let mut next = machine.clone();
    effect.apply_to(&mut next);
    next
}

fn ensure_maintenance_edge(
    maintenance: &Maintenance,
    next: MaintenanceState,
) -> Result<(), CoreError> {
    if maintenance.state.can_advance_to(next) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: "maintenance",
            from: maintenance.state.to_string(),
            to: next.to_string(),
        })
    }
}
