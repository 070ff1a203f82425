// ── Service facade ──
//
// The entry point the surrounding API layer embeds. Composes the
// registry, the two lifecycle managers, the coordinator, and the
// collaborator seams (clock, sink). Cheaply cloneable via `Arc<Inner>`.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::coordinator::Coordinator;
use crate::error::CoreError;
use crate::event::LifecycleEvent;
use crate::faults::FaultManager;
use crate::maintenance::MaintenanceManager;
use crate::model::{
    Fault, FaultId, FaultPriority, Machine, MachineId, MachineState, Maintenance, MaintenanceId,
    MaintenancePlan, NewMachine, Resolution, UserId,
};
use crate::persist::{NullSink, TransitionSink};
use crate::store::EquipmentRegistry;

const EVENT_CHANNEL_SIZE: usize = 256;

/// The equipment lifecycle service.
///
/// All state-changing operations on a machine — fault transitions,
/// maintenance transitions, the administrative override — are serialized
/// per machine through the [`Coordinator`]; operations on different
/// machines run fully concurrently.
#[derive(Clone)]
pub struct EquipmentService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    registry: Arc<EquipmentRegistry>,
    coordinator: Arc<Coordinator>,
    faults: FaultManager,
    maintenances: MaintenanceManager,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn TransitionSink>,
    events: broadcast::Sender<Arc<LifecycleEvent>>,
}

impl EquipmentService {
    /// Build a service with the default collaborators: wall-clock time and
    /// an in-memory-only (null) persistence sink.
    pub fn new(config: CoreConfig) -> Self {
        Self::with_collaborators(config, Arc::new(SystemClock), Arc::new(NullSink))
    }

    /// Build a service with explicit collaborator seams. The embedding
    /// layer supplies its own clock and a sink satisfying the atomicity
    /// contract (an error aborts the transition whole).
    pub fn with_collaborators(
        config: CoreConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn TransitionSink>,
    ) -> Self {
        let registry = Arc::new(EquipmentRegistry::new());
        let coordinator = Arc::new(Coordinator::new(config.lock_timeout));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        let faults = FaultManager::new(
            Arc::clone(&registry),
            Arc::clone(&coordinator),
            Arc::clone(&clock),
            Arc::clone(&sink),
            events.clone(),
            config.out_of_service,
        );
        let maintenances = MaintenanceManager::new(
            Arc::clone(&registry),
            Arc::clone(&coordinator),
            Arc::clone(&clock),
            Arc::clone(&sink),
            events.clone(),
            config.out_of_service,
        );

        Self {
            inner: Arc::new(ServiceInner {
                registry,
                coordinator,
                faults,
                maintenances,
                clock,
                sink,
                events,
            }),
        }
    }

    // ── Machine administration ───────────────────────────────────────

    /// Register a new machine. Starts AVAILABLE with zero counters.
    pub fn register_machine(&self, spec: NewMachine) -> Result<Arc<Machine>, CoreError> {
        let machine = Machine::register(spec, self.inner.clock.now());

        let event = LifecycleEvent::MachineRegistered {
            machine: machine.clone(),
        };
        self.inner
            .sink
            .commit(&event)
            .map_err(|e| CoreError::Persistence {
                message: e.to_string(),
            })?;

        let id = machine.id;
        self.inner.registry.insert(machine);
        info!(machine = %id, "machine registered");
        let _ = self.inner.events.send(Arc::new(event));
        self.inner.registry.get(id)
    }

    /// Administrative override of a machine's state, bypassing the derived
    /// transition logic. The only way to enter or leave OUT_OF_SERVICE
    /// under the default policy. Serialized like any other transition.
    pub async fn set_machine_state(
        &self,
        id: MachineId,
        state: MachineState,
    ) -> Result<Arc<Machine>, CoreError> {
        self.inner
            .coordinator
            .with_machine_lock(id, || async {
                // NotFound before the sink sees anything.
                let current = self.inner.registry.get(id)?;

                let mut next = (*current).clone();
                next.state = state;
                let event = LifecycleEvent::MachineStateOverridden { machine: next };
                self.inner
                    .sink
                    .commit(&event)
                    .map_err(|e| CoreError::Persistence {
                        message: e.to_string(),
                    })?;

                let machine = self.inner.registry.set_state(id, state)?;
                info!(machine = %id, state = %state, "machine state overridden");
                let _ = self.inner.events.send(Arc::new(event));
                Ok(machine)
            })
            .await
    }

    // ── Fault operations ─────────────────────────────────────────────

    pub async fn report_fault(
        &self,
        machine_id: MachineId,
        description: impl Into<String>,
        priority: FaultPriority,
        reporter: UserId,
    ) -> Result<Arc<Fault>, CoreError> {
        self.inner
            .faults
            .report(machine_id, description.into(), priority, reporter)
            .await
    }

    pub async fn start_fault_processing(
        &self,
        fault_id: FaultId,
        technician: UserId,
    ) -> Result<Arc<Fault>, CoreError> {
        self.inner.faults.start_processing(fault_id, technician).await
    }

    pub async fn resolve_fault(
        &self,
        fault_id: FaultId,
        resolution: Resolution,
    ) -> Result<Arc<Fault>, CoreError> {
        self.inner.faults.resolve(fault_id, resolution).await
    }

    // ── Maintenance operations ───────────────────────────────────────

    pub fn schedule_maintenance(
        &self,
        plan: MaintenancePlan,
    ) -> Result<Arc<Maintenance>, CoreError> {
        self.inner.maintenances.schedule(plan)
    }

    pub async fn start_maintenance(
        &self,
        id: MaintenanceId,
    ) -> Result<Arc<Maintenance>, CoreError> {
        self.inner.maintenances.start(id).await
    }

    pub async fn finish_maintenance(
        &self,
        id: MaintenanceId,
    ) -> Result<Arc<Maintenance>, CoreError> {
        self.inner.maintenances.finish(id).await
    }

    pub async fn cancel_maintenance(
        &self,
        id: MaintenanceId,
    ) -> Result<Arc<Maintenance>, CoreError> {
        self.inner.maintenances.cancel(id).await
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn machine(&self, id: MachineId) -> Result<Arc<Machine>, CoreError> {
        self.inner.registry.get(id)
    }

    pub fn machines_snapshot(&self) -> Arc<Vec<Arc<Machine>>> {
        self.inner.registry.snapshot()
    }

    pub fn fault(&self, id: FaultId) -> Result<Arc<Fault>, CoreError> {
        self.inner.faults.get(id)
    }

    /// Faults for a machine, newest report first.
    pub fn faults_for_machine(&self, id: MachineId) -> Vec<Arc<Fault>> {
        self.inner.faults.for_machine(id)
    }

    pub fn maintenance(&self, id: MaintenanceId) -> Result<Arc<Maintenance>, CoreError> {
        self.inner.maintenances.get(id)
    }

    /// Maintenances for a machine, latest planned start first.
    pub fn maintenances_for_machine(&self, id: MachineId) -> Vec<Arc<Maintenance>> {
        self.inner.maintenances.for_machine(id)
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Subscribe to committed lifecycle transitions.
    pub fn events(&self) -> broadcast::Receiver<Arc<LifecycleEvent>> {
        self.inner.events.subscribe()
    }

    /// Subscribe to machine snapshot changes.
    pub fn subscribe_machines(&self) -> watch::Receiver<Arc<Vec<Arc<Machine>>>> {
        self.inner.registry.subscribe()
    }
}

impl Default for EquipmentService {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}
