// ── Equipment registry ──
//
// Canonical state of every machine. A pure state holder: it performs no
// transition-level locking and derives nothing itself. All mutators are
// called only while the caller holds the Coordinator's exclusive section
// for that machine.

mod collection;

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::watch;

pub(crate) use collection::Collection;

use crate::error::CoreError;
use crate::model::{Machine, MachineId, MachineState};

/// Registry of machines, the single source of truth for availability state.
pub struct EquipmentRegistry {
    machines: Collection<MachineId, Machine>,
}

impl EquipmentRegistry {
    pub fn new() -> Self {
        Self {
            machines: Collection::new(),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn get(&self, id: MachineId) -> Result<Arc<Machine>, CoreError> {
        self.machines
            .get(&id)
            .ok_or(CoreError::MachineNotFound { id })
    }

    pub fn contains(&self, id: MachineId) -> bool {
        self.machines.contains(&id)
    }

    pub fn snapshot(&self) -> Arc<Vec<Arc<Machine>>> {
        self.machines.snapshot()
    }

    /// Subscribe to machine snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Machine>>>> {
        self.machines.subscribe()
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.len() == 0
    }

    // ── Mutations (exclusive section only) ───────────────────────────

    /// Add a newly registered machine.
    pub(crate) fn insert(&self, machine: Machine) {
        self.machines.upsert(machine.id, machine);
    }

    /// Unconditional state overwrite: the target of a derived transition or
    /// an explicit administrative override.
    pub(crate) fn set_state(
        &self,
        id: MachineId,
        state: MachineState,
    ) -> Result<Arc<Machine>, CoreError> {
        self.update(id, |m| m.state = state)
    }

    /// Bump the lifetime fault-frequency counter.
    pub(crate) fn increment_fault_frequency(
        &self,
        id: MachineId,
    ) -> Result<Arc<Machine>, CoreError> {
        self.update(id, |m| m.fault_frequency += 1)
    }

    /// Adjust the non-terminal-fault counter. Saturates at zero rather than
    /// underflowing on a double resolve.
    pub(crate) fn adjust_open_faults(
        &self,
        id: MachineId,
        delta: i32,
    ) -> Result<Arc<Machine>, CoreError> {
        self.update(id, |m| {
            m.open_faults = m.open_faults.saturating_add_signed(delta);
        })
    }

    pub(crate) fn set_last_maintenance_date(
        &self,
        id: MachineId,
        date: NaiveDate,
    ) -> Result<Arc<Machine>, CoreError> {
        self.update(id, |m| m.last_maintenance_on = Some(date))
    }

    fn update<F>(&self, id: MachineId, f: F) -> Result<Arc<Machine>, CoreError>
    where
        F: FnOnce(&mut Machine),
    {
        self.machines
            .update(&id, |current| {
                let mut next = current.clone();
                f(&mut next);
                next
            })
            .ok_or(CoreError::MachineNotFound { id })
    }
}

impl Default for EquipmentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::NewMachine;
    use chrono::Utc;

    fn seeded() -> (EquipmentRegistry, MachineId) {
        let registry = EquipmentRegistry::new();
        let machine = Machine::register(
            NewMachine {
                name: "Street Fighter II".into(),
                game_type: "fighting".into(),
                zone: "tournament-row".into(),
                manufactured_on: NaiveDate::from_ymd_opt(1992, 2, 1).unwrap(),
            },
            Utc::now(),
        );
        let id = machine.id;
        registry.insert(machine);
        (registry, id)
    }

    #[test]
    fn get_unknown_machine_is_not_found() {
        let registry = EquipmentRegistry::new();
        let id = MachineId::new();
        assert!(matches!(
            registry.get(id),
            Err(CoreError::MachineNotFound { id: missing }) if missing == id
        ));
    }

    #[test]
    fn set_state_overwrites_unconditionally() {
        let (registry, id) = seeded();
        let machine = registry.set_state(id, MachineState::OutOfService).unwrap();
        assert_eq!(machine.state, MachineState::OutOfService);
        assert_eq!(registry.get(id).unwrap().state, MachineState::OutOfService);
    }

    #[test]
    fn counters_and_dates_update_in_place() {
        let (registry, id) = seeded();

        registry.increment_fault_frequency(id).unwrap();
        registry.adjust_open_faults(id, 2).unwrap();
        let machine = registry.adjust_open_faults(id, -1).unwrap();
        assert_eq!(machine.fault_frequency, 1);
        assert_eq!(machine.open_faults, 1);

        let date = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let machine = registry.set_last_maintenance_date(id, date).unwrap();
        assert_eq!(machine.last_maintenance_on, Some(date));
    }

    #[test]
    fn open_faults_saturates_at_zero() {
        let (registry, id) = seeded();
        let machine = registry.adjust_open_faults(id, -3).unwrap();
        assert_eq!(machine.open_faults, 0);
    }
}
