// ── Lifecycle coordinator ──
//
// Per-machine exclusive sections. For a given machine, at most one
// registry-mutating transition is in flight at a time; transitions on
// different machines never block each other. tokio's mutex is fair, so
// waiters on the same machine are served in arrival order.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::error::CoreError;
use crate::model::MachineId;

/// Lock table keyed by machine id.
///
/// Entries are created on first use and kept for the machine's lifetime —
/// machines are never deleted while referenced, and one idle mutex per
/// machine is negligible.
pub struct Coordinator {
    locks: DashMap<MachineId, Arc<Mutex<()>>>,
    lock_timeout: Duration,
}

impl Coordinator {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            lock_timeout,
        }
    }

    /// Run `f` inside the machine's exclusive section.
    ///
    /// Acquisition is bounded by the configured timeout; expiry surfaces as
    /// [`CoreError::ConcurrencyTimeout`]. The section is released on every
    /// exit path, including when `f` returns an error.
    pub async fn with_machine_lock<F, Fut, T>(
        &self,
        machine: MachineId,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let lock = self.lock_for(machine);

        let guard = timeout(self.lock_timeout, lock.lock()).await.map_err(|_| {
            CoreError::ConcurrencyTimeout {
                machine,
                waited_ms: u64::try_from(self.lock_timeout.as_millis()).unwrap_or(u64::MAX),
            }
        })?;

        let result = f().await;
        drop(guard);
        result
    }

    fn lock_for(&self, machine: MachineId) -> Arc<Mutex<()>> {
        self.locks
            .entry(machine)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_closure_result() {
        let coordinator = Coordinator::new(Duration::from_secs(1));
        let machine = MachineId::new();

        let out = coordinator
            .with_machine_lock(machine, || async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn releases_on_error_path() {
        let coordinator = Coordinator::new(Duration::from_millis(100));
        let machine = MachineId::new();

        let failed: Result<(), _> = coordinator
            .with_machine_lock(machine, || async {
                Err(CoreError::Persistence {
                    message: "boom".into(),
                })
            })
            .await;
        assert!(failed.is_err());

        // The section must be free again.
        coordinator
            .with_machine_lock(machine, || async { Ok(()) })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn same_machine_sections_are_mutually_exclusive() {
        let coordinator = Arc::new(Coordinator::new(Duration::from_secs(5)));
        let machine = MachineId::new();
        let in_section = Arc::new(AtomicU32::new(0));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let coordinator = Arc::clone(&coordinator);
            let in_section = Arc::clone(&in_section);
            tasks.push(tokio::spawn(async move {
                coordinator
                    .with_machine_lock(machine, || async {
                        let concurrent = in_section.fetch_add(1, Ordering::SeqCst);
                        assert_eq!(concurrent, 0, "two holders inside one section");
                        tokio::task::yield_now().await;
                        in_section.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn different_machines_do_not_block_each_other() {
        let coordinator = Arc::new(Coordinator::new(Duration::from_millis(50)));
        let a = MachineId::new();
        let b = MachineId::new();

        // Hold machine a's section while working on machine b.
        coordinator
            .with_machine_lock(a, || async {
                coordinator
                    .with_machine_lock(b, || async { Ok(()) })
                    .await?;
                Ok(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn bounded_wait_surfaces_timeout() {
        let coordinator = Arc::new(Coordinator::new(Duration::from_millis(20)));
        let machine = MachineId::new();

        let holder = Arc::clone(&coordinator);
        let held = tokio::spawn(async move {
            holder
                .with_machine_lock(machine, || async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(())
                })
                .await
        });

        // Let the holder acquire first.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let err = coordinator
            .with_machine_lock(machine, || async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ConcurrencyTimeout { .. }));
        assert!(err.is_retryable());

        held.await.unwrap().unwrap();
    }
}
