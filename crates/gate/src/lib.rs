#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Key-scoped mutual exclusion
//!
//! A [`GateRegistry`] hands out one async mutex per artifact key. Gates are
//! created on first use and removed once no holder or waiter references them,
//! so the registry only grows with the number of keys currently in flight.
//!
//! Removal happens under the same shard lock as get-or-create and only when
//! the registry's own reference is the last one. A caller that found the gate
//! still holds a reference while it waits, so it can never be handed a gate
//! that is being removed.

use dashmap::DashMap;
use modelsync_errors::Error;
use modelsync_types::ArtifactKey;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::debug;

type Gate = Arc<Mutex<()>>;
type Gates = Arc<DashMap<ArtifactKey, Gate>>;

/// Registry of per-key gates
///
/// Cheap to clone; clones share the same gates.
#[derive(Debug, Clone, Default)]
pub struct GateRegistry {
    gates: Gates,
}

impl GateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    ///
    /// Callers for distinct keys never block each other.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if `cancel` fires before the gate is
    /// obtained. No gate is held and no reference is leaked in that case.
    pub async fn acquire(
        &self,
        key: &ArtifactKey,
        cancel: &CancellationToken,
    ) -> Result<GateGuard, Error> {
        // Declared before the lock future so it is dropped after it
        let mut waiter = Waiter {
            gates: &self.gates,
            key,
            armed: true,
        };

        let gate = Arc::clone(self.gates.entry(key.clone()).or_default().value());

        let lock = match Arc::clone(&gate).try_lock_owned() {
            Ok(lock) => lock,
            Err(_) => {
                debug!(%key, "gate busy, waiting");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                    lock = gate.lock_owned() => lock,
                }
            }
        };

        waiter.armed = false;
        Ok(GateGuard {
            key: key.clone(),
            lock: Some(lock),
            gates: Arc::clone(&self.gates),
        })
    }

    /// Number of gates currently held or awaited
    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Whether a gate for `key` is currently held or awaited
    #[must_use]
    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.gates.contains_key(key)
    }
}

/// Drop the registry entry for `key` if nobody else references it
fn prune(gates: &DashMap<ArtifactKey, Gate>, key: &ArtifactKey) {
    if gates
        .remove_if(key, |_, gate| Arc::strong_count(gate) == 1)
        .is_some()
    {
        debug!(%key, "gate removed");
    }
}

/// Prunes the entry when an acquire is abandoned
struct Waiter<'a> {
    gates: &'a DashMap<ArtifactKey, Gate>,
    key: &'a ArtifactKey,
    armed: bool,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if self.armed {
            prune(self.gates, self.key);
        }
    }
}

/// Exclusive access to one key, released on drop
#[derive(Debug)]
pub struct GateGuard {
    key: ArtifactKey,
    lock: Option<OwnedMutexGuard<()>>,
    gates: Gates,
}

impl GateGuard {
    #[must_use]
    pub fn key(&self) -> &ArtifactKey {
        &self.key
    }

    /// Release the gate explicitly
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        // Unlock and give up our reference first so the count reflects waiters only
        drop(self.lock.take());
        prune(&self.gates, &self.key);
    }
}
