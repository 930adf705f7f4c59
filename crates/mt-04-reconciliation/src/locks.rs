//! # Per-Key Locks
//!
//! One async mutex per correlation id. Work on the same id is serialized
//! in acquisition order; different ids never contend. Entries are removed
//! once the last holder or waiter releases them.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Holders plus waiters, including waiters that never get the lock.
    users: usize,
}

type LockMap = HashMap<String, Slot>;

/// Async mutexes keyed by string.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    ///
    /// Cancel safe: dropping the future before it resolves gives up the
    /// key's entry just like dropping the guard does.
    pub async fn lock(&self, key: &str) -> KeyedLockGuard {
        let (lease, mutex) = Lease::take(&self.locks, key);
        let guard = mutex.lock_owned().await;
        KeyedLockGuard {
            _guard: guard,
            _lease: lease,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

/// Registration of one caller on a key, from the start of `lock` until
/// its guard or its pending future is dropped.
struct Lease {
    key: String,
    locks: Arc<Mutex<LockMap>>,
}

impl Lease {
    fn take(locks: &Arc<Mutex<LockMap>>, key: &str) -> (Self, Arc<AsyncMutex<()>>) {
        let mut map = locks.lock();
        let slot = map.entry(key.to_string()).or_insert_with(|| Slot {
            mutex: Arc::default(),
            users: 0,
        });
        slot.users += 1;
        let mutex = Arc::clone(&slot.mutex);
        let lease = Self {
            key: key.to_string(),
            locks: Arc::clone(locks),
        };
        (lease, mutex)
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut map = self.locks.lock();
        let Some(slot) = map.get_mut(&self.key) else {
            return;
        };
        slot.users = slot.users.saturating_sub(1);
        if slot.users == 0 {
            map.remove(&self.key);
        }
    }
}

/// Exclusive access to one key; released on drop.
pub struct KeyedLockGuard {
    // field order matters: unlock before the lease can retire the entry
    _guard: OwnedMutexGuard<()>,
    _lease: Lease,
}
