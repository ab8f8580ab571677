use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockTable = DashMap<Uuid, Arc<Mutex<()>>>;

/// Per-user async mutexes serialising cart mutations and order placement.
///
/// An entry lives only while someone holds or waits for it.
#[derive(Clone, Default)]
pub struct UserLocks {
    inner: Arc<LockTable>,
}

/// Releases the user's lock on drop and evicts the entry once unused.
pub struct UserLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    user_id: Uuid,
    table: Arc<LockTable>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, user_id: Uuid) -> UserLockGuard {
        // Clone the Arc out so no map shard stays locked across the await.
        let mutex = self.inner.entry(user_id).or_default().clone();
        let guard = mutex.lock_owned().await;
        UserLockGuard {
            guard: Some(guard),
            user_id,
            table: self.inner.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // The shard lock held by remove_if excludes a concurrent `lock` from
        // cloning the mutex between the count check and the removal.
        self.table
            .remove_if(&self.user_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
