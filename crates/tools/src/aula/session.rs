//! Login-session cache with per-key single-flight refresh.
//!
//! Readers holding a fresh entry never wait on a refresh. When an entry is
//! missing or expired, the first caller logs in while later callers for the
//! same key queue on that key's refresh lock and reuse its result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

struct Cached<T> {
    value: Arc<T>,
    created_at: Instant,
}

impl<T> Clone for Cached<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            created_at: self.created_at,
        }
    }
}

struct Slot<T> {
    current: RwLock<Option<Cached<T>>>,
    refresh: Mutex<()>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }
}

pub struct SessionCache<T> {
    ttl: Duration,
    slots: RwLock<HashMap<String, Arc<Slot<T>>>>,
}

impl<T> SessionCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, key: &str) -> Arc<Slot<T>> {
        if let Some(slot) = self.slots.read().await.get(key) {
            return Arc::clone(slot);
        }
        Arc::clone(self.slots.write().await.entry(key.to_string()).or_default())
    }

    fn fresh(&self, cached: &Option<Cached<T>>) -> Option<Arc<T>> {
        cached
            .as_ref()
            .filter(|c| c.created_at.elapsed() < self.ttl)
            .map(|c| Arc::clone(&c.value))
    }

    /// Cached value for `key`, or the result of `login` when there is none.
    pub async fn get_or_refresh<F, Fut, E>(&self, key: &str, login: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let slot = self.slot(key).await;

        if let Some(value) = self.fresh(&*slot.current.read().await) {
            return Ok(value);
        }

        let _refreshing = slot.refresh.lock().await;

        // Another caller may have refreshed while we queued.
        if let Some(value) = self.fresh(&*slot.current.read().await) {
            debug!(key, "Reusing session refreshed by a concurrent caller");
            return Ok(value);
        }

        info!(key, "Refreshing login session");
        let value = Arc::new(login().await?);
        *slot.current.write().await = Some(Cached {
            value: Arc::clone(&value),
            created_at: Instant::now(),
        });
        Ok(value)
    }

    /// Drop `stale` if it is still the cached value for `key`.
    pub async fn invalidate(&self, key: &str, stale: &Arc<T>) {
        let slot = self.slot(key).await;
        let mut current = slot.current.write().await;
        if current
            .as_ref()
            .is_some_and(|c| Arc::ptr_eq(&c.value, stale))
        {
            debug!(key, "Invalidating login session");
            *current = None;
        }
    }
}
