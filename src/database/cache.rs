use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};

use crate::database::models::TenantId;

struct Slot<H> {
    cell: OnceCell<H>,
    /// Set under the map write lock when an eviction hands the handle out
    taken: AtomicBool,
}

impl<H: Clone> Slot<H> {
    fn empty() -> Self {
        Self {
            cell: OnceCell::new(),
            taken: AtomicBool::new(false),
        }
    }

    fn filled(handle: H) -> Self {
        Self {
            cell: OnceCell::from(handle),
            taken: AtomicBool::new(false),
        }
    }

    /// Called with the slot already unlinked from the map
    fn evict(&self) -> Option<H> {
        let handle = self.cell.get().cloned();
        if handle.is_some() {
            self.taken.store(true, Ordering::SeqCst);
        }
        handle
    }
}

/// Result of [`ConnectionCache::get_or_try_open`]
#[derive(Debug, PartialEq)]
pub enum Lookup<H> {
    /// The handle is held by the cache
    Cached(H),
    /// The slot was evicted while the open was in flight. When `owned` is set
    /// the caller must close `handle`; nobody else will.
    Evicted { handle: H, owned: bool },
}

/// Process-wide map of tenant id to live client handle.
///
/// Each tenant gets its own `OnceCell` slot so concurrent first accesses to the
/// same tenant share one open instead of racing.
pub struct ConnectionCache<H> {
    slots: RwLock<HashMap<TenantId, Arc<Slot<H>>>>,
}

impl<H> Default for ConnectionCache<H> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl<H: Clone + Send + Sync> ConnectionCache<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached handle, if one has been opened
    pub async fn get(&self, tenant_id: &TenantId) -> Option<H> {
        let slots = self.slots.read().await;
        slots.get(tenant_id).and_then(|slot| slot.cell.get().cloned())
    }

    /// Return the cached handle or run `open` exactly once per tenant.
    ///
    /// A failed open leaves the slot empty so the next caller retries.
    pub async fn get_or_try_open<F, Fut, E>(&self, tenant_id: &TenantId, open: F) -> Result<Lookup<H>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<H, E>>,
    {
        let slot = self.slot(tenant_id).await;
        let mut opened_here = false;
        let handle = slot
            .cell
            .get_or_try_init(|| {
                opened_here = true;
                open()
            })
            .await?
            .clone();

        let slots = self.slots.read().await;
        if slots.get(tenant_id).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
            return Ok(Lookup::Cached(handle));
        }
        // Evicted mid-open. If the evictor saw the handle it closes it.
        let owned = opened_here && !slot.taken.load(Ordering::SeqCst);
        Ok(Lookup::Evicted { handle, owned })
    }

    async fn slot(&self, tenant_id: &TenantId) -> Arc<Slot<H>> {
        // Fast path: try read lock
        {
            let slots = self.slots.read().await;
            if let Some(slot) = slots.get(tenant_id) {
                return slot.clone();
            }
        }

        let mut slots = self.slots.write().await;
        slots
            .entry(tenant_id.clone())
            .or_insert_with(|| Arc::new(Slot::empty()))
            .clone()
    }

    /// Seed a handle, returning the one it replaced
    pub async fn insert(&self, tenant_id: TenantId, handle: H) -> Option<H> {
        let mut slots = self.slots.write().await;
        slots
            .insert(tenant_id, Arc::new(Slot::filled(handle)))
            .and_then(|previous| previous.evict())
    }

    /// Evict one tenant's slot. An open still in flight for the evicted slot
    /// completes and its caller receives [`Lookup::Evicted`].
    pub async fn remove(&self, tenant_id: &TenantId) -> Option<H> {
        let mut slots = self.slots.write().await;
        slots.remove(tenant_id).and_then(|slot| slot.evict())
    }

    /// Empty the cache, returning every opened handle
    pub async fn drain(&self) -> Vec<(TenantId, H)> {
        let mut slots = self.slots.write().await;
        slots
            .drain()
            .filter_map(|(tenant_id, slot)| slot.evict().map(|handle| (tenant_id, handle)))
            .collect()
    }

    /// Ids of tenants with an opened handle, sorted
    pub async fn tenant_ids(&self) -> Vec<TenantId> {
        let slots = self.slots.read().await;
        let mut ids: Vec<TenantId> = slots
            .iter()
            .filter(|(_, slot)| slot.cell.initialized())
            .map(|(tenant_id, _)| tenant_id.clone())
            .collect();
        ids.sort();
        ids
    }
}
