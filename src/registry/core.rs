use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::manifest::{SlotConfig, SlotMap, SlotPosition};

pub type SharedRegistry = Arc<SlotRegistry>;

#[derive(Debug)]
struct Entry {
    registration_id: u64,
    config: SlotConfig,
}

#[derive(Debug, Default)]
struct Table {
    explicit: BTreeMap<SlotPosition, Entry>,
    defaults: BTreeMap<SlotPosition, SlotConfig>,
    next_registration: u64,
}

/// Explicit and default slot registrations plus a monotonic version counter.
///
/// Mutations are serialized by an internal mutex. The version is bumped while
/// the lock is held, so a reader that observes version `v` and then calls
/// [`SlotRegistry::get_all`] sees a table at least as new as `v`.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    table: Mutex<Table>,
    version: AtomicU64,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Self::new())
    }

    /// Store (or replace) the explicit config for `position`.
    pub fn register(self: &Arc<Self>, position: SlotPosition, config: SlotConfig) -> Registration {
        let registration_id = {
            let mut table = self.table();
            table.next_registration += 1;
            let registration_id = table.next_registration;
            table.explicit.insert(
                position,
                Entry {
                    registration_id,
                    config,
                },
            );
            self.bump();
            registration_id
        };

        Registration {
            registry: Arc::downgrade(self),
            position,
            registration_id,
        }
    }

    /// Store a fallback used only while no explicit config exists for `position`.
    pub fn register_default(&self, position: SlotPosition, config: SlotConfig) {
        let mut table = self.table();
        table.defaults.insert(position, config);
        self.bump();
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Defaults overlaid with explicit registrations.
    pub fn get_all(&self) -> SlotMap {
        let table = self.table();
        let mut merged: SlotMap = table.defaults.clone();
        for (position, entry) in &table.explicit {
            merged.insert(*position, entry.config.clone());
        }
        merged
    }

    pub fn has_explicit(&self, position: SlotPosition) -> bool {
        self.table().explicit.contains_key(&position)
    }

    /// Removes the explicit entry only if it still belongs to
    /// `registration_id`; the version is bumped either way.
    fn unregister(&self, position: SlotPosition, registration_id: u64) -> bool {
        let mut table = self.table();
        let owned = table
            .explicit
            .get(&position)
            .is_some_and(|entry| entry.registration_id == registration_id);
        if owned {
            table.explicit.remove(&position);
        }
        self.bump();
        owned
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle returned by [`SlotRegistry::register`]. Dropping it leaves the
/// registration in place; call [`Registration::unregister`] to remove it.
#[must_use = "dropping a registration handle makes it impossible to unregister"]
#[derive(Debug)]
pub struct Registration {
    registry: Weak<SlotRegistry>,
    position: SlotPosition,
    registration_id: u64,
}

impl Registration {
    pub fn position(&self) -> SlotPosition {
        self.position
    }

    /// Remove the registration. Returns `false` when the position was
    /// re-registered in the meantime or the registry is gone.
    pub fn unregister(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.unregister(self.position, self.registration_id),
            None => false,
        }
    }
}
