use crate::data::DataProvider;
use schema::{MoveData, MoveId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-battle move registry keyed by [`MoveId`].
///
/// Everything a battle can reference is resolved once at setup. Ids the
/// provider does not know are cached as status-type, zero-effect
/// placeholders, so lookups during a turn never fail.
#[derive(Debug, Clone)]
pub struct MoveCatalog {
    entries: HashMap<MoveId, Arc<MoveData>>,
    struggle: Arc<MoveData>,
}

impl MoveCatalog {
    pub fn new(struggle_power: u16) -> Self {
        Self {
            entries: HashMap::new(),
            struggle: Arc::new(MoveData::struggle(struggle_power)),
        }
    }

    /// Resolve and cache every id in `ids`.
    pub fn preload<'a, P, I>(provider: &P, ids: I, struggle_power: u16) -> Self
    where
        P: DataProvider + ?Sized,
        I: IntoIterator<Item = &'a MoveId>,
    {
        let mut catalog = Self::new(struggle_power);
        for id in ids {
            catalog.resolve(provider, id);
        }
        debug!(moves = catalog.entries.len(), "move catalog preloaded");
        catalog
    }

    /// Resolve one id through the provider and cache it.
    pub fn resolve<P: DataProvider + ?Sized>(&mut self, provider: &P, id: &MoveId) -> Arc<MoveData> {
        if id.is_struggle() {
            return Arc::clone(&self.struggle);
        }
        if let Some(entry) = self.entries.get(id) {
            return Arc::clone(entry);
        }
        let data = match provider.move_data(id) {
            Some(data) => data,
            None => {
                warn!(move_id = %id, "unknown move id, using placeholder");
                MoveData::placeholder(id)
            }
        };
        let entry = Arc::new(data);
        self.entries.insert(id.clone(), Arc::clone(&entry));
        entry
    }

    /// Insert a record directly, bypassing the provider.
    pub fn insert(&mut self, data: MoveData) {
        self.entries.insert(data.metadata.id.clone(), Arc::new(data));
    }

    pub fn get(&self, id: &MoveId) -> Arc<MoveData> {
        if id.is_struggle() {
            return Arc::clone(&self.struggle);
        }
        match self.entries.get(id) {
            Some(entry) => Arc::clone(entry),
            None => {
                warn!(move_id = %id, "move was not preloaded, using placeholder");
                Arc::new(MoveData::placeholder(id))
            }
        }
    }

    pub fn contains(&self, id: &MoveId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
