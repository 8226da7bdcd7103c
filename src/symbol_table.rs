//! Fixed-capacity, double-buffered symbol table.
//!
//! Loads accumulate into a shadow map; a commit swaps which map is active
//! in a single release-ordered pointer store via [`arc_swap::ArcSwap`], the
//! same lock-free "swap a whole structure" idiom used elsewhere on this
//! crate's hot paths. The data path takes one acquire load per lookup and
//! otherwise never synchronizes.

use crate::common::{PipelineError, SymbolIndex, SymbolKey, MAX_SYMBOLS};
use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex};

const PROBE_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    Occupied(SymbolKey, SymbolIndex),
}

/// One generation of the hash map: a fixed-size open-addressed table with
/// linear probing, capacity `MAX_SYMBOLS` (must be a power of two).
#[derive(Debug, Clone)]
struct Map {
    slots: Vec<Slot>,
    mask: u32,
}

impl Map {
    fn new() -> Self {
        assert!(MAX_SYMBOLS.is_power_of_two(), "MAX_SYMBOLS must be a power of two");
        Self {
            slots: vec![Slot::Empty; MAX_SYMBOLS],
            mask: (MAX_SYMBOLS - 1) as u32,
        }
    }

    /// Fold the 8-byte key to 32 bits by XOR of the two halves, then mix,
    /// then mask to the table's bit width.
    fn hash(&self, key: &SymbolKey) -> u32 {
        let lo = u32::from_le_bytes(key[0..4].try_into().unwrap());
        let hi = u32::from_le_bytes(key[4..8].try_into().unwrap());
        let mut h = lo ^ hi;
        h ^= h >> 16;
        h ^= h >> 8;
        h & self.mask
    }

    fn lookup(&self, key: &SymbolKey) -> Option<SymbolIndex> {
        let start = self.hash(key) as usize;
        for probe in 0..PROBE_LIMIT {
            let idx = (start + probe) & (self.mask as usize);
            match self.slots[idx] {
                Slot::Empty => return None,
                Slot::Occupied(k, v) if k == *key => return Some(v),
                Slot::Occupied(_, _) => continue,
            }
        }
        None
    }

    fn insert(&mut self, key: SymbolKey, index: SymbolIndex) -> Result<(), PipelineError> {
        let start = self.hash(&key) as usize;
        for probe in 0..PROBE_LIMIT {
            let idx = (start + probe) & (self.mask as usize);
            match self.slots[idx] {
                Slot::Empty => {
                    self.slots[idx] = Slot::Occupied(key, index);
                    return Ok(());
                }
                Slot::Occupied(k, _) if k == key => {
                    self.slots[idx] = Slot::Occupied(key, index);
                    return Ok(());
                }
                Slot::Occupied(_, _) => continue,
            }
        }
        tracing::warn!("symbol table full, rejecting load");
        Err(PipelineError::SymbolTableFull)
    }
}

/// Double-buffered symbol table: an active map the data path reads without
/// synchronization beyond the commit's release store, and a shadow map
/// loads accumulate into. Shareable as `Arc<SymbolTable>` between the data
/// path (lookups only) and the configuration side-channel (loads/commits).
#[derive(Debug)]
pub struct SymbolTable {
    active: ArcSwap<Map>,
    shadow: Mutex<Map>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            active: ArcSwap::from_pointee(Map::new()),
            shadow: Mutex::new(Map::new()),
        }
    }

    /// Look up a symbol key in the active map (data-path hot path).
    #[inline]
    pub fn lookup(&self, key: &SymbolKey) -> Option<SymbolIndex> {
        self.active.load().lookup(key)
    }

    /// Load `(key, index)` into the shadow map. Does not affect lookups
    /// until [`SymbolTable::commit`] is called.
    pub fn load_symbol(&self, key: SymbolKey, index: SymbolIndex) -> Result<(), PipelineError> {
        self.shadow.lock().unwrap().insert(key, index)
    }

    /// Publish the shadow map as the new active map in a single release
    /// store, then clear the shadow. Each commit is a full reload of the
    /// visible universe: a symbol loaded in one epoch but not reloaded in
    /// the next is no longer resolvable once that next epoch commits. Only
    /// one commit may be in flight at a time; the load adapter is expected
    /// to serialize them.
    pub fn commit(&self) {
        let mut shadow = self.shadow.lock().unwrap();
        let committed = std::mem::replace(&mut *shadow, Map::new());
        self.active.store(Arc::new(committed));
        tracing::debug!("symbol table committed");
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
