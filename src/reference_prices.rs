//! Per-index reference price table.
//!
//! Writes are single-word stores from the configuration channel; reads by
//! the risk gate are single-word loads. A 32-bit store/load pair never
//! tears on any platform Rust targets, so plain `Relaxed` atomics satisfy
//! the "tearing is acceptable" contract without actually tearing.

use crate::common::{Price, MAX_SYMBOLS};
use std::sync::atomic::{AtomicU32, Ordering};

/// Flat array of reference prices, indexed by symbol index. `0` means "no
/// reference loaded", which disables the price-band check for that symbol.
#[derive(Debug)]
pub struct ReferencePrices {
    prices: Vec<AtomicU32>,
}

impl ReferencePrices {
    pub fn new() -> Self {
        let mut prices = Vec::with_capacity(MAX_SYMBOLS);
        prices.resize_with(MAX_SYMBOLS, || AtomicU32::new(0));
        Self { prices }
    }

    pub fn set(&self, index: u16, price: Price) {
        if let Some(slot) = self.prices.get(index as usize) {
            slot.store(price, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn get(&self, index: u16) -> Price {
        self.prices
            .get(index as usize)
            .map(|p| p.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl Default for ReferencePrices {
    fn default() -> Self {
        Self::new()
    }
}
