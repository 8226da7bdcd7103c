//! Per-symbol top-of-book state and its update rules.

use crate::common::{Price, Side, SymbolIndex, Timestamp, MAX_SYMBOLS};
use crate::decoder::ParsedMessage;

/// One symbol's aggregate top-of-book state. All-zero / `valid=false` is the
/// initial state of every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookEntry {
    pub bid_px: Price,
    pub bid_qty: u32,
    pub ask_px: Price,
    pub ask_qty: u32,
    pub last_trade_px: Price,
    pub last_trade_qty: u32,
    pub last_update_ts: Timestamp,
    pub valid: bool,
    /// Side resolved by the most recent Add for this symbol, used to
    /// attribute order-id-only messages ('E','C','X','D','U') to a side —
    /// the aggregate-model simplification the book inherits, since those
    /// messages carry no symbol or side of their own.
    last_side: Option<Side>,
}

impl BookEntry {
    fn side_mut(&mut self, side: Side) -> (&mut Price, &mut u32) {
        match side {
            Side::Bid => (&mut self.bid_px, &mut self.bid_qty),
            Side::Ask => (&mut self.ask_px, &mut self.ask_qty),
        }
    }
}

/// Snapshot of a symbol's TOB emitted after a book-affecting update.
#[derive(Debug, Clone, Copy)]
pub struct BookEvent {
    pub ingress_ts: Timestamp,
    pub book_ts: Timestamp,
    pub symbol_index: SymbolIndex,
    pub bid_px: Price,
    pub bid_qty: u32,
    pub ask_px: Price,
    pub ask_qty: u32,
    pub last_trade_px: Price,
    pub last_trade_qty: u32,
    pub stale: bool,
    pub triggering_msg_type: u8,
}

/// Flat array of `MAX_SYMBOLS` book entries. Optionally viewed as `B` banks
/// by the low bits of the symbol index; in a single-threaded pipeline the
/// banking is a design hint only and has no effect on behavior here.
#[derive(Debug)]
pub struct Book {
    entries: Vec<BookEntry>,
}

impl Book {
    pub fn new() -> Self {
        Self {
            entries: vec![BookEntry::default(); MAX_SYMBOLS],
        }
    }

    pub fn entry(&self, index: SymbolIndex) -> Option<&BookEntry> {
        self.entries.get(index as usize)
    }

    /// Apply a decoded, book-affecting message. Returns the resulting
    /// snapshot, or `None` if the symbol index is out of range or the
    /// message did not carry a resolvable symbol.
    pub fn apply(&mut self, msg: &ParsedMessage) -> Option<BookEvent> {
        let index = msg.symbol_index?;
        let entry = self.entries.get_mut(index as usize)?;
        let msg_type = msg.msg_type;

        match msg_type {
            b'A' | b'F' => {
                let side = msg.side?;
                let (price, qty) = entry.side_mut(side);
                let improves = match side {
                    Side::Bid => *qty == 0 || msg.price > *price,
                    Side::Ask => *qty == 0 || msg.price < *price,
                };
                if improves {
                    *price = msg.price;
                    *qty = msg.qty;
                }
                entry.last_side = Some(side);
            }
            b'E' | b'C' => {
                if let Some(side) = entry.last_side {
                    let (_, qty) = entry.side_mut(side);
                    *qty = qty.saturating_sub(msg.qty);
                }
                if msg_type == b'C' {
                    entry.last_trade_px = msg.price;
                    entry.last_trade_qty = msg.qty;
                }
            }
            b'X' => {
                if let Some(side) = entry.last_side {
                    let (_, qty) = entry.side_mut(side);
                    *qty = qty.saturating_sub(msg.qty);
                }
            }
            b'D' => {
                if let Some(side) = entry.last_side {
                    let (_, qty) = entry.side_mut(side);
                    *qty = 0;
                }
            }
            b'U' => {
                if let Some(side) = entry.last_side {
                    let (price, qty) = entry.side_mut(side);
                    *price = msg.price;
                    *qty = msg.qty;
                }
            }
            b'P' => {
                entry.last_trade_px = msg.price;
                entry.last_trade_qty = msg.qty;
            }
            _ => return None,
        }

        entry.last_update_ts = msg.ingress_ts;
        entry.valid = true;

        Some(BookEvent {
            ingress_ts: msg.ingress_ts,
            book_ts: msg.decode_ts,
            symbol_index: index,
            bid_px: entry.bid_px,
            bid_qty: entry.bid_qty,
            ask_px: entry.ask_px,
            ask_qty: entry.ask_qty,
            last_trade_px: entry.last_trade_px,
            last_trade_qty: entry.last_trade_qty,
            stale: msg.stale,
            triggering_msg_type: msg_type,
        })
    }
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}
