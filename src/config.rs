//! Configuration side-channel: typed setters shared with the data path, and
//! the bespoke text-file loaders for symbols and reference prices.

use crate::common::{pad_symbol, PipelineError};
use crate::reference_prices::ReferencePrices;
use crate::risk::{RiskParamValues, RiskParams};
use crate::symbol_table::SymbolTable;
use crate::telemetry::{Counters, LatencyHistogram, Stats};
use std::sync::Arc;

/// Normal termination.
pub const EXIT_OK: u8 = 0;
/// The input adapter failed (packet capture, DMA, etc. — outside this crate).
pub const EXIT_ADAPTER_FAILURE: u8 = 1;
/// A configuration load was rejected (e.g. the symbol table is full).
pub const EXIT_CONFIG_REJECTED: u8 = 2;

/// The typed configuration interface, shared between a side-channel thread
/// and the data path via `Arc`. Every method here takes `&self`: symbol and
/// reference-price mutation is internally synchronized, and risk parameters
/// are plain release-ordered atomics.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub risk: Arc<RiskParams>,
    pub symbols: Arc<SymbolTable>,
    pub reference_prices: Arc<ReferencePrices>,
    pub(crate) counters: Arc<Counters>,
    pub(crate) histogram: Arc<LatencyHistogram>,
}

impl PipelineConfig {
    pub fn set_risk_params(&self, values: RiskParamValues) {
        self.risk.set(values);
    }

    pub fn set_kill(&self, kill: bool) {
        self.risk.set_kill(kill);
    }

    pub fn load_symbol(&self, key: [u8; 8], index: u16) -> Result<(), PipelineError> {
        self.symbols.load_symbol(key, index)
    }

    pub fn commit_symbols(&self) {
        self.symbols.commit();
    }

    pub fn set_reference_price(&self, index: u16, price: u32) {
        self.reference_prices.set(index, price);
    }

    pub fn snapshot_stats(&self) -> Stats {
        Stats::capture(&self.counters, &self.histogram)
    }
}

/// Load a `SYMBOL,INDEX` text file into `table`'s shadow map. Lines starting
/// with `#` are comments; blank lines are skipped. Symbols shorter than 8
/// characters are right-space-padded; longer ones are rejected. Does not
/// commit — call [`SymbolTable::commit`] once all loads for an epoch are in.
pub fn load_symbol_file(table: &SymbolTable, text: &str) -> Result<u32, PipelineError> {
    let mut loaded = 0;
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, ',');
        let symbol = parts.next().unwrap_or("").trim();
        let index_str = parts.next().ok_or_else(|| invalid_line(lineno, line))?.trim();
        let key = pad_symbol(symbol).ok_or(PipelineError::SymbolTooLong)?;
        let index: u16 = index_str.parse().map_err(|_| invalid_line(lineno, line))?;
        table.load_symbol(key, index)?;
        loaded += 1;
    }
    Ok(loaded)
}

/// Load an `INDEX,PRICE` text file into `refs`. `PRICE` is decimal; it is
/// multiplied by 10 000 and rounded half-up to the stored fixed-point value.
pub fn load_reference_price_file(refs: &ReferencePrices, text: &str) -> Result<u32, PipelineError> {
    let mut loaded = 0;
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, ',');
        let index_str = parts.next().unwrap_or("").trim();
        let price_str = parts.next().ok_or_else(|| invalid_line(lineno, line))?.trim();
        let index: u16 = index_str.parse().map_err(|_| invalid_line(lineno, line))?;
        let price_decimal: f64 = price_str.parse().map_err(|_| invalid_line(lineno, line))?;
        let price = (price_decimal * 10_000.0).round() as u32;
        refs.set(index, price);
        loaded += 1;
    }
    Ok(loaded)
}

fn invalid_line(lineno: usize, line: &str) -> PipelineError {
    tracing::warn!(lineno = lineno + 1, line, "rejecting malformed configuration line");
    PipelineError::InvalidConfigLine(format!("line {}: {}", lineno + 1, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_symbols_skipping_comments_and_blanks() {
        let table = SymbolTable::new();
        let text = "# header\nAAPL,0\n\nMSFT,1\n";
        let loaded = load_symbol_file(&table, text).unwrap();
        assert_eq!(loaded, 2);
        table.commit();
        assert_eq!(table.lookup(&pad_symbol("AAPL").unwrap()), Some(0));
        assert_eq!(table.lookup(&pad_symbol("MSFT").unwrap()), Some(1));
    }

    #[test]
    fn rejects_symbol_longer_than_eight_bytes() {
        let table = SymbolTable::new();
        let err = load_symbol_file(&table, "TOOLONGNAME,0\n").unwrap_err();
        assert_eq!(err, PipelineError::SymbolTooLong);
    }

    #[test]
    fn rejects_malformed_index() {
        let table = SymbolTable::new();
        let err = load_symbol_file(&table, "AAPL,not-a-number\n").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfigLine(_)));
    }

    #[test]
    fn reference_price_scales_and_rounds_half_up() {
        let refs = ReferencePrices::new();
        load_reference_price_file(&refs, "0,150.25\n1,99.99995\n").unwrap();
        assert_eq!(refs.get(0), 1_502_500);
        assert_eq!(refs.get(1), 1_000_000, "half-up rounding of 999999.5");
    }
}
