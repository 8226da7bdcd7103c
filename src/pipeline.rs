//! Wires intake → splitter → decoder → book → risk gate → publisher ring
//! into the single `on_payload` entry point the data-path thread drives.

use crate::book::Book;
use crate::config::PipelineConfig;
use crate::decision::DecisionRecord;
use crate::decoder::{self, DecodedMessage};
use crate::intake::{Intake, IntakeOutcome};
use crate::reference_prices::ReferencePrices;
use crate::ring::Ring;
use crate::risk::{RiskGate, RiskParams};
use crate::splitter::Splitter;
use crate::symbol_table::SymbolTable;
use crate::telemetry::{Counters, LatencyHistogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The deterministic, single-threaded data-path pipeline. Exactly one
/// thread calls [`Pipeline::on_payload`] repeatedly; everything it owns
/// directly (splitter, book, risk gate, clock, ring) needs no
/// synchronization. The `Arc`-shared fields are the configuration
/// side-channel's half of the contract.
#[derive(Debug)]
pub struct Pipeline {
    intake: Intake,
    splitter: Splitter,
    book: Book,
    risk_gate: RiskGate,
    ring: Ring,
    clock_ns: u64,

    symbols: Arc<SymbolTable>,
    reference_prices: Arc<ReferencePrices>,
    risk_params: Arc<RiskParams>,
    counters: Arc<Counters>,
    histogram: Arc<LatencyHistogram>,
    shutdown: Arc<AtomicBool>,
}

impl Pipeline {
    /// Build a pipeline and the [`PipelineConfig`] handle that shares its
    /// configuration-side state.
    pub fn new(seq_gap_threshold: u16) -> (Self, PipelineConfig) {
        let symbols = Arc::new(SymbolTable::new());
        let reference_prices = Arc::new(ReferencePrices::new());
        let risk_params = Arc::new(RiskParams::default());
        let counters = Arc::new(Counters::new());
        let histogram = Arc::new(LatencyHistogram::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let pipeline = Self {
            intake: Intake::new(),
            splitter: Splitter::new(seq_gap_threshold),
            book: Book::new(),
            risk_gate: RiskGate::new(),
            ring: Ring::new(),
            clock_ns: 0,
            symbols: symbols.clone(),
            reference_prices: reference_prices.clone(),
            risk_params: risk_params.clone(),
            counters: counters.clone(),
            histogram: histogram.clone(),
            shutdown: shutdown.clone(),
        };

        let config = PipelineConfig {
            risk: risk_params,
            symbols,
            reference_prices,
            counters,
            histogram,
        };

        (pipeline, config)
    }

    /// The cooperative shutdown flag; the adapter sets it, this pipeline
    /// checks it once at the top of every `on_payload` call.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// The publisher ring, for constructing a [`crate::ring::RingConsumer`].
    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    /// Process one adapter-supplied payload chunk. Never returns a
    /// `Result`: framing and sequence failures become counter increments.
    pub fn on_payload(&mut self, bytes: &[u8], ingress_ts_ns: u64) {
        if self.shutdown.load(Ordering::Relaxed) {
            return;
        }

        self.counters.inc_rx_packets();
        self.counters.add_rx_bytes(bytes.len() as u64);

        let event = match self.intake.accept(bytes, ingress_ts_ns) {
            IntakeOutcome::Ready(event) => event,
            IntakeOutcome::Buffering => {
                tracing::debug!(len = bytes.len(), "intake buffering a partial frame");
                return;
            }
        };

        self.clock_ns = self.clock_ns.max(event.ingress_ts);

        let book = &mut self.book;
        let risk_gate = &mut self.risk_gate;
        let clock_ns = &mut self.clock_ns;
        let symbols = &self.symbols;
        let reference_prices = &self.reference_prices;
        let risk_params = &self.risk_params;
        let ring = &self.ring;
        let counters = &self.counters;
        let histogram = &self.histogram;

        let report = self.splitter.split(&event.payload, |frame| {
            *clock_ns += 1;
            let decode_ts = *clock_ns;

            let decoded = decoder::decode(
                frame.msg_type,
                frame.body,
                frame.seq,
                event.ingress_ts,
                decode_ts,
                frame.stale,
                symbols,
            );
            counters.inc_parsed_messages();
            tracing::debug!(seq = frame.seq, msg_type = frame.msg_type as u32, "frame decoded");

            let DecodedMessage::Parsed(msg) = decoded else {
                return;
            };
            if !msg.is_book_affecting {
                return;
            }
            let Some(book_event) = book.apply(&msg) else {
                return;
            };
            counters.inc_book_updates();

            let ref_price = reference_prices.get(book_event.symbol_index);
            let verdict = risk_gate.evaluate(risk_params, &book_event, ref_price, decode_ts);
            count_verdict(counters, verdict.flags);

            let spread = book_event.ask_px.wrapping_sub(book_event.bid_px);
            let qty_imbalance = book_event.bid_qty as i64 - book_event.ask_qty as i64;
            let record = DecisionRecord::new(
                msg.seq,
                event.ingress_ts,
                decode_ts,
                book_event.symbol_index,
                msg.side.map(|s| s as u8).unwrap_or(0),
                verdict.flags,
                msg.qty,
                msg.price,
                ref_price,
                spread,
                qty_imbalance as i32,
                book_event.last_trade_px,
            );

            let before = ring.drop_count();
            ring.publish(&record);
            if ring.drop_count() == before {
                counters.inc_published();
                histogram.record(decode_ts.saturating_sub(event.ingress_ts));
            } else {
                counters.inc_ring_drops();
                tracing::warn!(seq = msg.seq, symbol_index = book_event.symbol_index, "ring full, dropping decision record");
            }
        });

        if report.gaps > 0 || report.dupes > 0 {
            tracing::warn!(gaps = report.gaps, dupes = report.dupes, desyncs = report.desyncs, "sequence anomalies in payload");
        }
        counters.seq_gaps.fetch_add(report.gaps as u64, Ordering::Relaxed);
        counters.seq_dupes.fetch_add(report.dupes as u64, Ordering::Relaxed);
    }
}

fn count_verdict(counters: &Counters, flags: u8) {
    use crate::decision::flag_bits::*;
    if flags & (1 << ACCEPT) != 0 {
        counters.risk_accepts.fetch_add(1, Ordering::Relaxed);
    } else if flags & (1 << KILL_ACTIVE) != 0 {
        counters.risk_reject_kill.fetch_add(1, Ordering::Relaxed);
    } else if flags & (1 << STALE) != 0 {
        counters.risk_reject_stale.fetch_add(1, Ordering::Relaxed);
    } else if flags & (1 << PRICE_BAND_FAIL) != 0 {
        counters.risk_reject_price_band.fetch_add(1, Ordering::Relaxed);
    } else if flags & (1 << TOKEN_FAIL) != 0 {
        counters.risk_reject_token.fetch_add(1, Ordering::Relaxed);
    } else if flags & (1 << POSITION_FAIL) != 0 {
        counters.risk_reject_position.fetch_add(1, Ordering::Relaxed);
    }
}
