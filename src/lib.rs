//! A deterministic tick-to-trade pipeline: frames an ITCH 5.0 byte stream,
//! maintains a top-of-book aggregate per symbol, runs a pre-trade risk gate,
//! and publishes fixed-width decision records over a lock-free SPSC ring.
//!
//! # Quick start
//!
//! ```rust
//! use ticktrade_core::pipeline::Pipeline;
//! use ticktrade_core::ring::RingConsumer;
//!
//! let (mut pipeline, config) = Pipeline::new(1000);
//! config.load_symbol(*b"AAPL    ", 0).unwrap();
//! config.commit_symbols();
//! config.set_reference_price(0, 1_500_000);
//!
//! pipeline.on_payload(&[], 0);
//! let consumer = RingConsumer::new(pipeline.ring());
//! assert!(consumer.try_next().is_none());
//! ```

#![warn(missing_debug_implementations)]

pub mod book;
pub mod common;
pub mod config;
pub mod decision;
pub mod decoder;
pub mod intake;
pub mod reference_prices;
pub mod ring;
pub mod risk;
pub mod splitter;
pub mod symbol_table;
pub mod telemetry;
pub mod utils;

pub mod pipeline;

pub use common::PipelineError;
pub use config::PipelineConfig;
pub use decision::DecisionRecord;
pub use pipeline::Pipeline;
