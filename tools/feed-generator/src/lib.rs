//! Synthetic Market Feed Generator
//!
//! Deterministic generator of synthetic order-book event feeds for exercising
//! market-data pipelines. A run emits one depth snapshot followed by a
//! configured number of new-order and cancel events as NDJSON, fully
//! reproducible from its seed.
//!
//! # Modules
//! - `price_process`: GBM and uniform-jitter mid-price models
//! - `band`: Price band clamp and cent-grid quantization
//! - `registry`: Active-order registry for cancellation selection
//! - `state`: Per-run generator state and seeded random source
//! - `snapshot`: Initial depth snapshot construction
//! - `synthesizer`: Per-step new-order / cancel synthesis
//! - `sequencer`: Lazy event stream and NDJSON output with digest
//! - `config`: Generator configuration and validation
//! - `metrics`: Event mix, price range and throughput counters
//! - `export`: Run summary JSON export
//! - `validate`: Feed re-reading and stream guarantee checks
//! - `multi_feed`: Independent feeds generated concurrently

pub mod band;
pub mod config;
pub mod error;
pub mod export;
pub mod metrics;
pub mod multi_feed;
pub mod price_process;
pub mod registry;
pub mod sequencer;
pub mod snapshot;
pub mod state;
pub mod synthesizer;
pub mod validate;

pub use config::{GeneratorConfig, PriceModelConfig};
pub use error::GeneratorError;
pub use export::RunSummary;
pub use sequencer::{Destination, EventStream, StreamSequencer};

/// Crate version constant
pub const VERSION: &str = "1.0.0";
