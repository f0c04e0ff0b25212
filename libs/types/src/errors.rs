//! Error types for feed generation
//!
//! Error taxonomy using thiserror. Configuration errors are raised before
//! any output is produced; invariant violations abort a run in progress.

use crate::ids::OrderId;
use thiserror::Error;

/// Rejected generator configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid base price: {0} (must be finite and > 0)")]
    InvalidBasePrice(f64),

    #[error("Invalid quantity: {0} (must be finite and > 0)")]
    InvalidQuantity(f64),

    #[error("Invalid depth: must be at least 1")]
    ZeroDepth,

    #[error("Invalid band fraction: {0} (must be in [0, 1))")]
    InvalidBand(f64),

    /// The band must hold at least two cent ticks after its bounds are
    /// snapped inward, so a zero band is always rejected here.
    #[error("Band too narrow around base price {base_price}: [{floor}, {ceiling}] holds fewer than two price ticks")]
    BandTooNarrow {
        base_price: f64,
        floor: String,
        ceiling: String,
    },

    #[error("Invalid volatility: {0} (must be finite and >= 0)")]
    InvalidVolatility(f64),

    #[error("Invalid drift: {0} (must be finite)")]
    InvalidDrift(f64),

    #[error("Invalid time step: {0} (must be finite and > 0)")]
    InvalidTimeStep(f64),

    #[error("Invalid jitter step: {0} (must be finite and >= 0)")]
    InvalidJitter(f64),

    #[error("Invalid cancel probability: {0} (must be in [0, 1])")]
    InvalidCancelProbability(f64),

    #[error("Value out of range: {field} reaches {value}, above the wire limit {max}")]
    ValueOutOfRange { field: &'static str, value: f64, max: f64 },

    #[error("Invalid exchange label: {0:?} (must be a non-empty file name)")]
    InvalidExchange(String),

    #[error("Exchange {0:?} listed more than once")]
    DuplicateExchange(String),
}

/// Internal state fault. Never expected under correct generation logic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Order {0} is not active")]
    UnknownOrder(OrderId),

    #[error("Order {0} is already active")]
    DuplicateOrder(OrderId),

    #[error("No active orders to select from")]
    EmptyRegistry,

    #[error("Sequence regression: last {last}, next {next}")]
    SequenceRegression { last: u64, next: u64 },

    #[error("Price out of band at sequence {sequence}: {price}")]
    PriceOutOfBand { sequence: u64, price: String },

    #[error("Order id overflows at sequence {0}")]
    IdOverflow(u64),

    #[error("Quantity not representable at sequence {sequence}: {value}")]
    UnrepresentableQuantity { sequence: u64, value: String },
}
