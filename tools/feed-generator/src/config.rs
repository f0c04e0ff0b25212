//! Generator configuration
//!
//! Every field except `exchange` is part of the determinism key: identical
//! values reproduce byte-identical feeds.

use crate::band::PriceBand;
use crate::price_process::{GeometricBrownianMotion, PriceModel, UniformJitter, DEFAULT_DT};
use crate::snapshot::LEVEL_QUANTITY_GROWTH;
use crate::synthesizer::{EVENT_LEVEL_GROWTH, SIZE_MULTIPLIER_MIN};
use serde::{Deserialize, Serialize};
use types::errors::ConfigError;
use types::numeric::MAX_WIRE_VALUE;

/// Reference probability of emitting a cancellation when orders are live.
pub const DEFAULT_CANCEL_PROBABILITY: f64 = 0.25;

/// Mid-price evolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum PriceModelConfig {
    /// Geometric Brownian motion
    Gbm { drift: f64, volatility: f64, dt: f64 },
    /// Uniform random step in `[-max_step, max_step)`
    Jitter { max_step: f64 },
}

impl Default for PriceModelConfig {
    fn default() -> Self {
        PriceModelConfig::Gbm {
            drift: 0.0,
            volatility: 0.01,
            dt: DEFAULT_DT,
        }
    }
}

impl PriceModelConfig {
    /// Jitter model with the default step.
    pub fn jitter() -> Self {
        PriceModelConfig::Jitter { max_step: 5.0 }
    }

    /// Validate and instantiate the model.
    pub fn build(&self) -> Result<Box<dyn PriceModel>, ConfigError> {
        match *self {
            PriceModelConfig::Gbm { drift, volatility, dt } => {
                Ok(Box::new(GeometricBrownianMotion::new(drift, volatility, dt)?))
            }
            PriceModelConfig::Jitter { max_step } => Ok(Box::new(UniformJitter::new(max_step)?)),
        }
    }
}

/// Full configuration of one feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Informational exchange label; does not affect output.
    pub exchange: String,
    /// Events after the snapshot.
    pub events: u64,
    /// Determinism key.
    pub seed: u64,
    /// Starting mid and centre of the price band.
    pub base_price: f64,
    /// Levels per side in the snapshot; also the level range of new orders.
    pub depth: usize,
    /// Base quantity of level 0.
    pub quantity: f64,
    /// Band half-width as a fraction of the base price.
    pub band: f64,
    /// Probability of a cancel when at least one order is live.
    pub cancel_probability: f64,
    pub price_model: PriceModelConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            exchange: "synthetic".to_string(),
            events: 250,
            seed: 1,
            base_price: 30000.0,
            depth: 8,
            quantity: 2500.0,
            band: 0.15,
            cancel_probability: DEFAULT_CANCEL_PROBABILITY,
            price_model: PriceModelConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Check every precondition before any output is produced.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(ConfigError::InvalidQuantity(self.quantity));
        }
        if self.depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        let largest = self.largest_quantity();
        if largest > MAX_WIRE_VALUE {
            return Err(ConfigError::ValueOutOfRange {
                field: "quantity",
                value: largest,
                max: MAX_WIRE_VALUE,
            });
        }
        if !(0.0..=1.0).contains(&self.cancel_probability) {
            return Err(ConfigError::InvalidCancelProbability(self.cancel_probability));
        }
        self.price_band()?;
        self.price_model.build()?;
        Ok(())
    }

    /// Upper bound of any quantity the feed can carry: the deepest snapshot
    /// bid or the largest size multiplier at the deepest level.
    fn largest_quantity(&self) -> f64 {
        let deepest = self.depth.saturating_sub(1) as f64;
        let snapshot = self.quantity * (1.0 + LEVEL_QUANTITY_GROWTH * deepest);
        let event = self.quantity * (SIZE_MULTIPLIER_MIN + 1.0) * (1.0 + EVENT_LEVEL_GROWTH * deepest);
        snapshot.max(event)
    }

    pub fn price_band(&self) -> Result<PriceBand, ConfigError> {
        PriceBand::new(self.base_price, self.band)
    }
}
