//! Mid-price evolution models
//!
//! The primary model is a geometric Brownian motion discretized at a fixed
//! step. A lightweight uniform-jitter model is offered as an alternative.
//! Both consume a fixed number of draws per step so streams stay
//! prefix-stable.

use crate::state::FeedRng;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::fmt;
use types::errors::ConfigError;

/// One tick, in model time units.
pub const DEFAULT_DT: f64 = 1.0 / 60.0;

/// Capability to evolve the mid-price by one step.
pub trait PriceModel: fmt::Debug + Send + Sync {
    /// Return the next mid-price. Draws from `rng` in a fixed pattern.
    fn advance(&self, mid: f64, rng: &mut FeedRng) -> f64;

    /// Short label for logs and summaries.
    fn name(&self) -> &'static str;
}

/// One log-normal GBM step for a given standard-normal sample `z`.
///
/// `mid * exp((drift - vol^2/2) * dt + vol * sqrt(dt) * z)`; strictly
/// positive for any positive `mid`.
pub fn gbm_step(mid: f64, drift: f64, volatility: f64, dt: f64, z: f64) -> f64 {
    let exponent = (drift - 0.5 * volatility * volatility) * dt + volatility * dt.sqrt() * z;
    mid * exponent.exp()
}

/// Geometric Brownian motion with constant drift and volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricBrownianMotion {
    drift: f64,
    volatility: f64,
    dt: f64,
}

impl GeometricBrownianMotion {
    pub fn new(drift: f64, volatility: f64, dt: f64) -> Result<Self, ConfigError> {
        if !drift.is_finite() {
            return Err(ConfigError::InvalidDrift(drift));
        }
        if !volatility.is_finite() || volatility < 0.0 {
            return Err(ConfigError::InvalidVolatility(volatility));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::InvalidTimeStep(dt));
        }
        Ok(Self { drift, volatility, dt })
    }
}

impl PriceModel for GeometricBrownianMotion {
    fn advance(&self, mid: f64, rng: &mut FeedRng) -> f64 {
        let z: f64 = StandardNormal.sample(rng);
        gbm_step(mid, self.drift, self.volatility, self.dt, z)
    }

    fn name(&self) -> &'static str {
        "gbm"
    }
}

/// Random walk with independent uniform steps in `[-max_step, max_step)`.
///
/// Can go negative on its own; callers clamp the result into the band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformJitter {
    max_step: f64,
}

impl UniformJitter {
    pub fn new(max_step: f64) -> Result<Self, ConfigError> {
        if !max_step.is_finite() || max_step < 0.0 {
            return Err(ConfigError::InvalidJitter(max_step));
        }
        Ok(Self { max_step })
    }
}

impl PriceModel for UniformJitter {
    fn advance(&self, mid: f64, rng: &mut FeedRng) -> f64 {
        // Always one draw, even for a zero step.
        let u: f64 = rng.gen();
        mid + (2.0 * u - 1.0) * self.max_step
    }

    fn name(&self) -> &'static str {
        "jitter"
    }
}
