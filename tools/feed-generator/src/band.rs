//! Price band clamp
//!
//! Every price the generator emits is bounded to a symmetric fractional band
//! around the configured base price, with an absolute floor of 0.1.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use types::errors::ConfigError;
use types::numeric::{ceil_cents, floor_cents, to_cents, Price, MAX_WIRE_VALUE, MIN_PRICE, TICK};

/// Absolute lower bound for any generated price.
pub const PRICE_FLOOR: f64 = 0.1;

/// Decimal places kept from an `f64` band bound before snapping to cents.
const BOUND_DP: u32 = 8;

/// Bound `price` into `[max(0.1, base*(1-band)), base*(1+band)]`.
pub fn clamp(price: f64, base_price: f64, band: f64) -> f64 {
    let floor = (base_price * (1.0 - band)).max(PRICE_FLOOR);
    let ceiling = base_price * (1.0 + band);
    floor.max(ceiling.min(price))
}

/// Validated band around a base price, with its bounds snapped inward to
/// the cent grid so a quantized price never leaves the real band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    base_price: f64,
    fraction: f64,
    floor: Price,
    ceiling: Price,
}

impl PriceBand {
    pub fn new(base_price: f64, fraction: f64) -> Result<Self, ConfigError> {
        if !base_price.is_finite() || base_price <= 0.0 {
            return Err(ConfigError::InvalidBasePrice(base_price));
        }
        if !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
            return Err(ConfigError::InvalidBand(fraction));
        }

        let raw_floor = (base_price * (1.0 - fraction)).max(PRICE_FLOOR);
        let raw_ceiling = base_price * (1.0 + fraction);
        if raw_ceiling > MAX_WIRE_VALUE {
            return Err(ConfigError::ValueOutOfRange {
                field: "base_price",
                value: raw_ceiling,
                max: MAX_WIRE_VALUE,
            });
        }
        let too_narrow = |floor: String, ceiling: String| ConfigError::BandTooNarrow {
            base_price,
            floor,
            ceiling,
        };

        let (floor, ceiling) = match (snap_bound(raw_floor), snap_bound(raw_ceiling)) {
            (Some(floor), Some(ceiling)) => (ceil_cents(floor).max(MIN_PRICE), floor_cents(ceiling)),
            _ => return Err(too_narrow(raw_floor.to_string(), raw_ceiling.to_string())),
        };
        if ceiling - floor < TICK {
            return Err(too_narrow(floor.to_string(), ceiling.to_string()));
        }

        match (Price::try_new(floor), Price::try_new(ceiling)) {
            (Some(floor), Some(ceiling)) => Ok(Self {
                base_price,
                fraction,
                floor,
                ceiling,
            }),
            _ => Err(too_narrow(floor.to_string(), ceiling.to_string())),
        }
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Lowest price on the grid inside the band.
    pub fn floor(&self) -> Price {
        self.floor
    }

    /// Highest price on the grid inside the band.
    pub fn ceiling(&self) -> Price {
        self.ceiling
    }

    /// Clamp an evolved `f64` price into the band.
    pub fn clamp(&self, price: f64) -> f64 {
        clamp(price, self.base_price, self.fraction)
    }

    /// Clamp, round to cents and snap onto the in-band grid.
    pub fn quantize(&self, price: f64) -> Price {
        let cents = match to_cents(self.clamp(price)) {
            Some(cents) => cents,
            None => return self.floor,
        };
        if cents <= self.floor.as_decimal() {
            self.floor
        } else if cents >= self.ceiling.as_decimal() {
            self.ceiling
        } else {
            Price::try_new(cents).unwrap_or(self.floor)
        }
    }

    pub fn contains(&self, price: Price) -> bool {
        price >= self.floor && price <= self.ceiling
    }
}

/// Decimal of a band bound with binary noise removed, so snapping to the
/// grid does not jump a whole cent over a representation error.
fn snap_bound(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value).map(|d| d.round_dp(BOUND_DP))
}
