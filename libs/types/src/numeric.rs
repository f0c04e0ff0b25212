//! Fixed two-decimal price and quantity types
//!
//! Uses rust_decimal so the wire representation is exact: every value is
//! carried at scale 2 and serialized as a string such as `"29998.50"`.
//! Conversions from `f64` round half away from zero to the nearest cent.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits on the wire.
pub const WIRE_SCALE: u32 = 2;

/// Smallest representable step (0.01).
pub const TICK: Decimal = Decimal::from_parts(1, 0, 0, false, WIRE_SCALE);

/// Absolute price floor (0.10).
pub const MIN_PRICE: Decimal = Decimal::from_parts(10, 0, 0, false, WIRE_SCALE);

/// Largest magnitude accepted from `f64`. Below it an `f64` still resolves
/// individual cents.
pub const MAX_WIRE_VALUE: f64 = 1e12;

/// Round an `f64` to a scale-2 decimal. `None` for NaN, infinities and
/// magnitudes above `MAX_WIRE_VALUE`.
pub fn to_cents(value: f64) -> Option<Decimal> {
    if !value.is_finite() || value.abs() > MAX_WIRE_VALUE {
        return None;
    }
    Decimal::from_f64(value).and_then(with_wire_scale)
}

/// Round any decimal to exactly two fractional digits. `None` when the
/// value is too large to carry two fractional digits.
pub fn with_wire_scale(value: Decimal) -> Option<Decimal> {
    let mut rounded = value.round_dp_with_strategy(WIRE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(WIRE_SCALE);
    (rounded.scale() == WIRE_SCALE).then_some(rounded)
}

/// Round down to the cent grid.
pub fn floor_cents(value: Decimal) -> Decimal {
    let mut v = value.round_dp_with_strategy(WIRE_SCALE, RoundingStrategy::ToNegativeInfinity);
    v.rescale(WIRE_SCALE);
    v
}

/// Round up to the cent grid.
pub fn ceil_cents(value: Decimal) -> Decimal {
    let mut v = value.round_dp_with_strategy(WIRE_SCALE, RoundingStrategy::ToPositiveInfinity);
    v.rescale(WIRE_SCALE);
    v
}

fn parse_wire(s: &str) -> Result<Decimal, String> {
    let value = Decimal::from_str(s).map_err(|e| format!("invalid decimal {s:?}: {e}"))?;
    if value.scale() != WIRE_SCALE {
        return Err(format!("expected exactly {WIRE_SCALE} fractional digits, got {s:?}"));
    }
    Ok(value)
}

/// Price on the cent grid, strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// The absolute floor, 0.10.
    pub const FLOOR: Price = Price(MIN_PRICE);

    /// Build from a decimal, rounding to cents. Rejects non-positive values.
    pub fn try_new(value: Decimal) -> Option<Self> {
        with_wire_scale(value).filter(|v| *v > Decimal::ZERO).map(Self)
    }

    /// Build from an `f64`, rounding to cents.
    pub fn from_f64(value: f64) -> Option<Self> {
        to_cents(value).and_then(Self::try_new)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// One tick above.
    pub fn tick_up(&self) -> Self {
        Self(self.0 + TICK)
    }

    /// One tick below, if still positive.
    pub fn tick_down(&self) -> Option<Self> {
        Self::try_new(self.0 - TICK)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let value = parse_wire(&raw).map_err(de::Error::custom)?;
        Self::try_new(value).ok_or_else(|| de::Error::custom(format!("price must be positive, got {raw}")))
    }
}

/// Quantity on the cent grid, at least one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Build from an `f64`, rounding to cents and flooring at one tick.
    /// Rejects NaN, non-positive input and anything above `MAX_WIRE_VALUE`.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_nan() || value <= 0.0 {
            return None;
        }
        to_cents(value).map(|v| Self(v.max(TICK)))
    }

    /// Build from a decimal, rounding to cents. Rejects values that round to zero.
    pub fn try_new(value: Decimal) -> Option<Self> {
        match with_wire_scale(value) {
            Some(value) if value > Decimal::ZERO => Some(Self(value)),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let value = parse_wire(&raw).map_err(de::Error::custom)?;
        Self::try_new(value).ok_or_else(|| de::Error::custom(format!("quantity must be positive, got {raw}")))
    }
}
