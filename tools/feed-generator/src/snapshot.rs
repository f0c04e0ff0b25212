//! Initial order-book snapshot
//!
//! Builds `depth` synthetic levels per side around the starting mid. The
//! spread widens with the level index and quantities grow linearly; asks
//! carry a smaller quantity than bids at the same level.

use crate::band::PriceBand;
use crate::state::FeedRng;
use rand::Rng;
use types::errors::InvariantViolation;
use types::event::{PriceLevel, Snapshot};
use types::numeric::{Price, Quantity};

/// Sequence number of the snapshot record.
pub const SNAPSHOT_SEQUENCE: u64 = 1;

/// Spread added per level, as a fraction of mid.
pub const SPREAD_STEP: f64 = 0.0005;

/// Upper bound of the absolute price jitter per snapshot level.
pub const SNAPSHOT_JITTER: f64 = 5.0;

/// Quantity growth per level.
pub const LEVEL_QUANTITY_GROWTH: f64 = 0.2;

/// Ask quantity relative to bid quantity at the same level.
pub const ASK_QUANTITY_RATIO: f64 = 0.8;

/// Builds the one-off snapshot that opens every feed.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotBuilder {
    band: PriceBand,
    depth: usize,
    base_quantity: f64,
}

impl SnapshotBuilder {
    pub fn new(band: PriceBand, depth: usize, base_quantity: f64) -> Self {
        Self {
            band,
            depth,
            base_quantity,
        }
    }

    /// Build the snapshot around `mid`.
    ///
    /// Draws two jitters per level, bid first. Every level satisfies
    /// `bid < ask` and both prices lie inside the band.
    pub fn build(&self, mid: f64, rng: &mut FeedRng) -> Result<Snapshot, InvariantViolation> {
        let mut bids = Vec::with_capacity(self.depth);
        let mut asks = Vec::with_capacity(self.depth);

        for level in 0..self.depth {
            let spread = SPREAD_STEP * (level + 1) as f64;
            let bid_raw = mid * (1.0 - spread) - rng.gen_range(0.0..SNAPSHOT_JITTER);
            let ask_raw = mid * (1.0 + spread) + rng.gen_range(0.0..SNAPSHOT_JITTER);
            let (bid, ask) = separate(self.band.quantize(bid_raw), self.band.quantize(ask_raw), &self.band);

            let bid_quantity = self.base_quantity * (1.0 + LEVEL_QUANTITY_GROWTH * level as f64);
            let ask_quantity = bid_quantity * ASK_QUANTITY_RATIO;

            bids.push(PriceLevel {
                price: bid,
                quantity: level_quantity(bid_quantity)?,
            });
            asks.push(PriceLevel {
                price: ask,
                quantity: level_quantity(ask_quantity)?,
            });
        }

        Ok(Snapshot {
            sequence: SNAPSHOT_SEQUENCE,
            bids,
            asks,
        })
    }
}

fn level_quantity(value: f64) -> Result<Quantity, InvariantViolation> {
    Quantity::from_f64(value).ok_or_else(|| InvariantViolation::UnrepresentableQuantity {
        sequence: SNAPSHOT_SEQUENCE,
        value: value.to_string(),
    })
}

/// Keep a level uncrossed after clamping.
///
/// Clamping can collapse both sides onto the same band edge. The band always
/// holds at least two ticks, so one of the two moves fits.
fn separate(bid: Price, ask: Price, band: &PriceBand) -> (Price, Price) {
    if bid < ask {
        return (bid, ask);
    }
    match ask.tick_down().filter(|lower| band.contains(*lower)) {
        Some(lower) => (lower, ask),
        None => (bid, bid.tick_up()),
    }
}
