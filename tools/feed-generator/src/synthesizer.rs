//! Incremental event synthesis
//!
//! Couples the continuous mid-price process to discrete, level-quantized
//! order placement. Each step emits either a cancellation of a live order
//! or a new order whose price is bounded by the band around the base price.

use crate::band::PriceBand;
use crate::price_process::PriceModel;
use crate::snapshot::SPREAD_STEP;
use crate::state::GeneratorState;
use rand::Rng;
use tracing::trace;
use types::errors::InvariantViolation;
use types::event::{CancelOrder, FeedEvent, NewOrder};
use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::Side;

/// Largest random offset added to `sequence * 100` when allocating ids.
pub const MAX_ID_OFFSET: u64 = 50;

/// Upper bound of the absolute price jitter on new orders.
pub const EVENT_JITTER: f64 = 3.0;

/// Quantity growth per level for new orders.
pub const EVENT_LEVEL_GROWTH: f64 = 0.15;

/// Lower bound of the random size multiplier; the range is one wide.
pub const SIZE_MULTIPLIER_MIN: f64 = 0.5;

/// Per-step decision policy and order construction.
#[derive(Debug)]
pub struct EventSynthesizer {
    model: Box<dyn PriceModel>,
    band: PriceBand,
    depth: usize,
    base_quantity: f64,
    cancel_probability: f64,
}

impl EventSynthesizer {
    pub fn new(
        model: Box<dyn PriceModel>,
        band: PriceBand,
        depth: usize,
        base_quantity: f64,
        cancel_probability: f64,
    ) -> Self {
        Self {
            model,
            band,
            depth,
            base_quantity,
            cancel_probability,
        }
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Produce the event for `state.sequence`.
    ///
    /// The caller advances the sequence counter first. Cancels are only
    /// considered when at least one order is live; otherwise a new order is
    /// always produced.
    pub fn next_event(&self, state: &mut GeneratorState) -> Result<FeedEvent, InvariantViolation> {
        let sequence = state.sequence;

        if !state.active.is_empty() && state.rng.gen::<f64>() < self.cancel_probability {
            let order_id = state.active.pick_random(&mut state.rng)?;
            if !state.active.remove(order_id) {
                return Err(InvariantViolation::UnknownOrder(order_id));
            }
            trace!(sequence, %order_id, live = state.active.len(), "cancel");
            return Ok(CancelOrder { sequence, order_id }.into());
        }

        let order_id = OrderId::from_sequence(sequence, state.rng.gen_range(1..=MAX_ID_OFFSET))?;
        state.active.add(order_id)?;

        let side = if state.rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };

        let advanced = self.model.advance(state.mid, &mut state.rng);
        state.mid = self.band.clamp(advanced);

        let level = state.rng.gen_range(0..self.depth);
        let spread = SPREAD_STEP * (level as f64 + state.rng.gen::<f64>());
        let jitter = state.rng.gen_range(0.0..EVENT_JITTER);
        let raw_price = match side {
            Side::Bid => state.mid * (1.0 - spread) - jitter,
            Side::Ask => state.mid * (1.0 + spread) + jitter,
        };
        let price = self.band.quantize(raw_price);

        let scale = (SIZE_MULTIPLIER_MIN + state.rng.gen::<f64>()) * (1.0 + EVENT_LEVEL_GROWTH * level as f64);
        let size = self.base_quantity * scale;
        let quantity = Quantity::from_f64(size).ok_or_else(|| InvariantViolation::UnrepresentableQuantity {
            sequence,
            value: size.to_string(),
        })?;

        trace!(sequence, %order_id, %side, %price, %quantity, level, mid = state.mid, "new order");
        Ok(NewOrder {
            sequence,
            order_id,
            side,
            price,
            quantity,
        }
        .into())
    }
}
