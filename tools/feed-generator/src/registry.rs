//! Active order registry
//!
//! Tracks synthetic orders that have been announced and not yet cancelled,
//! so every cancellation references a real, live order.

use crate::state::FeedRng;
use rand::Rng;
use std::collections::HashMap;
use types::errors::InvariantViolation;
use types::ids::OrderId;

/// Set of live order ids with uniform random selection.
///
/// Ids are kept in a dense vector for O(1) uniform picks; an index map gives
/// O(1) removal via swap-remove. Iteration order is a pure function of the
/// add/remove history, which keeps selection reproducible per seed.
#[derive(Debug, Clone, Default)]
pub struct ActiveOrderRegistry {
    orders: Vec<OrderId>,
    positions: HashMap<OrderId, usize>,
    peak: usize,
}

impl ActiveOrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly created order. Fails if the id is already live.
    pub fn add(&mut self, order_id: OrderId) -> Result<(), InvariantViolation> {
        if self.positions.contains_key(&order_id) {
            return Err(InvariantViolation::DuplicateOrder(order_id));
        }
        self.positions.insert(order_id, self.orders.len());
        self.orders.push(order_id);
        self.peak = self.peak.max(self.orders.len());
        Ok(())
    }

    /// Remove a live order. Returns false if the id is not live.
    pub fn remove(&mut self, order_id: OrderId) -> bool {
        let Some(index) = self.positions.remove(&order_id) else {
            return false;
        };
        self.orders.swap_remove(index);
        if let Some(moved) = self.orders.get(index) {
            self.positions.insert(*moved, index);
        }
        true
    }

    /// Select a live order uniformly at random, without removing it.
    pub fn pick_random(&self, rng: &mut FeedRng) -> Result<OrderId, InvariantViolation> {
        if self.orders.is_empty() {
            return Err(InvariantViolation::EmptyRegistry);
        }
        let index = rng.gen_range(0..self.orders.len());
        Ok(self.orders[index])
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.positions.contains_key(&order_id)
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Largest number of simultaneously live orders seen so far.
    pub fn peak(&self) -> usize {
        self.peak
    }
}
