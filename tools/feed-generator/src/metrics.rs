//! Feed metrics
//!
//! Tracks event mix, side balance, price range, live-order high-water mark
//! and throughput of one generation run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::event::FeedEvent;
use types::numeric::Price;
use types::order::Side;

/// Aggregated metrics of one feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedMetrics {
    pub snapshots: u64,
    pub new_orders: u64,
    pub cancels: u64,
    pub bid_orders: u64,
    pub ask_orders: u64,
    /// Sum of new-order quantities.
    pub total_quantity: Decimal,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub peak_active: usize,
    pub bytes_written: u64,
    pub elapsed_ns: u64,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single emitted event.
    pub fn record_event(&mut self, event: &FeedEvent) {
        match event {
            FeedEvent::Snapshot(snapshot) => {
                self.snapshots += 1;
                for level in snapshot.bids.iter().chain(snapshot.asks.iter()) {
                    self.observe_price(level.price);
                }
            }
            FeedEvent::NewOrder(order) => {
                self.new_orders += 1;
                match order.side {
                    Side::Bid => self.bid_orders += 1,
                    Side::Ask => self.ask_orders += 1,
                }
                self.total_quantity += order.quantity.as_decimal();
                self.observe_price(order.price);
            }
            FeedEvent::CancelOrder(_) => {
                self.cancels += 1;
            }
        }
    }

    /// Update the live-order high-water mark.
    pub fn update_active(&mut self, active: usize) {
        if active > self.peak_active {
            self.peak_active = active;
        }
    }

    pub fn set_bytes_written(&mut self, bytes: u64) {
        self.bytes_written = bytes;
    }

    pub fn set_elapsed(&mut self, ns: u64) {
        self.elapsed_ns = ns;
    }

    /// All events, snapshot included.
    pub fn total_events(&self) -> u64 {
        self.snapshots + self.new_orders + self.cancels
    }

    /// Fraction of post-snapshot events that were cancellations.
    pub fn cancel_ratio(&self) -> f64 {
        let incremental = self.new_orders + self.cancels;
        if incremental == 0 {
            return 0.0;
        }
        self.cancels as f64 / incremental as f64
    }

    /// Throughput: events per second.
    pub fn events_per_second(&self) -> f64 {
        if self.elapsed_ns == 0 {
            return 0.0;
        }
        self.total_events() as f64 / (self.elapsed_ns as f64 / 1_000_000_000.0)
    }

    fn observe_price(&mut self, price: Price) {
        self.min_price = Some(self.min_price.map_or(price, |p| p.min(price)));
        self.max_price = Some(self.max_price.map_or(price, |p| p.max(price)));
    }
}
