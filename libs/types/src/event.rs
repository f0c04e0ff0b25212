//! Feed event definitions
//!
//! One `FeedEvent` per NDJSON line. The `type` tag is written first and the
//! remaining fields follow declaration order, which is the documented wire
//! layout:
//!
//! ```text
//! {"type":"snapshot","sequence":1,"bids":[{"price":"29998.50","quantity":"2500.00"}],"asks":[...]}
//! {"type":"new_order","sequence":2,"order_id":20012,"side":"bid","price":"29999.10","quantity":"2750.30"}
//! {"type":"cancel_order","sequence":3,"order_id":20012}
//! ```

use crate::ids::OrderId;
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use serde::{Deserialize, Serialize};

/// One depth position of the synthetic book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub quantity: Quantity,
}

/// Full book image. Always the first record of a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sequence: u64,
    /// Level-indexed, best first.
    pub bids: Vec<PriceLevel>,
    /// Level-indexed, best first.
    pub asks: Vec<PriceLevel>,
}

impl Snapshot {
    pub fn depth(&self) -> usize {
        self.bids.len()
    }
}

/// A synthetic order entering the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub sequence: u64,
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

/// Removal of a previously announced, still live order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub sequence: u64,
    pub order_id: OrderId,
}

/// One record of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    Snapshot(Snapshot),
    NewOrder(NewOrder),
    CancelOrder(CancelOrder),
}

impl FeedEvent {
    pub fn sequence(&self) -> u64 {
        match self {
            FeedEvent::Snapshot(s) => s.sequence,
            FeedEvent::NewOrder(o) => o.sequence,
            FeedEvent::CancelOrder(c) => c.sequence,
        }
    }

    /// Wire tag, also used as a log label.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedEvent::Snapshot(_) => "snapshot",
            FeedEvent::NewOrder(_) => "new_order",
            FeedEvent::CancelOrder(_) => "cancel_order",
        }
    }
}

impl From<Snapshot> for FeedEvent {
    fn from(snapshot: Snapshot) -> Self {
        FeedEvent::Snapshot(snapshot)
    }
}

impl From<NewOrder> for FeedEvent {
    fn from(order: NewOrder) -> Self {
        FeedEvent::NewOrder(order)
    }
}

impl From<CancelOrder> for FeedEvent {
    fn from(cancel: CancelOrder) -> Self {
        FeedEvent::CancelOrder(cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: f64, quantity: f64) -> PriceLevel {
        PriceLevel {
            price: Price::from_f64(price).unwrap(),
            quantity: Quantity::from_f64(quantity).unwrap(),
        }
    }

    #[test]
    fn test_snapshot_wire_layout() {
        let event: FeedEvent = Snapshot {
            sequence: 1,
            bids: vec![level(29998.5, 2500.0)],
            asks: vec![level(30001.5, 2000.0)],
        }
        .into();
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"snapshot","sequence":1,"bids":[{"price":"29998.50","quantity":"2500.00"}],"asks":[{"price":"30001.50","quantity":"2000.00"}]}"#
        );
    }

    #[test]
    fn test_new_order_wire_layout() {
        let event: FeedEvent = NewOrder {
            sequence: 2,
            order_id: OrderId::new(20012),
            side: Side::Bid,
            price: Price::from_f64(29999.1).unwrap(),
            quantity: Quantity::from_f64(2750.3).unwrap(),
        }
        .into();
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"new_order","sequence":2,"order_id":20012,"side":"bid","price":"29999.10","quantity":"2750.30"}"#
        );
    }

    #[test]
    fn test_cancel_wire_layout() {
        let event: FeedEvent = CancelOrder {
            sequence: 3,
            order_id: OrderId::new(20012),
        }
        .into();
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"cancel_order","sequence":3,"order_id":20012}"#
        );
        assert_eq!(event.kind(), "cancel_order");
        assert_eq!(event.sequence(), 3);
    }

    #[test]
    fn test_parse_line() {
        let line = r#"{"type":"new_order","sequence":9,"order_id":901,"side":"ask","price":"30010.25","quantity":"1.00"}"#;
        match serde_json::from_str::<FeedEvent>(line).unwrap() {
            FeedEvent::NewOrder(order) => {
                assert_eq!(order.order_id, OrderId::new(901));
                assert_eq!(order.side, Side::Ask);
                assert_eq!(order.price.to_string(), "30010.25");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let line = r#"{"type":"trade","sequence":4}"#;
        assert!(serde_json::from_str::<FeedEvent>(line).is_err());
    }
}
