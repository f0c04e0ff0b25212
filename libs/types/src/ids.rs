//! Identifier types for feed entities
//!
//! Synthetic order ids are plain integers on the wire. They are allocated
//! from the stream sequence number, so they grow monotonically within a run.

use crate::errors::InvariantViolation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a synthetic resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Derive an id from the sequence number that creates the order.
    ///
    /// `offset` must stay below 100 so ids of distinct sequences never meet.
    pub fn from_sequence(sequence: u64, offset: u64) -> Result<Self, InvariantViolation> {
        debug_assert!(offset < 100);
        sequence
            .checked_mul(100)
            .and_then(|base| base.checked_add(offset))
            .map(Self)
            .ok_or(InvariantViolation::IdOverflow(sequence))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sequence() {
        assert_eq!(OrderId::from_sequence(200, 12).unwrap().as_u64(), 20012);
    }

    #[test]
    fn test_ids_from_consecutive_sequences_are_ordered() {
        let last_of_first = OrderId::from_sequence(7, 99).unwrap();
        let first_of_next = OrderId::from_sequence(8, 1).unwrap();
        assert!(last_of_first < first_of_next);
    }

    #[test]
    fn test_from_sequence_overflow_is_reported() {
        assert_eq!(
            OrderId::from_sequence(u64::MAX, 1),
            Err(InvariantViolation::IdOverflow(u64::MAX))
        );
        let last = u64::MAX / 100;
        assert_eq!(OrderId::from_sequence(last, 15).unwrap().as_u64(), u64::MAX);
        assert_eq!(OrderId::from_sequence(last, 16), Err(InvariantViolation::IdOverflow(last)));
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&OrderId::new(20012)).unwrap();
        assert_eq!(json, "20012");
    }
}
