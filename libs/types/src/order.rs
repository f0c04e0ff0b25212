//! Book side

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the synthetic book an order rests on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy interest, placed below mid
    Bid,
    /// Sell interest, placed above mid
    Ask,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Bid.to_string(), "bid");
        assert_eq!(Side::Ask.to_string(), "ask");
    }

    #[test]
    fn test_side_wire_format() {
        assert_eq!(serde_json::to_string(&Side::Bid).unwrap(), "\"bid\"");
        assert_eq!(serde_json::from_str::<Side>("\"ask\"").unwrap(), Side::Ask);
    }
}
