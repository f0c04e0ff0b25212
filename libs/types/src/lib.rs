//! Types library for the synthetic order-book feed
//!
//! Wire-level definitions shared by the feed generator and anything that
//! reads its NDJSON output back in.
//!
//! # Modules
//! - `ids`: Order identifiers
//! - `numeric`: Fixed two-decimal price and quantity types
//! - `order`: Book side
//! - `event`: Feed event tagged union and price levels
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod order;
pub mod event;
pub mod errors;
