//! Corridor Common Types
//!
//! Shared types used across the Corridor workspace: monetary values, currency
//! and country codes, and the rate snapshot handed to the calculation engine.

pub mod monetary;
pub mod rates;

pub use monetary::*;
pub use rates::*;
