//! # Price Oracles
//!
//! Prices derived from the pool's own bonding curve.

pub mod floor_price;

pub use floor_price::*;
