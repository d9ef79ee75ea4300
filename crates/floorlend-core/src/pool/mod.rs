//! # Trading Pool
//!
//! Constant-product market with a supply-decaying fee and locked liquidity.

pub mod fee_schedule;
pub mod trading_pool;

pub use fee_schedule::*;
pub use trading_pool::*;
