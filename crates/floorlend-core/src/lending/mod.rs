//! # Lending
//!
//! Interest-bearing quote-asset pool and its kinked rate curve.

pub mod lending_pool;
pub mod rate_model;

pub use lending_pool::*;
pub use rate_model::*;
