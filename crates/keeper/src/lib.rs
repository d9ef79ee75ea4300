//! # FloorLend Keeper
//!
//! Off-chain recovery bot. Each sweep marks positions whose collateral is
//! worth no more than their debt at spot, and recovers marked positions once
//! their grace period has elapsed.

pub mod config;
pub mod error;
pub mod keeper;

pub use config::KeeperConfig;
pub use error::{KeeperError, KeeperResult};
pub use keeper::{Keeper, SweepFailure, SweepReport};
