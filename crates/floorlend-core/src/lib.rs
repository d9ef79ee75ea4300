//! # FloorLend Core - Floor-Price-Bounded Lending
//!
//! Lending against a collateral asset whose borrow limit comes from its own
//! constant-product pool rather than an external oracle. It provides:
//!
//! - A trading pool with a supply-decaying fee and locked liquidity
//! - The floor price (pMin): the average price of dumping every unit held
//!   outside the pool, less the recovery bounty
//! - An interest-bearing lending pool with a kinked rate curve
//! - A collateral vault that sizes borrows by pMin and recovers unhealthy
//!   positions through the pool
//! - A market context that runs every entry point all-or-nothing

pub mod config;
pub mod constants;
pub mod errors;
pub mod ledger;
pub mod lending;
pub mod market;
pub mod math;
pub mod oracle;
pub mod pool;
pub mod reentrancy;
pub mod types;
pub mod vault;

// Re-export commonly used items
pub use config::{ConfigError, MarketConfig};
pub use constants::*;
pub use errors::{CoreResult, ErrorCategory, FloorLendError};
pub use ledger::{MemoryLedger, TokenLedger};
pub use market::{Market, MarketView};
pub use oracle::{floor_price, spot_price, FloorInputs};
pub use types::*;
