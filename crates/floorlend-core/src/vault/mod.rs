//! # Collateral Vault
//!
//! Floor-price-bounded borrowing and permissionless recovery.

pub mod collateral_vault;
pub mod position;

pub use collateral_vault::*;
pub use position::*;
