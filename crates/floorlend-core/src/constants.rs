//! # Protocol Constants
//!
//! Fundamental constants for the floor-price lending engine:
//! - Fixed-point scales (WAD, basis points)
//! - Reserve bounds and locked liquidity
//! - Default fee-decay schedule and fee capture share
//! - Default lending rate model
//! - Recovery parameters (grace period, bounty)

// ============================================================================
// Mathematical Constants
// ============================================================================

/// WAD fixed-point scale factor: 1e18
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Maximum percentage in basis points (100%)
pub const MAX_BPS: u16 = 10_000;

/// Seconds in a non-leap year, used to turn annual rates into per-second rates
pub const SECONDS_PER_YEAR: u128 = 31_536_000;

// ============================================================================
// Pool Constants
// ============================================================================

/// Largest value a pool reserve may hold (2^112 - 1)
pub const MAX_RESERVE: u128 = (1u128 << 112) - 1;

/// Shares minted to the dead address on first deposit, locked forever
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

/// Smallest post-dump collateral reserve the floor price will price against
pub const MIN_POST_DUMP_RESERVE: u128 = 1_000;

/// Share of reserve growth captured for the fee collector (90%)
pub const DEFAULT_FEE_CAPTURE_BPS: u16 = 9_000;

// ============================================================================
// Fee Schedule Constants
// ============================================================================

/// Trade fee at launch (1%)
pub const DEFAULT_START_FEE_BPS: u16 = 100;

/// Trade fee once the decay target has been burned (0.3%)
pub const DEFAULT_END_FEE_BPS: u16 = 30;

/// Collateral units that must be burned for the fee to reach its end value
pub const DEFAULT_DECAY_TARGET: u128 = 100_000_000 * WAD;

// ============================================================================
// Lending Constants
// ============================================================================

/// Annual borrow rate at zero utilization (2%)
pub const DEFAULT_BASE_RATE_WAD: u128 = WAD / 50;

/// Rate added between zero utilization and the kink (10%)
pub const DEFAULT_SLOPE_WAD: u128 = WAD / 10;

/// Utilization above which the curve steepens (80%)
pub const DEFAULT_KINK_WAD: u128 = WAD * 8 / 10;

/// Slope multiplier applied above the kink
pub const DEFAULT_STEEP_MULTIPLIER: u128 = 3;

/// Fraction of accrued interest credited to protocol reserves (10%)
pub const DEFAULT_RESERVE_FACTOR_BPS: u16 = 1_000;

// ============================================================================
// Recovery Constants
// ============================================================================

/// Delay between marking a position OTM and recovering it
pub const GRACE_PERIOD_SECS: i64 = 3_600;

/// Discount applied to the floor price, paid out as the recovery bounty (0.5%)
pub const RECOVERY_BOUNTY_BPS: u16 = 50;
