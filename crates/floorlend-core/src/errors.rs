//! # Core Error Types
//!
//! Every rejected operation maps to one variant with a stable numeric code so
//! that automated callers can tell "try again later" apart from "this will
//! never succeed".

use thiserror::Error;

/// Broad classification of protocol errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller lacks the required role
    Authorization,
    /// Request exceeds an economic bound
    EconomicLimit,
    /// Request is invalid for the current state
    State,
    /// Arithmetic failed
    Numeric,
}

/// Core protocol errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FloorLendError {
    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Caller is not an authorized borrower-management component")]
    UnauthorizedBorrower,

    #[error("Caller is not the admin")]
    UnauthorizedAdmin,

    #[error("Pool shares may only move to the fee collector or the pool")]
    ShareTransferRestricted,

    #[error("Insufficient token balance")]
    InsufficientBalance,

    // ========================================================================
    // Economic-Limit Errors
    // ========================================================================

    #[error("Borrow exceeds floor-price capacity")]
    ExceedsFloorPrice,

    #[error("Withdrawal blocked by outstanding debt")]
    WithdrawBlockedByDebt,

    #[error("Insufficient collateral")]
    InsufficientCollateral,

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Insufficient input amount")]
    InsufficientInputAmount,

    #[error("Insufficient output amount")]
    InsufficientOutputAmount,

    #[error("Insufficient liquidity minted")]
    InsufficientLiquidityMinted,

    #[error("Insufficient liquidity burned")]
    InsufficientLiquidityBurned,

    #[error("Insufficient pool shares")]
    InsufficientShares,

    #[error("Insufficient cash in lending pool")]
    InsufficientCash,

    #[error("Insufficient protocol reserves")]
    InsufficientReserves,

    #[error("Constant product invariant violated")]
    InvariantViolated,

    #[error("Reserve exceeds 112-bit bound")]
    ReserveOverflow,

    // ========================================================================
    // State Errors
    // ========================================================================

    #[error("Position is healthy")]
    PositionHealthy,

    #[error("Position already marked OTM")]
    AlreadyMarked,

    #[error("Position is not marked OTM")]
    NotMarked,

    #[error("Grace period still active")]
    GracePeriodActive,

    #[error("Position is empty")]
    EmptyPosition,

    #[error("Already initialized")]
    AlreadyInitialized,

    #[error("Reentrancy detected")]
    ReentrancyDetected,

    #[error("Unknown token")]
    UnknownToken,

    #[error("Invalid recipient")]
    InvalidRecipient,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    // ========================================================================
    // Numeric Errors
    // ========================================================================

    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,
}

/// Result type using core errors
pub type CoreResult<T> = Result<T, FloorLendError>;

impl FloorLendError {
    /// Stable numeric code. Codes are never reassigned.
    pub fn code(&self) -> u32 {
        match self {
            Self::UnauthorizedBorrower => 1001,
            Self::UnauthorizedAdmin => 1002,
            Self::ShareTransferRestricted => 1003,
            Self::InsufficientBalance => 1004,

            Self::ExceedsFloorPrice => 2001,
            Self::WithdrawBlockedByDebt => 2002,
            Self::InsufficientCollateral => 2003,
            Self::InsufficientLiquidity => 2004,
            Self::InsufficientInputAmount => 2005,
            Self::InsufficientOutputAmount => 2006,
            Self::InsufficientLiquidityMinted => 2007,
            Self::InsufficientLiquidityBurned => 2008,
            Self::InsufficientShares => 2009,
            Self::InsufficientCash => 2010,
            Self::InsufficientReserves => 2011,
            Self::InvariantViolated => 2012,
            Self::ReserveOverflow => 2013,

            Self::PositionHealthy => 3001,
            Self::AlreadyMarked => 3002,
            Self::NotMarked => 3003,
            Self::GracePeriodActive => 3004,
            Self::EmptyPosition => 3005,
            Self::AlreadyInitialized => 3006,
            Self::ReentrancyDetected => 3007,
            Self::UnknownToken => 3008,
            Self::InvalidRecipient => 3009,
            Self::InvalidAmount => 3010,
            Self::InvalidParameter(_) => 3011,

            Self::MathOverflow => 4001,
            Self::MathUnderflow => 4002,
            Self::DivisionByZero => 4003,
        }
    }

    /// Category derived from the code range
    pub fn category(&self) -> ErrorCategory {
        match self.code() / 1000 {
            1 => ErrorCategory::Authorization,
            2 => ErrorCategory::EconomicLimit,
            3 => ErrorCategory::State,
            _ => ErrorCategory::Numeric,
        }
    }

    /// True when the same call may succeed later without any change to the position
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GracePeriodActive | Self::ReentrancyDetected)
    }
}
