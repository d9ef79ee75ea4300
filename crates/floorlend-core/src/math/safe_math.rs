//! # Safe Math Operations
//!
//! Overflow-checked arithmetic for token amounts and fixed-point values.

use crate::constants::{BPS_DENOMINATOR, WAD};
use crate::errors::{CoreResult, FloorLendError};
use crate::math::big_int::{mul_div, Rounding};

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    // Division operations with zero check
    (div, $fn_name:ident, $type:ty) => {
        /// Safe division with zero check
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            if b == 0 {
                return Err(FloorLendError::DivisionByZero);
            }
            Ok(a / b)
        }
    };

    // Binary operations with checked methods
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        /// Checked binary operation returning a protocol error on failure
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };
}

safe_arith!(safe_add_u128, u128, checked_add, FloorLendError::MathOverflow);
safe_arith!(safe_sub_u128, u128, checked_sub, FloorLendError::MathUnderflow);
safe_arith!(safe_mul_u128, u128, checked_mul, FloorLendError::MathOverflow);
safe_arith!(div, safe_div_u128, u128);

/// Apply a basis-point fraction, rounding down
pub fn apply_bps(value: u128, bps: u16) -> CoreResult<u128> {
    mul_div(value, bps as u128, BPS_DENOMINATOR, Rounding::Down)
}

/// Multiply two WAD values
pub fn wad_mul(a: u128, b: u128) -> CoreResult<u128> {
    mul_div(a, b, WAD, Rounding::Down)
}

/// Divide two WAD values
pub fn wad_div(a: u128, b: u128) -> CoreResult<u128> {
    mul_div(a, WAD, b, Rounding::Down)
}
