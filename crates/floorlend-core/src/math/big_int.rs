//! Big integer operations for high-precision math
//!
//! Reserve products and mul-div intermediates need 256 bits. These helpers
//! wrap `ethnum::U256` with protocol errors and explicit rounding.

use ethnum::U256;

use crate::errors::{CoreResult, FloorLendError};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

/// Widen a u128 into a U256
pub fn widen(value: u128) -> U256 {
    U256::new(value)
}

/// Narrow a U256 back into a u128, returning None if it does not fit
pub fn narrow(value: U256) -> Option<u128> {
    if value > U256::new(u128::MAX) {
        None
    } else {
        Some(value.as_u128())
    }
}

/// Calculate (a * b) / c with a 256-bit intermediate
pub fn mul_div(a: u128, b: u128, c: u128, rounding: Rounding) -> CoreResult<u128> {
    let result = mul_div_u256(widen(a), widen(b), widen(c), rounding)?;
    narrow(result).ok_or(FloorLendError::MathOverflow)
}

/// Calculate (a * b) / c entirely in 256 bits
pub fn mul_div_u256(a: U256, b: U256, c: U256, rounding: Rounding) -> CoreResult<U256> {
    if c == U256::ZERO {
        return Err(FloorLendError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(FloorLendError::MathOverflow)?;
    let quotient = product / c;
    match rounding {
        Rounding::Down => Ok(quotient),
        Rounding::Up => {
            if product % c == U256::ZERO {
                Ok(quotient)
            } else {
                quotient.checked_add(U256::ONE).ok_or(FloorLendError::MathOverflow)
            }
        }
    }
}

/// Product of two reserves
pub fn product(a: u128, b: u128) -> CoreResult<U256> {
    widen(a).checked_mul(widen(b)).ok_or(FloorLendError::MathOverflow)
}

/// Integer square root (floor) of a U256
pub fn sqrt_u256(n: U256) -> U256 {
    if n < U256::new(2) {
        return n;
    }

    // Newton's method for integer square root
    let two = U256::new(2);
    let mut x = n;
    let mut y = n / two + U256::ONE;
    while y < x {
        x = y;
        y = (x + n / x) / two;
    }
    x
}
