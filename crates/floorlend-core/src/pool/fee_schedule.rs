//! Trade fee that decays linearly as collateral supply is burned.

use serde::{Deserialize, Serialize};

use crate::math::big_int::{mul_div, Rounding};

/// Immutable fee-decay parameters fixed at pool creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub start_fee_bps: u16,
    pub end_fee_bps: u16,
    /// Burned units at which the fee reaches `end_fee_bps`
    pub decay_target: u128,
    /// Collateral total supply captured at pool creation
    pub initial_supply: u128,
}

impl FeeSchedule {
    /// Fee for the given current collateral supply
    pub fn fee_bps(&self, current_supply: u128) -> u16 {
        let burned = self.initial_supply.saturating_sub(current_supply);
        if burned >= self.decay_target || self.start_fee_bps <= self.end_fee_bps {
            return self.end_fee_bps;
        }
        // burned < decay_target, so the decay fits in the fee range
        let range = (self.start_fee_bps - self.end_fee_bps) as u128;
        let decayed = mul_div(range, burned, self.decay_target, Rounding::Down).unwrap_or(range);
        self.start_fee_bps - decayed as u16
    }
}
