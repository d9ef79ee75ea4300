//! Kinked utilization rate curve.

use serde::{Deserialize, Serialize};

use crate::config::MarketConfig;
use crate::constants::WAD;
use crate::math::big_int::{mul_div, Rounding};

/// Annual borrow rate as a function of utilization, both WAD-scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateModel {
    pub base_rate_wad: u128,
    pub slope_wad: u128,
    pub kink_wad: u128,
    pub steep_multiplier: u128,
}

impl RateModel {
    pub fn from_config(config: &MarketConfig) -> Self {
        Self {
            base_rate_wad: config.base_rate_wad,
            slope_wad: config.slope_wad,
            kink_wad: config.kink_wad,
            steep_multiplier: config.steep_multiplier,
        }
    }

    /// `borrows / (cash + borrows)`, capped at 100%
    pub fn utilization(cash: u128, borrows: u128) -> u128 {
        if borrows == 0 {
            return 0;
        }
        let total = cash.saturating_add(borrows);
        mul_div(borrows, WAD, total, Rounding::Down)
            .unwrap_or(WAD)
            .min(WAD)
    }

    /// Rate at `utilization`. At the kink this is exactly `base + slope`.
    pub fn borrow_rate(&self, utilization: u128) -> u128 {
        let utilization = utilization.min(WAD);
        if self.kink_wad == 0 {
            return self.base_rate_wad.saturating_add(self.slope_wad);
        }
        if utilization <= self.kink_wad {
            let climb = mul_div(utilization, self.slope_wad, self.kink_wad, Rounding::Down).unwrap_or(self.slope_wad);
            return self.base_rate_wad.saturating_add(climb);
        }
        let excess = utilization - self.kink_wad;
        let steep = mul_div(excess, self.slope_wad, WAD, Rounding::Down)
            .unwrap_or(u128::MAX)
            .saturating_mul(self.steep_multiplier);
        self.base_rate_wad
            .saturating_add(self.slope_wad)
            .saturating_add(steep)
    }
}

impl Default for RateModel {
    fn default() -> Self {
        Self::from_config(&MarketConfig::default())
    }
}
