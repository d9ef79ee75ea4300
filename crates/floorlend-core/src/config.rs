//! # Market Configuration
//!
//! Per-market parameters fixed at launch, loaded from TOML. Every field falls
//! back to the protocol default when omitted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst, TryFromInto};
use thiserror::Error;

use crate::constants::*;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }
}

/// Parameters of a single market.
///
/// TOML integers stop at `i64::MAX`, so the wide fields also accept a decimal
/// string (`decay_target = "100000000000000000000000000"`) and are written
/// back as strings.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Trade fee at launch (basis points)
    pub start_fee_bps: u16,

    /// Trade fee once `decay_target` collateral units have been burned
    pub end_fee_bps: u16,

    /// Burned collateral units over which the fee decays linearly
    #[serde_as(as = "PickFirst<(DisplayFromStr, TryFromInto<u64>)>")]
    pub decay_target: u128,

    /// Share of reserve growth minted to the fee collector (basis points)
    pub fee_capture_bps: u16,

    /// Annual borrow rate at zero utilization (WAD)
    #[serde_as(as = "PickFirst<(DisplayFromStr, TryFromInto<u64>)>")]
    pub base_rate_wad: u128,

    /// Rate added between zero utilization and the kink (WAD)
    #[serde_as(as = "PickFirst<(DisplayFromStr, TryFromInto<u64>)>")]
    pub slope_wad: u128,

    /// Utilization at which the curve steepens (WAD)
    #[serde_as(as = "PickFirst<(DisplayFromStr, TryFromInto<u64>)>")]
    pub kink_wad: u128,

    /// Multiplier applied to the slope above the kink
    #[serde_as(as = "PickFirst<(DisplayFromStr, TryFromInto<u64>)>")]
    pub steep_multiplier: u128,

    /// Fraction of interest credited to protocol reserves (basis points)
    pub reserve_factor_bps: u16,

    /// Seconds between marking a position OTM and recovering it
    pub grace_period_secs: i64,

    /// Floor discount and recovery bounty (basis points)
    pub recovery_bounty_bps: u16,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            start_fee_bps: DEFAULT_START_FEE_BPS,
            end_fee_bps: DEFAULT_END_FEE_BPS,
            decay_target: DEFAULT_DECAY_TARGET,
            fee_capture_bps: DEFAULT_FEE_CAPTURE_BPS,
            base_rate_wad: DEFAULT_BASE_RATE_WAD,
            slope_wad: DEFAULT_SLOPE_WAD,
            kink_wad: DEFAULT_KINK_WAD,
            steep_multiplier: DEFAULT_STEEP_MULTIPLIER,
            reserve_factor_bps: DEFAULT_RESERVE_FACTOR_BPS,
            grace_period_secs: GRACE_PERIOD_SECS,
            recovery_bounty_bps: RECOVERY_BOUNTY_BPS,
        }
    }
}

impl MarketConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MarketConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_fee_bps >= MAX_BPS {
            return Err(ConfigError::invalid("start_fee_bps", "must be below 10000"));
        }
        if self.end_fee_bps > self.start_fee_bps {
            return Err(ConfigError::invalid(
                "end_fee_bps",
                format!("must not exceed start_fee_bps ({})", self.start_fee_bps),
            ));
        }
        if self.decay_target == 0 && self.start_fee_bps != self.end_fee_bps {
            return Err(ConfigError::invalid("decay_target", "must be greater than 0 when the fee decays"));
        }
        if self.fee_capture_bps > MAX_BPS {
            return Err(ConfigError::invalid("fee_capture_bps", "must not exceed 10000"));
        }
        if self.kink_wad == 0 || self.kink_wad > WAD {
            return Err(ConfigError::invalid("kink_wad", "must be in (0, 1e18]"));
        }
        // Below the kink the slope is spread over `kink_wad`, above it over WAD
        if self.steep_multiplier.saturating_mul(self.kink_wad) <= WAD {
            return Err(ConfigError::invalid(
                "steep_multiplier",
                format!("must exceed 1e18 / kink_wad ({})", WAD / self.kink_wad),
            ));
        }
        if self.reserve_factor_bps > MAX_BPS {
            return Err(ConfigError::invalid("reserve_factor_bps", "must not exceed 10000"));
        }
        if self.recovery_bounty_bps > MAX_BPS {
            return Err(ConfigError::invalid("recovery_bounty_bps", "must not exceed 10000"));
        }
        if self.grace_period_secs < 0 {
            return Err(ConfigError::invalid("grace_period_secs", "must not be negative"));
        }
        Ok(())
    }
}
