use std::fs;
use std::path::Path;

use floorlend_core::Address;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst, TryFromInto};

use crate::error::{KeeperError, KeeperResult};

/// Keeper configuration loaded from TOML file
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeeperConfig {
    /// Account that submits marks and recoveries and collects bounties
    pub caller: Address,

    /// Maximum number of recoveries attempted per sweep
    #[serde(default = "default_max_recoveries")]
    pub max_recoveries_per_sweep: usize,

    /// Whether to mark unhealthy positions, or only recover already-marked ones
    #[serde(default = "default_mark_unhealthy")]
    pub mark_unhealthy: bool,

    /// Positions with less collateral than this are skipped
    #[serde_as(as = "PickFirst<(DisplayFromStr, TryFromInto<u64>)>")]
    #[serde(default)]
    pub min_collateral: u128,
}

fn default_max_recoveries() -> usize {
    16
}

fn default_mark_unhealthy() -> bool {
    true
}

impl KeeperConfig {
    pub fn new(caller: Address) -> Self {
        Self {
            caller,
            max_recoveries_per_sweep: default_max_recoveries(),
            mark_unhealthy: default_mark_unhealthy(),
            min_collateral: 0,
        }
    }

    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> KeeperResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> KeeperResult<Self> {
        let config: KeeperConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> KeeperResult<()> {
        if self.max_recoveries_per_sweep == 0 {
            return Err(KeeperError::InvalidConfig(
                "max_recoveries_per_sweep must be greater than 0".to_string(),
            ));
        }
        if self.caller == Address::DEAD {
            return Err(KeeperError::InvalidConfig("caller must not be the dead address".to_string()));
        }
        Ok(())
    }
}
