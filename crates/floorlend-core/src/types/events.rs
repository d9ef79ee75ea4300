//! Event definitions
//!
//! Appended to the market's event log by each successful entry point and
//! drained by indexers.

use serde::Serialize;

use super::Address;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    LiquidityAdded {
        provider: Address,
        to: Address,
        amount_collateral: u128,
        amount_quote: u128,
        shares: u128,
        timestamp: i64,
    },
    LiquidityRemoved {
        owner: Address,
        to: Address,
        amount_collateral: u128,
        amount_quote: u128,
        shares: u128,
        timestamp: i64,
    },
    Trade {
        recipient: Address,
        amount_in_collateral: u128,
        amount_in_quote: u128,
        amount_out_collateral: u128,
        amount_out_quote: u128,
        fee_bps: u16,
        timestamp: i64,
    },
    /// Pool shares minted to the fee collector from reserve growth
    FeeCaptured {
        collector: Address,
        shares: u128,
        timestamp: i64,
    },
    LenderDeposited {
        lender: Address,
        assets: u128,
        shares: u128,
        timestamp: i64,
    },
    LenderRedeemed {
        lender: Address,
        assets: u128,
        shares: u128,
        timestamp: i64,
    },
    CollateralDeposited {
        account: Address,
        amount: u128,
        timestamp: i64,
    },
    CollateralWithdrawn {
        account: Address,
        amount: u128,
        timestamp: i64,
    },
    Borrowed {
        account: Address,
        amount: u128,
        debt_after: u128,
        floor_price: u128,
        timestamp: i64,
    },
    Repaid {
        account: Address,
        payer: Address,
        amount: u128,
        debt_after: u128,
        timestamp: i64,
    },
    MarkedOtm {
        account: Address,
        caller: Address,
        debt: u128,
        timestamp: i64,
    },
    Recovered {
        account: Address,
        caller: Address,
        collateral_sold: u128,
        quote_received: u128,
        debt_repaid: u128,
        bounty: u128,
        yield_credited: u128,
        loss_absorbed: u128,
        timestamp: i64,
    },
    LossAbsorbed {
        account: Address,
        amount: u128,
        timestamp: i64,
    },
}

impl MarketEvent {
    pub fn timestamp(&self) -> i64 {
        match self {
            MarketEvent::LiquidityAdded { timestamp, .. }
            | MarketEvent::LiquidityRemoved { timestamp, .. }
            | MarketEvent::Trade { timestamp, .. }
            | MarketEvent::FeeCaptured { timestamp, .. }
            | MarketEvent::LenderDeposited { timestamp, .. }
            | MarketEvent::LenderRedeemed { timestamp, .. }
            | MarketEvent::CollateralDeposited { timestamp, .. }
            | MarketEvent::CollateralWithdrawn { timestamp, .. }
            | MarketEvent::Borrowed { timestamp, .. }
            | MarketEvent::Repaid { timestamp, .. }
            | MarketEvent::MarkedOtm { timestamp, .. }
            | MarketEvent::Recovered { timestamp, .. }
            | MarketEvent::LossAbsorbed { timestamp, .. } => *timestamp,
        }
    }
}
