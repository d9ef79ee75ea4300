//! Shared fixtures for integration tests

#![allow(dead_code)]

use floorlend_core::{Address, Market, MarketConfig, MemoryLedger, TokenLedger};
use tracing_subscriber::EnvFilter;

pub const GRACE: i64 = 3_600;

pub struct Fixture {
    pub market: Market<MemoryLedger>,
    pub deployer: Address,
    pub lp: Address,
    pub lender: Address,
    pub borrower: Address,
    pub trader: Address,
    pub collateral: Address,
    pub quote: Address,
}

impl Fixture {
    pub fn collateral_balance(&self, owner: &Address) -> u128 {
        self.market.ledger().balance_of(&self.collateral, owner)
    }

    pub fn quote_balance(&self, owner: &Address) -> u128 {
        self.market.ledger().balance_of(&self.quote, owner)
    }

    /// Borrower deposits 100k collateral and borrows the full limit
    pub fn borrow_max(&mut self, now: i64) -> u128 {
        let borrower = self.borrower;
        self.market.deposit_collateral(&borrower, 100_000, now).unwrap();
        let max = self.market.max_borrow(&borrower).unwrap();
        self.market.borrow(&borrower, max, now).unwrap();
        max
    }

    /// Trader sells all 500k of their collateral into the pool
    pub fn crash(&mut self, now: i64) {
        let (trader, collateral) = (self.trader, self.collateral);
        self.market
            .swap_exact_input(&trader, &collateral, 500_000, 1, now)
            .unwrap();
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Pool seeded 1M/1M, 600k collateral held outside it, 1M quote lent
pub fn launch() -> Fixture {
    launch_with(MarketConfig::default())
}

pub fn launch_with(config: MarketConfig) -> Fixture {
    init_tracing();

    let mut ledger = MemoryLedger::new();
    let collateral = ledger.create_token();
    let quote = ledger.create_token();
    let deployer = Address::new_unique();
    let lp = Address::new_unique();
    let lender = Address::new_unique();
    let borrower = Address::new_unique();
    let trader = Address::new_unique();

    ledger.mint(&collateral, &lp, 1_000_000).unwrap();
    ledger.mint(&collateral, &borrower, 100_000).unwrap();
    ledger.mint(&collateral, &trader, 500_000).unwrap();
    ledger.mint(&quote, &lp, 1_000_000).unwrap();
    ledger.mint(&quote, &lender, 1_000_000).unwrap();
    ledger.mint(&quote, &borrower, 100_000).unwrap();
    ledger.mint(&quote, &trader, 2_000_000).unwrap();

    let mut market = Market::launch(config, ledger, deployer, collateral, quote, 0).unwrap();
    market.add_liquidity(&lp, 1_000_000, 1_000_000, &lp, 0).unwrap();
    market.deposit(&lender, 1_000_000, 0).unwrap();
    market.drain_events();

    Fixture {
        market,
        deployer,
        lp,
        lender,
        borrower,
        trader,
        collateral,
        quote,
    }
}
