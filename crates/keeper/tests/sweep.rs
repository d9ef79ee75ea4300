use floorlend_core::{Address, Market, MarketConfig, MemoryLedger, TokenLedger};
use floorlend_keeper::{Keeper, KeeperConfig};
use tracing_subscriber::EnvFilter;

const GRACE: i64 = 3_600;

struct Setup {
    market: Market<MemoryLedger>,
    borrower: Address,
    trader: Address,
    collateral: Address,
    quote: Address,
}

fn setup() -> Setup {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

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
    ledger.mint(&quote, &trader, 1_000_000).unwrap();

    let config = MarketConfig {
        grace_period_secs: GRACE,
        ..MarketConfig::default()
    };
    let mut market = Market::launch(config, ledger, deployer, collateral, quote, 0).unwrap();
    market.add_liquidity(&lp, 1_000_000, 1_000_000, &lp, 0).unwrap();
    market.deposit(&lender, 1_000_000, 0).unwrap();

    market.deposit_collateral(&borrower, 100_000, 0).unwrap();
    let max = market.max_borrow(&borrower).unwrap();
    market.borrow(&borrower, max, 0).unwrap();

    Setup {
        market,
        borrower,
        trader,
        collateral,
        quote,
    }
}

impl Setup {
    fn crash(&mut self) {
        let (trader, collateral) = (self.trader, self.collateral);
        self.market
            .swap_exact_input(&trader, &collateral, 500_000, 1, 0)
            .unwrap();
    }
}

#[test]
fn test_healthy_market_is_left_alone() {
    let mut s = setup();
    let keeper = Keeper::new(KeeperConfig::new(Address::new_unique())).unwrap();

    let report = keeper.sweep(&mut s.market, 10);
    assert_eq!(report.scanned, 1);
    assert!(report.marked.is_empty());
    assert!(report.recovered.is_empty());
    assert!(report.failures.is_empty());
}

#[test]
fn test_mark_then_recover_after_grace() {
    let mut s = setup();
    let caller = Address::new_unique();
    let keeper = Keeper::new(KeeperConfig::new(caller)).unwrap();
    s.crash();

    let report = keeper.sweep(&mut s.market, 10);
    assert_eq!(report.marked, vec![s.borrower]);
    assert!(s.market.position(&s.borrower).unwrap().is_marked());

    let report = keeper.sweep(&mut s.market, 10 + GRACE - 1);
    assert_eq!(report.waiting, vec![s.borrower]);
    assert!(report.recovered.is_empty());
    assert!(report.failures.is_empty());

    let report = keeper.sweep(&mut s.market, 10 + GRACE);
    assert_eq!(report.recovered, vec![s.borrower]);
    assert!(report.loss_absorbed > 0);
    assert_eq!(report.bounty_earned, 0);

    let position = s.market.position(&s.borrower).copied().unwrap_or_default();
    assert_eq!(position.collateral, 0);
    assert!(!position.has_debt());
    assert_eq!(s.market.ledger().balance_of(&s.quote, &caller), 0);

    let report = keeper.sweep(&mut s.market, 20 + GRACE);
    assert_eq!(report.scanned, 0);
}

#[test]
fn test_rebounded_position_is_not_recovered() {
    let mut s = setup();
    let keeper = Keeper::new(KeeperConfig::new(Address::new_unique())).unwrap();
    s.crash();
    keeper.sweep(&mut s.market, 10);

    let (trader, quote) = (s.trader, s.quote);
    s.market.swap_exact_input(&trader, &quote, 600_000, 1, 20).unwrap();

    let report = keeper.sweep(&mut s.market, 10 + GRACE);
    assert_eq!(report.rebounded, vec![s.borrower]);
    assert!(report.recovered.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(s.market.position(&s.borrower).unwrap().collateral, 100_000);
}

#[test]
fn test_recover_only_mode_does_not_mark() {
    let mut s = setup();
    let mut config = KeeperConfig::new(Address::new_unique());
    config.mark_unhealthy = false;
    let keeper = Keeper::new(config).unwrap();
    s.crash();

    let report = keeper.sweep(&mut s.market, 10);
    assert_eq!(report.scanned, 1);
    assert!(report.marked.is_empty());
    assert!(!s.market.position(&s.borrower).unwrap().is_marked());
}

#[test]
fn test_small_positions_are_skipped() {
    let mut s = setup();
    let mut config = KeeperConfig::new(Address::new_unique());
    config.min_collateral = 200_000;
    let keeper = Keeper::new(config).unwrap();
    s.crash();

    let report = keeper.sweep(&mut s.market, 10);
    assert_eq!(report.skipped_dust, 1);
    assert!(report.marked.is_empty());
}

#[test]
fn test_report_serializes() {
    let mut s = setup();
    let keeper = Keeper::new(KeeperConfig::new(Address::new_unique())).unwrap();
    s.crash();

    let json = keeper.sweep(&mut s.market, 10).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["scanned"], 1);
    assert_eq!(value["marked"][0], s.borrower.to_string());
}
