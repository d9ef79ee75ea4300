//! # Property Tests
//!
//! Randomized checks of the floor price, the pool invariant and lending
//! solvency.

mod common;

use floorlend_core::oracle::{floor_price, FloorInputs};
use floorlend_core::pool::{FeeSchedule, TradingPool};
use floorlend_core::{Address, FloorLendError, MemoryLedger, TokenLedger, WAD};
use proptest::prelude::*;

prop_compose! {
    /// Reserves deep enough that rounding stays below the effects under test
    fn reserves()(
        t in 1_000_000u128..1_000_000_000_000u128,
        q in 100_000_000u128..1_000_000_000_000u128,
    ) -> (u128, u128) {
        (t, q)
    }
}

fn inputs(t: u128, q: u128, s: u128, fee_bps: u16) -> FloorInputs {
    FloorInputs {
        reserve_collateral: t,
        reserve_quote: q,
        circulating_supply: s,
        fee_bps,
    }
}

#[derive(Debug, Clone)]
enum Swap {
    SellCollateral(u128),
    SellQuote(u128),
}

fn swap_strategy() -> impl Strategy<Value = Swap> {
    prop_oneof![
        (1u128..200_000u128).prop_map(Swap::SellCollateral),
        (1u128..200_000u128).prop_map(Swap::SellQuote),
    ]
}

proptest! {
    /// Burning supply never lowers the floor
    #[test]
    fn prop_floor_non_increasing_in_supply(
        (t, q) in reserves(),
        first_bps in 100u128..50_000u128,
        gap_bps in 100u128..50_000u128,
        fee_bps in 0u16..1_000u16,
    ) {
        let s1 = t + t * first_bps / 10_000;
        let s2 = s1 + t * gap_bps / 10_000;
        let p1 = floor_price(inputs(t, q, s1, fee_bps));
        let p2 = floor_price(inputs(t, q, s2, fee_bps));
        prop_assert!(p1 >= p2, "pMin({}) = {} < pMin({}) = {}", s1, p1, s2, p2);
    }

    /// A higher fee lands less of the dump in the pool, releasing less quote
    /// per nominal unit dumped
    // The floor averages over the nominal dump, not the post-fee amount, so
    // the fee can only lower it (see `oracle::floor_price`).
    #[test]
    fn prop_floor_non_increasing_in_fee(
        (t, q) in reserves(),
        dump_bps in 100u128..50_000u128,
        f1 in 0u16..5_000u16,
        step in 50u16..1_000u16,
    ) {
        let s = t + t * dump_bps / 10_000;
        let f2 = f1 + step;
        let p1 = floor_price(inputs(t, q, s, f1));
        let p2 = floor_price(inputs(t, q, s, f2));
        prop_assert!(p1 >= p2, "pMin(fee {}) = {} < pMin(fee {}) = {}", f1, p1, f2, p2);
    }

    /// The floor never exceeds the undiscounted spot price once a meaningful
    /// share of supply sits outside the pool
    #[test]
    fn prop_floor_below_spot_for_large_dumps(
        (t, q) in reserves(),
        dump_bps in 1_000u128..50_000u128,
        fee_bps in 0u16..1_000u16,
    ) {
        let s = t + t * dump_bps / 10_000;
        let spot = q * WAD / t;
        prop_assert!(floor_price(inputs(t, q, s, fee_bps)) < spot);
    }

    /// Reserve product never decreases across any trade sequence
    #[test]
    fn prop_product_never_decreases(swaps in prop::collection::vec(swap_strategy(), 1..20)) {
        let mut ledger = MemoryLedger::new();
        let collateral = ledger.create_token();
        let quote = ledger.create_token();
        let lp = Address::new_unique();
        let trader = Address::new_unique();
        ledger.mint(&collateral, &lp, 1_000_000).unwrap();
        ledger.mint(&quote, &lp, 3_000_000).unwrap();
        ledger.mint(&collateral, &trader, 10_000_000).unwrap();
        ledger.mint(&quote, &trader, 10_000_000).unwrap();

        let schedule = FeeSchedule {
            start_fee_bps: 100,
            end_fee_bps: 30,
            decay_target: 1_000_000,
            initial_supply: ledger.total_supply(&collateral),
        };
        let mut pool = TradingPool::new(Address::new_unique(), collateral, quote, lp, schedule, 9_000);
        pool.add_liquidity(&mut ledger, &lp, 1_000_000, 3_000_000, &lp).unwrap();

        for swap in swaps {
            let (rc, rq) = pool.reserves();
            let before = rc * rq;
            let (mint, amount) = match swap {
                Swap::SellCollateral(amount) => (collateral, amount),
                Swap::SellQuote(amount) => (quote, amount),
            };
            match pool.swap_exact_input(&mut ledger, &trader, &mint, amount, 1, &trader) {
                Ok(_) => {}
                Err(FloorLendError::InsufficientOutputAmount) => continue,
                Err(err) => return Err(TestCaseError::fail(format!("unexpected {err}"))),
            }
            let (rc, rq) = pool.reserves();
            prop_assert!(rc * rq >= before);
            prop_assert_eq!(ledger.balance_of(&collateral, &pool.address), rc);
            prop_assert_eq!(ledger.balance_of(&quote, &pool.address), rq);
        }
    }

    /// Every accepted borrow leaves debt within collateral × pMin, and every
    /// rejected one would not have
    #[test]
    fn prop_debt_within_floor_at_borrow(
        collateral in 1_000u128..100_000u128,
        fraction_bps in 1u128..20_000u128,
        elapsed in 0i64..10_000_000i64,
    ) {
        let mut fx = common::launch();
        let borrower = fx.borrower;
        fx.market.deposit_collateral(&borrower, collateral, 0).unwrap();
        let max = fx.market.max_borrow(&borrower).unwrap();
        let first = (max / 2).max(1);
        prop_assume!(first <= max);
        fx.market.borrow(&borrower, first, 0).unwrap();

        fx.market.accrue(elapsed).unwrap();
        let floor = fx.market.floor_price();
        let amount = (max * fraction_bps / 10_000).max(1);
        match fx.market.borrow(&borrower, amount, elapsed) {
            Ok(outcome) => {
                prop_assert!(outcome.debt_after <= collateral * floor / WAD);
                prop_assert_eq!(outcome.debt_after, fx.market.debt_of(&borrower).unwrap());
            }
            Err(err) => {
                prop_assert_eq!(err, FloorLendError::ExceedsFloorPrice);
                prop_assert!(fx.market.debt_of(&borrower).unwrap() + amount > max);
            }
        }
        let lending = fx.market.lending();
        prop_assert!(lending.total_assets() >= lending.total_borrows());
    }

    /// Lending stays solvent through borrow, crash, mark, recover and repay
    #[test]
    fn prop_solvency_across_recovery(
        borrow_bps in 1_000u128..10_000u128,
        crash_amount in 1u128..500_000u128,
        delay in 0i64..100_000i64,
    ) {
        let mut fx = common::launch();
        let (borrower, trader, collateral) = (fx.borrower, fx.trader, fx.collateral);
        fx.market.deposit_collateral(&borrower, 100_000, 0).unwrap();
        let max = fx.market.max_borrow(&borrower).unwrap();
        fx.market.borrow(&borrower, max * borrow_bps / 10_000, 0).unwrap();

        let check = |fx: &common::Fixture| {
            let lending = fx.market.lending();
            lending.total_assets() >= lending.total_borrows()
        };
        prop_assert!(check(&fx));

        let _ = fx.market.swap_exact_input(&trader, &collateral, crash_amount, 1, 10);
        prop_assert!(check(&fx));

        let marked = fx.market.mark_otm(&trader, &borrower, 20).is_ok();
        prop_assert!(check(&fx));

        let now = 20 + common::GRACE + delay;
        if marked {
            fx.market.recover(&trader, &borrower, now).unwrap();
            prop_assert!(fx.market.position(&borrower).is_none());
        } else {
            let outcome = fx.market.repay(&borrower, &borrower, u128::MAX, now).unwrap();
            prop_assert_eq!(outcome.debt_after, 0);
        }
        prop_assert!(check(&fx));
        prop_assert_eq!(fx.market.vault().total_collateral(), fx.collateral_balance(&fx.market.vault().address));
    }
}
