//! # Lending Pool
//!
//! Shared quote-asset liquidity lent to authorized borrower-management
//! components. Interest accrues lazily at the top of every state-changing
//! entry point and compounds into `total_borrows` and the borrow index.
//!
//! Accounting identities:
//! - `total_assets = cash + total_borrows`
//! - lenders own `total_assets - reserves`

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::constants::{SECONDS_PER_YEAR, WAD};
use crate::errors::{CoreResult, FloorLendError};
use crate::ledger::TokenLedger;
use crate::math::big_int::{mul_div, Rounding};
use crate::math::safe_math::{apply_bps, safe_add_u128, safe_sub_u128, wad_mul};
use crate::reentrancy::{non_reentrant, ReentrancyStatus};
use crate::types::Address;

use super::RateModel;

#[derive(Debug, Clone)]
pub struct LendingPool {
    /// The pool's own account in the token ledger
    pub address: Address,
    /// Quote asset lent out
    pub asset: Address,
    pub rate_model: RateModel,
    pub reserve_factor_bps: u16,
    admin: Address,
    authorized: BTreeSet<Address>,
    cash: u128,
    total_borrows: u128,
    reserves: u128,
    borrow_index: u128,
    last_accrual: i64,
    lender_shares: BTreeMap<Address, u128>,
    total_lender_shares: u128,
    lock: ReentrancyStatus,
}

impl LendingPool {
    pub fn new(
        address: Address,
        asset: Address,
        admin: Address,
        rate_model: RateModel,
        reserve_factor_bps: u16,
        now: i64,
    ) -> Self {
        Self {
            address,
            asset,
            rate_model,
            reserve_factor_bps,
            admin,
            authorized: BTreeSet::new(),
            cash: 0,
            total_borrows: 0,
            reserves: 0,
            borrow_index: WAD,
            last_accrual: now,
            lender_shares: BTreeMap::new(),
            total_lender_shares: 0,
            lock: ReentrancyStatus::Unlocked,
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn cash(&self) -> u128 {
        self.cash
    }

    pub fn total_borrows(&self) -> u128 {
        self.total_borrows
    }

    pub fn reserves(&self) -> u128 {
        self.reserves
    }

    pub fn borrow_index(&self) -> u128 {
        self.borrow_index
    }

    pub fn last_accrual(&self) -> i64 {
        self.last_accrual
    }

    pub fn total_assets(&self) -> u128 {
        self.cash.saturating_add(self.total_borrows)
    }

    /// Assets owned by lenders
    pub fn lender_assets(&self) -> u128 {
        self.total_assets().saturating_sub(self.reserves)
    }

    pub fn utilization(&self) -> u128 {
        RateModel::utilization(self.cash, self.total_borrows)
    }

    /// Annual borrow rate at the current utilization (WAD)
    pub fn current_rate(&self) -> u128 {
        self.rate_model.borrow_rate(self.utilization())
    }

    pub fn is_authorized(&self, component: &Address) -> bool {
        self.authorized.contains(component)
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn lender_shares(&self, lender: &Address) -> u128 {
        self.lender_shares.get(lender).copied().unwrap_or(0)
    }

    pub fn total_lender_shares(&self) -> u128 {
        self.total_lender_shares
    }

    /// Debt of a position that borrowed `principal` when the index stood at
    /// `index_snapshot`, rounded up
    pub fn debt_with_interest(&self, principal: u128, index_snapshot: u128) -> CoreResult<u128> {
        if principal == 0 {
            return Ok(0);
        }
        mul_div(principal, self.borrow_index, index_snapshot, Rounding::Up)
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Allow `component` to borrow and report losses
    pub fn authorize(&mut self, caller: &Address, component: Address) -> CoreResult<()> {
        self.require_admin(caller)?;
        self.authorized.insert(component);
        debug!(%component, "borrower authorized");
        Ok(())
    }

    pub fn revoke(&mut self, caller: &Address, component: &Address) -> CoreResult<()> {
        self.require_admin(caller)?;
        self.authorized.remove(component);
        debug!(%component, "borrower revoked");
        Ok(())
    }

    /// Send up to the accrued protocol reserves to `to`
    pub fn withdraw_reserves<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        caller: &Address,
        amount: u128,
        to: &Address,
        now: i64,
    ) -> CoreResult<()> {
        self.require_admin(caller)?;
        non_reentrant(self, |p| &mut p.lock, |pool| {
            pool.accrue_inner(now)?;
            if amount > pool.reserves {
                return Err(FloorLendError::InsufficientReserves);
            }
            if amount > pool.cash {
                return Err(FloorLendError::InsufficientCash);
            }
            pool.reserves -= amount;
            pool.cash -= amount;
            ledger.transfer(&pool.asset, &pool.address, to, amount)
        })
    }

    // ========================================================================
    // Interest
    // ========================================================================

    /// Bring interest up to `now`
    pub fn accrue(&mut self, now: i64) -> CoreResult<()> {
        non_reentrant(self, |p| &mut p.lock, |pool| pool.accrue_inner(now))
    }

    fn accrue_inner(&mut self, now: i64) -> CoreResult<()> {
        if now <= self.last_accrual {
            return Ok(());
        }
        let elapsed = (now - self.last_accrual) as u128;
        self.last_accrual = now;
        if self.total_borrows == 0 {
            return Ok(());
        }

        let rate = self.current_rate();
        let factor = mul_div(rate, elapsed, SECONDS_PER_YEAR, Rounding::Down)?;
        let interest = wad_mul(self.total_borrows, factor)?;
        let reserve_cut = apply_bps(interest, self.reserve_factor_bps)?;

        self.total_borrows = safe_add_u128(self.total_borrows, interest)?;
        self.reserves = safe_add_u128(self.reserves, reserve_cut)?;
        self.borrow_index = safe_add_u128(self.borrow_index, wad_mul(self.borrow_index, factor)?)?;

        debug!(
            elapsed,
            rate,
            interest,
            total_borrows = self.total_borrows,
            borrow_index = self.borrow_index,
            "interest accrued"
        );
        Ok(())
    }

    // ========================================================================
    // Borrower Side
    // ========================================================================

    /// Lend `amount` to `recipient` on behalf of an authorized component
    pub fn borrow<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        caller: &Address,
        amount: u128,
        recipient: &Address,
        now: i64,
    ) -> CoreResult<()> {
        self.require_authorized(caller)?;
        non_reentrant(self, |p| &mut p.lock, |pool| {
            pool.accrue_inner(now)?;
            if amount == 0 {
                return Err(FloorLendError::InvalidAmount);
            }
            // total_assets >= total_borrows + amount
            if pool.cash < amount {
                return Err(FloorLendError::InsufficientCash);
            }
            pool.total_borrows = safe_add_u128(pool.total_borrows, amount)?;
            pool.cash -= amount;
            ledger.transfer(&pool.asset, &pool.address, recipient, amount)?;
            debug!(%caller, amount, total_borrows = pool.total_borrows, "borrowed");
            Ok(())
        })
    }

    /// Pull up to `amount` from `payer` against outstanding borrows.
    /// Returns the amount actually repaid.
    pub fn repay<L: TokenLedger>(&mut self, ledger: &mut L, payer: &Address, amount: u128, now: i64) -> CoreResult<u128> {
        non_reentrant(self, |p| &mut p.lock, |pool| {
            pool.accrue_inner(now)?;
            let actual = amount.min(pool.total_borrows);
            if actual == 0 {
                return Ok(0);
            }
            ledger.transfer(&pool.asset, payer, &pool.address, actual)?;
            pool.total_borrows -= actual;
            pool.cash = safe_add_u128(pool.cash, actual)?;
            debug!(%payer, actual, total_borrows = pool.total_borrows, "repaid");
            Ok(actual)
        })
    }

    /// Write off `amount` of borrows that will never be repaid.
    /// Returns the amount absorbed.
    pub fn absorb_loss(&mut self, caller: &Address, amount: u128, now: i64) -> CoreResult<u128> {
        self.require_authorized(caller)?;
        non_reentrant(self, |p| &mut p.lock, |pool| {
            pool.accrue_inner(now)?;
            let absorbed = amount.min(pool.total_borrows);
            pool.total_borrows -= absorbed;
            debug!(%caller, absorbed, "loss absorbed");
            Ok(absorbed)
        })
    }

    /// Pull `amount` from an authorized component as lender yield
    pub fn credit_yield<L: TokenLedger>(&mut self, ledger: &mut L, caller: &Address, amount: u128) -> CoreResult<()> {
        self.require_authorized(caller)?;
        non_reentrant(self, |p| &mut p.lock, |pool| {
            ledger.transfer(&pool.asset, caller, &pool.address, amount)?;
            pool.cash = safe_add_u128(pool.cash, amount)?;
            debug!(%caller, amount, "yield credited");
            Ok(())
        })
    }

    // ========================================================================
    // Lender Side
    // ========================================================================

    /// Supply `assets` and mint lender shares. Returns the shares minted.
    pub fn deposit<L: TokenLedger>(&mut self, ledger: &mut L, lender: &Address, assets: u128, now: i64) -> CoreResult<u128> {
        non_reentrant(self, |p| &mut p.lock, |pool| {
            pool.accrue_inner(now)?;
            let owned = pool.lender_assets();
            let shares = if pool.total_lender_shares == 0 || owned == 0 {
                assets
            } else {
                mul_div(assets, pool.total_lender_shares, owned, Rounding::Down)?
            };
            if shares == 0 {
                return Err(FloorLendError::InvalidAmount);
            }

            ledger.transfer(&pool.asset, lender, &pool.address, assets)?;
            pool.cash = safe_add_u128(pool.cash, assets)?;
            pool.total_lender_shares = safe_add_u128(pool.total_lender_shares, shares)?;
            let balance = pool.lender_shares.entry(*lender).or_default();
            *balance = safe_add_u128(*balance, shares)?;

            debug!(%lender, assets, shares, "lender deposited");
            Ok(shares)
        })
    }

    /// Burn `shares` for their share of lender assets, bounded by cash.
    /// Returns the assets paid out.
    pub fn redeem<L: TokenLedger>(&mut self, ledger: &mut L, lender: &Address, shares: u128, now: i64) -> CoreResult<u128> {
        non_reentrant(self, |p| &mut p.lock, |pool| {
            pool.accrue_inner(now)?;
            let balance = pool.lender_shares(lender);
            if shares == 0 || shares > balance {
                return Err(FloorLendError::InsufficientShares);
            }
            let assets = mul_div(shares, pool.lender_assets(), pool.total_lender_shares, Rounding::Down)?;
            if assets > pool.cash {
                return Err(FloorLendError::InsufficientCash);
            }

            pool.lender_shares.insert(*lender, balance - shares);
            pool.total_lender_shares = safe_sub_u128(pool.total_lender_shares, shares)?;
            pool.cash -= assets;
            ledger.transfer(&pool.asset, &pool.address, lender, assets)?;

            debug!(%lender, assets, shares, "lender redeemed");
            Ok(assets)
        })
    }

    fn require_admin(&self, caller: &Address) -> CoreResult<()> {
        if *caller != self.admin {
            return Err(FloorLendError::UnauthorizedAdmin);
        }
        Ok(())
    }

    fn require_authorized(&self, caller: &Address) -> CoreResult<()> {
        if !self.authorized.contains(caller) {
            return Err(FloorLendError::UnauthorizedBorrower);
        }
        Ok(())
    }
}
