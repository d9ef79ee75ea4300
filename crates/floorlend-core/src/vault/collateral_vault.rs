//! # Collateral Vault
//!
//! Holds collateral per account and borrows quote liquidity from the lending
//! pool against it.
//!
//! 1. **Sizing**: new debt is bounded by `collateral × pMin`, the floor price
//!    of the pool the collateral would be sold into.
//! 2. **Health**: a position is healthy while `collateral × spot > debt`.
//!    Health never uses pMin.
//! 3. **Recovery**: an unhealthy position may be marked by anyone. Any
//!    repayment or a fresh borrow during the grace period clears the mark.
//!    After that anyone may sell the collateral of a position that is still
//!    unhealthy through the pool and repay the lending pool, collecting a
//!    bounty out of any surplus. A shortfall is written off rather than
//!    blocking the recovery.

use std::collections::BTreeMap;

use ethnum::U256;
use tracing::debug;

use crate::constants::WAD;
use crate::errors::{CoreResult, FloorLendError};
use crate::lending::LendingPool;
use crate::ledger::TokenLedger;
use crate::math::big_int::{mul_div, widen, Rounding};
use crate::math::safe_math::{apply_bps, safe_add_u128, safe_sub_u128};
use crate::oracle::{floor_price_with_bounty, FloorInputs};
use crate::pool::{get_amount_out, TradingPool};
use crate::reentrancy::{non_reentrant, ReentrancyStatus};
use crate::types::Address;

use super::Position;

/// Components a vault operation reads and moves funds through
pub struct VaultContext<'a, L: TokenLedger> {
    pub ledger: &'a mut L,
    pub pool: &'a mut TradingPool,
    pub lending: &'a mut LendingPool,
    pub now: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowOutcome {
    pub debt_after: u128,
    /// Floor price the borrow was sized against (WAD)
    pub floor_price: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepayOutcome {
    pub repaid: u128,
    pub debt_after: u128,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryOutcome {
    pub collateral_sold: u128,
    pub quote_received: u128,
    pub debt: u128,
    pub debt_repaid: u128,
    pub bounty: u128,
    pub yield_credited: u128,
    pub loss_absorbed: u128,
}

#[derive(Debug, Clone)]
pub struct CollateralVault {
    /// The vault's own account in the token ledger
    pub address: Address,
    pub collateral_mint: Address,
    pub grace_period_secs: i64,
    pub recovery_bounty_bps: u16,
    positions: BTreeMap<Address, Position>,
    total_collateral: u128,
    lock: ReentrancyStatus,
}

impl CollateralVault {
    pub fn new(address: Address, collateral_mint: Address, grace_period_secs: i64, recovery_bounty_bps: u16) -> Self {
        Self {
            address,
            collateral_mint,
            grace_period_secs,
            recovery_bounty_bps,
            positions: BTreeMap::new(),
            total_collateral: 0,
            lock: ReentrancyStatus::Unlocked,
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn position(&self, account: &Address) -> Option<&Position> {
        self.positions.get(account)
    }

    /// Accounts holding collateral or debt
    pub fn accounts(&self) -> impl Iterator<Item = &Address> + '_ {
        self.positions.keys()
    }

    /// Accounts with outstanding debt
    pub fn borrowers(&self) -> impl Iterator<Item = (&Address, &Position)> + '_ {
        self.positions.iter().filter(|(_, p)| p.has_debt())
    }

    pub fn total_collateral(&self) -> u128 {
        self.total_collateral
    }

    /// Floor price of the pool's collateral at the current fee (WAD)
    pub fn floor_price<L: TokenLedger>(&self, ledger: &L, pool: &TradingPool) -> u128 {
        let (reserve_collateral, reserve_quote) = pool.reserves();
        floor_price_with_bounty(
            FloorInputs {
                reserve_collateral,
                reserve_quote,
                circulating_supply: ledger.total_supply(&self.collateral_mint),
                fee_bps: pool.current_fee_bps(ledger),
            },
            self.recovery_bounty_bps,
        )
    }

    /// Debt with interest at the lending pool's last accrual
    pub fn debt_of(&self, lending: &LendingPool, account: &Address) -> CoreResult<u128> {
        match self.positions.get(account) {
            Some(position) => debt_of_position(lending, position),
            None => Ok(0),
        }
    }

    /// Total debt the account's collateral supports at the current floor price
    pub fn max_borrow<L: TokenLedger>(&self, ledger: &L, pool: &TradingPool, account: &Address) -> CoreResult<u128> {
        let collateral = self.positions.get(account).map(|p| p.collateral).unwrap_or(0);
        mul_div(collateral, self.floor_price(ledger, pool), WAD, Rounding::Down)
    }

    /// `collateral × spot > debt`, compared exactly without dividing
    pub fn is_position_healthy(&self, pool: &TradingPool, lending: &LendingPool, account: &Address) -> CoreResult<bool> {
        let Some(position) = self.positions.get(account) else {
            return Ok(true);
        };
        let debt = debt_of_position(lending, position)?;
        Ok(is_healthy(pool, position.collateral, debt))
    }

    // ========================================================================
    // Collateral
    // ========================================================================

    pub fn deposit_collateral<L: TokenLedger>(
        &mut self,
        ctx: &mut VaultContext<'_, L>,
        account: &Address,
        amount: u128,
    ) -> CoreResult<()> {
        non_reentrant(self, |v| &mut v.lock, |vault| {
            if amount == 0 {
                return Err(FloorLendError::InvalidAmount);
            }
            ctx.lending.accrue(ctx.now)?;
            ctx.ledger.transfer(&vault.collateral_mint, account, &vault.address, amount)?;

            let position = vault.positions.entry(*account).or_default();
            position.collateral = safe_add_u128(position.collateral, amount)?;
            vault.total_collateral = safe_add_u128(vault.total_collateral, amount)?;
            debug!(%account, amount, "collateral deposited");
            Ok(())
        })
    }

    /// Return collateral to an account with no outstanding debt
    pub fn withdraw_collateral<L: TokenLedger>(
        &mut self,
        ctx: &mut VaultContext<'_, L>,
        account: &Address,
        amount: u128,
    ) -> CoreResult<()> {
        non_reentrant(self, |v| &mut v.lock, |vault| {
            if amount == 0 {
                return Err(FloorLendError::InvalidAmount);
            }
            ctx.lending.accrue(ctx.now)?;

            let position = vault.positions.get_mut(account).ok_or(FloorLendError::EmptyPosition)?;
            if position.has_debt() {
                return Err(FloorLendError::WithdrawBlockedByDebt);
            }
            if amount > position.collateral {
                return Err(FloorLendError::InsufficientCollateral);
            }
            position.collateral -= amount;
            if position.is_empty() {
                vault.positions.remove(account);
            }
            vault.total_collateral = safe_sub_u128(vault.total_collateral, amount)?;

            ctx.ledger.transfer(&vault.collateral_mint, &vault.address, account, amount)?;
            debug!(%account, amount, "collateral withdrawn");
            Ok(())
        })
    }

    // ========================================================================
    // Debt
    // ========================================================================

    /// Borrow `amount` of the quote asset against the account's collateral
    pub fn borrow<L: TokenLedger>(
        &mut self,
        ctx: &mut VaultContext<'_, L>,
        account: &Address,
        amount: u128,
    ) -> CoreResult<BorrowOutcome> {
        non_reentrant(self, |v| &mut v.lock, |vault| vault.borrow_inner(ctx, account, amount))
    }

    fn borrow_inner<L: TokenLedger>(
        &mut self,
        ctx: &mut VaultContext<'_, L>,
        account: &Address,
        amount: u128,
    ) -> CoreResult<BorrowOutcome> {
        if amount == 0 {
            return Err(FloorLendError::InvalidAmount);
        }
        ctx.lending.accrue(ctx.now)?;

        let floor_price = self.floor_price(&*ctx.ledger, ctx.pool);
        let position = self.positions.get(account).copied().unwrap_or_default();
        let max_borrow = mul_div(position.collateral, floor_price, WAD, Rounding::Down)?;
        let debt = debt_of_position(ctx.lending, &position)?;
        let debt_after = safe_add_u128(debt, amount)?;
        if debt_after > max_borrow {
            return Err(FloorLendError::ExceedsFloorPrice);
        }
        if !ctx.lending.is_authorized(&self.address) {
            return Err(FloorLendError::UnauthorizedBorrower);
        }
        if ctx.lending.cash() < amount {
            return Err(FloorLendError::InsufficientCash);
        }

        let position = self.positions.entry(*account).or_default();
        position.principal = debt_after;
        position.index_snapshot = ctx.lending.borrow_index();
        position.marked_at = None;

        let vault_address = self.address;
        ctx.lending.borrow(ctx.ledger, &vault_address, amount, account, ctx.now)?;

        debug!(%account, amount, debt_after, floor_price, "vault borrow");
        Ok(BorrowOutcome { debt_after, floor_price })
    }

    /// Repay up to `amount` of the account's debt from `payer`. Any repayment
    /// clears the marker; repaying at least the full debt clears the debt.
    pub fn repay<L: TokenLedger>(
        &mut self,
        ctx: &mut VaultContext<'_, L>,
        payer: &Address,
        account: &Address,
        amount: u128,
    ) -> CoreResult<RepayOutcome> {
        non_reentrant(self, |v| &mut v.lock, |vault| {
            ctx.lending.accrue(ctx.now)?;

            let Some(position) = vault.positions.get(account).copied() else {
                return Ok(RepayOutcome { repaid: 0, debt_after: 0 });
            };
            let debt = debt_of_position(ctx.lending, &position)?;
            let requested = amount.min(debt);
            if requested == 0 {
                return Ok(RepayOutcome { repaid: 0, debt_after: debt });
            }
            // Aggregate borrows round down, so the pool may take less than the
            // position owes; a full repayment still clears the position
            let repaid = ctx.lending.repay(ctx.ledger, payer, requested, ctx.now)?;
            let debt_after = if amount >= debt { 0 } else { debt - repaid };

            let entry = vault.positions.entry(*account).or_default();
            if debt_after == 0 {
                entry.clear_debt();
            } else {
                entry.principal = debt_after;
                entry.index_snapshot = ctx.lending.borrow_index();
                entry.marked_at = None;
            }
            debug!(%account, %payer, repaid, debt_after, "vault repay");
            Ok(RepayOutcome { repaid, debt_after })
        })
    }

    // ========================================================================
    // Recovery
    // ========================================================================

    /// Start the grace period on an unhealthy position. Returns its debt.
    pub fn mark_otm<L: TokenLedger>(&mut self, ctx: &mut VaultContext<'_, L>, account: &Address) -> CoreResult<u128> {
        non_reentrant(self, |v| &mut v.lock, |vault| {
            ctx.lending.accrue(ctx.now)?;

            let position = vault.positions.get(account).copied().ok_or(FloorLendError::EmptyPosition)?;
            if !position.has_debt() {
                return Err(FloorLendError::EmptyPosition);
            }
            if position.is_marked() {
                return Err(FloorLendError::AlreadyMarked);
            }
            let debt = debt_of_position(ctx.lending, &position)?;
            if is_healthy(ctx.pool, position.collateral, debt) {
                return Err(FloorLendError::PositionHealthy);
            }

            if let Some(entry) = vault.positions.get_mut(account) {
                entry.marked_at = Some(ctx.now);
            }
            debug!(%account, debt, marked_at = ctx.now, "position marked");
            Ok(debt)
        })
    }

    /// Sell a marked position's collateral through the pool once its grace
    /// period has elapsed and settle its debt with the proceeds
    pub fn recover<L: TokenLedger>(
        &mut self,
        ctx: &mut VaultContext<'_, L>,
        caller: &Address,
        account: &Address,
    ) -> CoreResult<RecoveryOutcome> {
        non_reentrant(self, |v| &mut v.lock, |vault| vault.recover_inner(ctx, caller, account))
    }

    fn recover_inner<L: TokenLedger>(
        &mut self,
        ctx: &mut VaultContext<'_, L>,
        caller: &Address,
        account: &Address,
    ) -> CoreResult<RecoveryOutcome> {
        let position = self.positions.get(account).copied().ok_or(FloorLendError::EmptyPosition)?;
        let recoverable_at = position
            .recoverable_at(self.grace_period_secs)
            .ok_or(FloorLendError::NotMarked)?;
        if ctx.now < recoverable_at {
            return Err(FloorLendError::GracePeriodActive);
        }

        ctx.lending.accrue(ctx.now)?;
        let debt = debt_of_position(ctx.lending, &position)?;
        if is_healthy(ctx.pool, position.collateral, debt) {
            return Err(FloorLendError::PositionHealthy);
        }

        // Position is gone before any funds move
        self.positions.remove(account);
        self.total_collateral = safe_sub_u128(self.total_collateral, position.collateral)?;

        let collateral = position.collateral;
        let vault_address = self.address;
        let (reserve_collateral, reserve_quote) = ctx.pool.reserves();
        let fee_bps = ctx.pool.current_fee_bps(&*ctx.ledger);
        let quote_out = get_amount_out(collateral, reserve_collateral, reserve_quote, fee_bps).unwrap_or(0);

        if quote_out == 0 {
            // Nothing to sell into; the caller takes the dust and lenders the loss
            ctx.ledger.transfer(&self.collateral_mint, &vault_address, caller, collateral)?;
            let loss_absorbed = ctx.lending.absorb_loss(&vault_address, debt, ctx.now)?;
            debug!(%account, debt, loss_absorbed, "dust position written off");
            return Ok(RecoveryOutcome {
                collateral_sold: 0,
                quote_received: 0,
                debt,
                debt_repaid: 0,
                bounty: 0,
                yield_credited: 0,
                loss_absorbed,
            });
        }

        let pool_address = ctx.pool.address;
        ctx.ledger.transfer(&self.collateral_mint, &vault_address, &pool_address, collateral)?;
        ctx.pool.trade(ctx.ledger, 0, quote_out, &vault_address)?;

        let debt_repaid = ctx.lending.repay(ctx.ledger, &vault_address, quote_out.min(debt), ctx.now)?;
        let leftover = quote_out - debt_repaid;

        let bounty = if quote_out > debt {
            apply_bps(quote_out, self.recovery_bounty_bps)?.min(quote_out - debt)
        } else {
            0
        };
        let yield_credited = leftover - bounty;
        ctx.ledger.transfer(&ctx.lending.asset, &vault_address, caller, bounty)?;
        if yield_credited > 0 {
            ctx.lending.credit_yield(ctx.ledger, &vault_address, yield_credited)?;
        }

        let shortfall = debt.saturating_sub(quote_out);
        let loss_absorbed = if shortfall > 0 {
            ctx.lending.absorb_loss(&vault_address, shortfall, ctx.now)?
        } else {
            0
        };

        debug!(
            %account,
            %caller,
            collateral,
            quote_out,
            debt,
            bounty,
            yield_credited,
            loss_absorbed,
            "position recovered"
        );
        Ok(RecoveryOutcome {
            collateral_sold: collateral,
            quote_received: quote_out,
            debt,
            debt_repaid,
            bounty,
            yield_credited,
            loss_absorbed,
        })
    }
}

fn debt_of_position(lending: &LendingPool, position: &Position) -> CoreResult<u128> {
    if !position.has_debt() {
        return Ok(0);
    }
    lending.debt_with_interest(position.principal, position.index_snapshot)
}

/// `collateral × Q / T > debt`, cross-multiplied
fn is_healthy(pool: &TradingPool, collateral: u128, debt: u128) -> bool {
    if debt == 0 {
        return true;
    }
    let (reserve_collateral, reserve_quote) = pool.reserves();
    let value: U256 = widen(collateral) * widen(reserve_quote);
    value > widen(debt) * widen(reserve_collateral)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::RateModel;
    use crate::ledger::MemoryLedger;
    use crate::pool::FeeSchedule;

    struct Setup {
        ledger: MemoryLedger,
        pool: TradingPool,
        lending: LendingPool,
        vault: CollateralVault,
        borrower: Address,
        trader: Address,
    }

    macro_rules! ctx {
        ($s:expr, $now:expr) => {
            &mut VaultContext {
                ledger: &mut $s.ledger,
                pool: &mut $s.pool,
                lending: &mut $s.lending,
                now: $now,
            }
        };
    }

    /// Pool 1M/1M, 600k collateral held outside it, 1M quote to lend
    fn setup() -> Setup {
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

        let schedule = FeeSchedule {
            start_fee_bps: 100,
            end_fee_bps: 30,
            decay_target: 1_000_000,
            initial_supply: ledger.total_supply(&collateral),
        };
        let mut pool = TradingPool::new(Address::new_unique(), collateral, quote, deployer, schedule, 9_000);
        pool.add_liquidity(&mut ledger, &lp, 1_000_000, 1_000_000, &lp).unwrap();

        let vault = CollateralVault::new(Address::new_unique(), collateral, 3_600, 50);
        let mut lending = LendingPool::new(Address::new_unique(), quote, deployer, RateModel::default(), 1_000, 0);
        lending.authorize(&deployer, vault.address).unwrap();
        lending.deposit(&mut ledger, &lender, 1_000_000, 0).unwrap();

        Setup { ledger, pool, lending, vault, borrower, trader }
    }

    /// Borrower deposits everything and borrows the maximum
    fn borrowed() -> Setup {
        let mut s = setup();
        let borrower = s.borrower;
        s.vault.deposit_collateral(ctx!(s, 0), &borrower, 100_000).unwrap();
        s.vault.borrow(ctx!(s, 0), &borrower, 61_797).unwrap();
        s
    }

    /// Trader dumps 500k collateral, leaving reserves at 1.5M / 668,897
    fn crash(s: &mut Setup) {
        let (trader, collateral) = (s.trader, s.pool.collateral_mint);
        s.pool
            .swap_exact_input(&mut s.ledger, &trader, &collateral, 500_000, 1, &trader)
            .unwrap();
        assert_eq!(s.pool.reserves(), (1_500_000, 668_897));
    }

    #[test]
    fn test_floor_price_sizes_borrow() {
        let mut s = setup();
        let borrower = s.borrower;
        s.vault.deposit_collateral(ctx!(s, 0), &borrower, 100_000).unwrap();

        // Dump of 600k at 1%: 372,648 quote released, averaged and less 0.5%
        assert_eq!(s.vault.floor_price(&s.ledger, &s.pool), 617_974_600_000_000_000);
        assert_eq!(s.vault.max_borrow(&s.ledger, &s.pool, &borrower).unwrap(), 61_797);

        assert_eq!(
            s.vault.borrow(ctx!(s, 0), &borrower, 61_798),
            Err(FloorLendError::ExceedsFloorPrice)
        );
        assert!(!s.vault.position(&borrower).unwrap().has_debt());

        let outcome = s.vault.borrow(ctx!(s, 0), &borrower, 61_797).unwrap();
        assert_eq!(outcome.debt_after, 61_797);
        assert_eq!(s.ledger.balance_of(&s.lending.asset, &borrower), 161_797);
        assert_eq!(s.lending.total_borrows(), 61_797);
    }

    #[test]
    fn test_borrow_without_collateral_fails() {
        let mut s = setup();
        let trader = s.trader;
        assert_eq!(s.vault.borrow(ctx!(s, 0), &trader, 1), Err(FloorLendError::ExceedsFloorPrice));
    }

    #[test]
    fn test_withdraw_blocked_until_repaid() {
        let mut s = borrowed();
        let borrower = s.borrower;
        assert_eq!(
            s.vault.withdraw_collateral(ctx!(s, 10), &borrower, 1),
            Err(FloorLendError::WithdrawBlockedByDebt)
        );

        let outcome = s.vault.repay(ctx!(s, 10), &borrower, &borrower, u128::MAX).unwrap();
        assert_eq!(outcome.debt_after, 0);
        assert!(outcome.repaid >= 61_797);

        s.vault.withdraw_collateral(ctx!(s, 10), &borrower, 100_000).unwrap();
        assert!(s.vault.position(&borrower).is_none());
        assert_eq!(s.vault.total_collateral(), 0);
    }

    #[test]
    fn test_mark_requires_unhealthy_position() {
        let mut s = borrowed();
        let (borrower, trader) = (s.borrower, s.trader);
        assert!(s.vault.is_position_healthy(&s.pool, &s.lending, &borrower).unwrap());
        assert_eq!(s.vault.mark_otm(ctx!(s, 50), &borrower), Err(FloorLendError::PositionHealthy));
        assert_eq!(s.vault.mark_otm(ctx!(s, 50), &trader), Err(FloorLendError::EmptyPosition));

        crash(&mut s);
        assert!(!s.vault.is_position_healthy(&s.pool, &s.lending, &borrower).unwrap());
        s.vault.mark_otm(ctx!(s, 100), &borrower).unwrap();
        assert_eq!(s.vault.mark_otm(ctx!(s, 101), &borrower), Err(FloorLendError::AlreadyMarked));
    }

    #[test]
    fn test_recovery_absorbs_shortfall() {
        let mut s = borrowed();
        let (borrower, trader) = (s.borrower, s.trader);
        crash(&mut s);
        s.vault.mark_otm(ctx!(s, 100), &borrower).unwrap();

        assert_eq!(
            s.vault.recover(ctx!(s, 100 + 3_599), &trader, &borrower),
            Err(FloorLendError::GracePeriodActive)
        );

        let outcome = s.vault.recover(ctx!(s, 100 + 3_601), &trader, &borrower).unwrap();
        assert_eq!(outcome.collateral_sold, 100_000);
        assert_eq!(outcome.quote_received, 41_413);
        assert_eq!(outcome.debt_repaid, 41_413);
        assert_eq!(outcome.bounty, 0);
        assert_eq!(outcome.yield_credited, 0);
        assert!(outcome.loss_absorbed > 0);
        assert!(outcome.loss_absorbed <= outcome.debt - outcome.quote_received);

        assert!(s.vault.position(&borrower).is_none());
        assert_eq!(s.vault.total_collateral(), 0);
        assert_eq!(s.lending.total_borrows(), 0);
        assert!(s.lending.total_assets() >= s.lending.total_borrows());
        assert_eq!(s.ledger.balance_of(&s.lending.asset, &s.vault.address), 0);
    }

    #[test]
    fn test_recovery_rejected_after_rebound() {
        let mut s = borrowed();
        let (borrower, trader, quote) = (s.borrower, s.trader, s.pool.quote_mint);
        crash(&mut s);
        s.vault.mark_otm(ctx!(s, 100), &borrower).unwrap();

        // Price recovers during the grace period while the owner does nothing
        s.pool
            .swap_exact_input(&mut s.ledger, &trader, &quote, 600_000, 1, &trader)
            .unwrap();
        assert!(s.vault.is_position_healthy(&s.pool, &s.lending, &borrower).unwrap());

        let keeper = Address::new_unique();
        assert_eq!(
            s.vault.recover(ctx!(s, 100 + 3_600), &keeper, &borrower),
            Err(FloorLendError::PositionHealthy)
        );
        let position = s.vault.position(&borrower).unwrap();
        assert_eq!(position.collateral, 100_000);
        assert!(position.has_debt());
        assert_eq!(s.vault.total_collateral(), 100_000);
        assert_eq!(s.ledger.balance_of(&quote, &keeper), 0);
    }

    #[test]
    fn test_full_repay_clears_marker() {
        let mut s = borrowed();
        let borrower = s.borrower;
        crash(&mut s);
        s.vault.mark_otm(ctx!(s, 100), &borrower).unwrap();

        s.vault.repay(ctx!(s, 200), &borrower, &borrower, 1_000_000).unwrap();
        let position = s.vault.position(&borrower).unwrap();
        assert!(!position.is_marked());
        assert!(!position.has_debt());
        assert_eq!(position.collateral, 100_000);

        assert_eq!(
            s.vault.recover(ctx!(s, 10_000), &borrower, &borrower),
            Err(FloorLendError::NotMarked)
        );
    }

    #[test]
    fn test_partial_repay_clears_marker() {
        let mut s = borrowed();
        let borrower = s.borrower;
        crash(&mut s);
        s.vault.mark_otm(ctx!(s, 100), &borrower).unwrap();

        // Leaves about 1,000 owed against 100,000 collateral
        let debt = s.vault.debt_of(&s.lending, &borrower).unwrap();
        let outcome = s.vault.repay(ctx!(s, 200), &borrower, &borrower, debt - 1_000).unwrap();
        assert_eq!(outcome.repaid, debt - 1_000);
        let position = *s.vault.position(&borrower).unwrap();
        assert!(position.has_debt());
        assert!(!position.is_marked());
        assert!(s.vault.is_position_healthy(&s.pool, &s.lending, &borrower).unwrap());

        assert_eq!(
            s.vault.recover(ctx!(s, 100 + 3_600), &borrower, &borrower),
            Err(FloorLendError::NotMarked)
        );
        assert_eq!(s.vault.position(&borrower).unwrap().collateral, 100_000);
    }

    #[test]
    fn test_repay_reports_amount_pulled() {
        let mut s = borrowed();
        let borrower = s.borrower;
        let quote = s.lending.asset;

        let mut now = 0;
        for _ in 0..50 {
            now += 86_400;
            s.lending.accrue(now).unwrap();
        }
        let before = s.ledger.balance_of(&quote, &borrower);
        let outcome = s.vault.repay(ctx!(s, now), &borrower, &borrower, u128::MAX).unwrap();
        let pulled = before - s.ledger.balance_of(&quote, &borrower);

        assert_eq!(outcome.repaid, pulled);
        assert_eq!(outcome.debt_after, 0);
        assert_eq!(s.lending.total_borrows(), 0);
        assert!(!s.vault.position(&borrower).unwrap().has_debt());
    }
}
