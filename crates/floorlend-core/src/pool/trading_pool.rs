//! # Trading Pool
//!
//! Two-asset constant-product market between the collateral asset and the
//! quote asset.
//!
//! - The trade fee decays with collateral supply burned since launch (see
//!   [`FeeSchedule`]).
//! - On every liquidity change, a fixed share of the reserve growth since the
//!   last capture is minted as pool shares to the single fee collector.
//! - Pool shares can only move to the fee collector or back into the pool, so
//!   the liquidity the floor price relies on stays locked.
//!
//! There is deliberately no way to resync reserves to the pool's token
//! balances. Reserves change only through liquidity operations and trades.

use std::collections::BTreeMap;

use ethnum::U256;
use tracing::debug;

use crate::constants::{BPS_DENOMINATOR, MAX_RESERVE, MINIMUM_LIQUIDITY};
use crate::errors::{CoreResult, FloorLendError};
use crate::ledger::TokenLedger;
use crate::math::big_int::{mul_div, narrow, product, sqrt_u256, widen, Rounding};
use crate::math::safe_math::{safe_add_u128, safe_sub_u128};
use crate::oracle::spot_price;
use crate::reentrancy::{non_reentrant, ReentrancyGuard, ReentrancyStatus};
use crate::types::Address;

use super::FeeSchedule;

/// Result of adding or removing liquidity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiquidityOutcome {
    pub amount_collateral: u128,
    pub amount_quote: u128,
    pub shares: u128,
    /// Shares minted to the fee collector during this operation
    pub fee_shares: u128,
}

/// Result of a trade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeOutcome {
    pub amount_in_collateral: u128,
    pub amount_in_quote: u128,
    pub amount_out_collateral: u128,
    pub amount_out_quote: u128,
    pub fee_bps: u16,
}

#[derive(Debug, Clone)]
pub struct TradingPool {
    /// The pool's own account in the token ledger
    pub address: Address,
    pub collateral_mint: Address,
    pub quote_mint: Address,
    pub fee_schedule: FeeSchedule,
    /// Share of reserve growth captured for the fee collector (basis points)
    pub fee_capture_bps: u16,
    /// Principal allowed to register the fee collector
    factory: Address,
    fee_collector: Option<Address>,
    reserve_collateral: u128,
    reserve_quote: u128,
    /// Reserve product at the last fee capture
    k_last: U256,
    total_shares: u128,
    shares: BTreeMap<Address, u128>,
    lock: ReentrancyStatus,
}

impl TradingPool {
    pub fn new(
        address: Address,
        collateral_mint: Address,
        quote_mint: Address,
        factory: Address,
        fee_schedule: FeeSchedule,
        fee_capture_bps: u16,
    ) -> Self {
        Self {
            address,
            collateral_mint,
            quote_mint,
            fee_schedule,
            fee_capture_bps,
            factory,
            fee_collector: None,
            reserve_collateral: 0,
            reserve_quote: 0,
            k_last: U256::ZERO,
            total_shares: 0,
            shares: BTreeMap::new(),
            lock: ReentrancyStatus::Unlocked,
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// (collateral reserve, quote reserve)
    pub fn reserves(&self) -> (u128, u128) {
        (self.reserve_collateral, self.reserve_quote)
    }

    /// Spot price in WAD quote-per-collateral
    pub fn spot_price(&self) -> u128 {
        spot_price(self.reserve_collateral, self.reserve_quote)
    }

    /// Trade fee given the collateral's current total supply
    pub fn current_fee_bps<L: TokenLedger>(&self, ledger: &L) -> u16 {
        self.fee_schedule.fee_bps(ledger.total_supply(&self.collateral_mint))
    }

    pub fn fee_collector(&self) -> Option<Address> {
        self.fee_collector
    }

    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    pub fn share_balance(&self, owner: &Address) -> u128 {
        self.shares.get(owner).copied().unwrap_or(0)
    }

    pub fn k_last(&self) -> U256 {
        self.k_last
    }

    pub fn is_locked(&self) -> bool {
        self.lock == ReentrancyStatus::Locked
    }

    // ========================================================================
    // Launch
    // ========================================================================

    /// One-time registration of the fee collector by the factory
    pub fn register_fee_collector(&mut self, caller: &Address, collector: Address) -> CoreResult<()> {
        if *caller != self.factory {
            return Err(FloorLendError::UnauthorizedAdmin);
        }
        if self.fee_collector.is_some() {
            return Err(FloorLendError::AlreadyInitialized);
        }
        self.fee_collector = Some(collector);
        // Growth before registration belongs to depositors
        self.k_last = product(self.reserve_collateral, self.reserve_quote)?;
        Ok(())
    }

    // ========================================================================
    // Liquidity
    // ========================================================================

    /// Deposit both assets and mint pool shares to `to`.
    ///
    /// After the first deposit only the amounts matching the current reserve
    /// ratio are pulled; the unmatched remainder stays with the provider.
    pub fn add_liquidity<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        provider: &Address,
        amount_collateral: u128,
        amount_quote: u128,
        to: &Address,
    ) -> CoreResult<LiquidityOutcome> {
        non_reentrant(self, |p| &mut p.lock, |pool| {
            pool.add_liquidity_inner(ledger, provider, amount_collateral, amount_quote, to)
        })
    }

    fn add_liquidity_inner<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        provider: &Address,
        amount_collateral: u128,
        amount_quote: u128,
        to: &Address,
    ) -> CoreResult<LiquidityOutcome> {
        if amount_collateral == 0 || amount_quote == 0 {
            return Err(FloorLendError::InvalidAmount);
        }

        let fee_shares = self.mint_fee()?;

        let (use_collateral, use_quote, liquidity) = if self.total_shares == 0 {
            let root = narrow(sqrt_u256(product(amount_collateral, amount_quote)?))
                .ok_or(FloorLendError::MathOverflow)?;
            let liquidity = root
                .checked_sub(MINIMUM_LIQUIDITY)
                .ok_or(FloorLendError::InsufficientLiquidityMinted)?;
            self.mint_shares(Address::DEAD, MINIMUM_LIQUIDITY)?;
            (amount_collateral, amount_quote, liquidity)
        } else {
            let (rc, rq) = (self.reserve_collateral, self.reserve_quote);
            let quote_needed = mul_div(amount_collateral, rq, rc, Rounding::Up)?;
            let (c, q) = if quote_needed <= amount_quote {
                (amount_collateral, quote_needed)
            } else {
                (mul_div(amount_quote, rc, rq, Rounding::Down)?, amount_quote)
            };
            let liquidity = mul_div(c, self.total_shares, rc, Rounding::Down)?
                .min(mul_div(q, self.total_shares, rq, Rounding::Down)?);
            (c, q, liquidity)
        };

        if liquidity == 0 {
            return Err(FloorLendError::InsufficientLiquidityMinted);
        }

        self.mint_shares(*to, liquidity)?;
        self.update_reserves(
            safe_add_u128(self.reserve_collateral, use_collateral)?,
            safe_add_u128(self.reserve_quote, use_quote)?,
        )?;
        if self.fee_collector.is_some() {
            self.k_last = product(self.reserve_collateral, self.reserve_quote)?;
        }

        ledger.transfer(&self.collateral_mint, provider, &self.address, use_collateral)?;
        ledger.transfer(&self.quote_mint, provider, &self.address, use_quote)?;

        debug!(%provider, use_collateral, use_quote, liquidity, "liquidity added");
        Ok(LiquidityOutcome {
            amount_collateral: use_collateral,
            amount_quote: use_quote,
            shares: liquidity,
            fee_shares,
        })
    }

    /// Return `shares` to the pool and pay out the pro-rata reserves to `to`
    pub fn remove_liquidity<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        owner: &Address,
        shares: u128,
        to: &Address,
    ) -> CoreResult<LiquidityOutcome> {
        non_reentrant(self, |p| &mut p.lock, |pool| pool.remove_liquidity_inner(ledger, owner, shares, to))
    }

    fn remove_liquidity_inner<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        owner: &Address,
        shares: u128,
        to: &Address,
    ) -> CoreResult<LiquidityOutcome> {
        if shares == 0 {
            return Err(FloorLendError::InvalidAmount);
        }
        let pool_address = self.address;
        self.move_shares(owner, &pool_address, shares)?;

        let fee_shares = self.mint_fee()?;

        let liquidity = self.share_balance(&pool_address);
        let total = self.total_shares;
        let amount_collateral = mul_div(liquidity, self.reserve_collateral, total, Rounding::Down)?;
        let amount_quote = mul_div(liquidity, self.reserve_quote, total, Rounding::Down)?;
        if amount_collateral == 0 || amount_quote == 0 {
            return Err(FloorLendError::InsufficientLiquidityBurned);
        }

        self.burn_shares(&pool_address, liquidity)?;
        self.update_reserves(
            safe_sub_u128(self.reserve_collateral, amount_collateral)?,
            safe_sub_u128(self.reserve_quote, amount_quote)?,
        )?;
        if self.fee_collector.is_some() {
            self.k_last = product(self.reserve_collateral, self.reserve_quote)?;
        }

        ledger.transfer(&self.collateral_mint, &pool_address, to, amount_collateral)?;
        ledger.transfer(&self.quote_mint, &pool_address, to, amount_quote)?;

        debug!(%owner, amount_collateral, amount_quote, liquidity, "liquidity removed");
        Ok(LiquidityOutcome {
            amount_collateral,
            amount_quote,
            shares: liquidity,
            fee_shares,
        })
    }

    // ========================================================================
    // Trading
    // ========================================================================

    /// Send the requested outputs to `to`, charging for them with whatever
    /// inputs the caller deposited into the pool beforehand.
    pub fn trade<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        out_collateral: u128,
        out_quote: u128,
        to: &Address,
    ) -> CoreResult<TradeOutcome> {
        non_reentrant(self, |p| &mut p.lock, |pool| pool.trade_inner(ledger, out_collateral, out_quote, to))
    }

    fn trade_inner<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        out_collateral: u128,
        out_quote: u128,
        to: &Address,
    ) -> CoreResult<TradeOutcome> {
        if out_collateral == 0 && out_quote == 0 {
            return Err(FloorLendError::InsufficientOutputAmount);
        }
        let (rc, rq) = (self.reserve_collateral, self.reserve_quote);
        if out_collateral >= rc || out_quote >= rq {
            return Err(FloorLendError::InsufficientLiquidity);
        }
        if *to == self.address || *to == self.collateral_mint || *to == self.quote_mint {
            return Err(FloorLendError::InvalidRecipient);
        }

        // Balances as they will stand once the outputs have left
        let balance_collateral = ledger
            .balance_of(&self.collateral_mint, &self.address)
            .checked_sub(out_collateral)
            .ok_or(FloorLendError::InsufficientLiquidity)?;
        let balance_quote = ledger
            .balance_of(&self.quote_mint, &self.address)
            .checked_sub(out_quote)
            .ok_or(FloorLendError::InsufficientLiquidity)?;

        let in_collateral = balance_collateral.saturating_sub(rc - out_collateral);
        let in_quote = balance_quote.saturating_sub(rq - out_quote);
        if in_collateral == 0 && in_quote == 0 {
            return Err(FloorLendError::InsufficientInputAmount);
        }

        let fee_bps = self.current_fee_bps(ledger);
        let scale = widen(BPS_DENOMINATOR);
        let fee = widen(fee_bps as u128);
        let adjusted_collateral = widen(balance_collateral) * scale - widen(in_collateral) * fee;
        let adjusted_quote = widen(balance_quote) * scale - widen(in_quote) * fee;
        let lhs = adjusted_collateral
            .checked_mul(adjusted_quote)
            .ok_or(FloorLendError::MathOverflow)?;
        let rhs = product(rc, rq)?
            .checked_mul(scale * scale)
            .ok_or(FloorLendError::MathOverflow)?;
        if lhs < rhs {
            return Err(FloorLendError::InvariantViolated);
        }

        self.update_reserves(balance_collateral, balance_quote)?;

        ledger.transfer(&self.collateral_mint, &self.address, to, out_collateral)?;
        ledger.transfer(&self.quote_mint, &self.address, to, out_quote)?;

        debug!(in_collateral, in_quote, out_collateral, out_quote, fee_bps, "trade executed");
        Ok(TradeOutcome {
            amount_in_collateral: in_collateral,
            amount_in_quote: in_quote,
            amount_out_collateral: out_collateral,
            amount_out_quote: out_quote,
            fee_bps,
        })
    }

    /// Deposit `amount_in` of `mint_in` from `trader` and trade it for the
    /// other asset at the current fee, failing if the output is below `min_out`
    pub fn swap_exact_input<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        trader: &Address,
        mint_in: &Address,
        amount_in: u128,
        min_out: u128,
        to: &Address,
    ) -> CoreResult<TradeOutcome> {
        ReentrancyGuard::ensure_unlocked(&self.lock)?;
        let fee_bps = self.current_fee_bps(ledger);
        let (rc, rq) = self.reserves();
        let (out_collateral, out_quote) = if *mint_in == self.collateral_mint {
            (0, get_amount_out(amount_in, rc, rq, fee_bps)?)
        } else if *mint_in == self.quote_mint {
            (get_amount_out(amount_in, rq, rc, fee_bps)?, 0)
        } else {
            return Err(FloorLendError::UnknownToken);
        };
        if out_collateral.max(out_quote) < min_out.max(1) {
            return Err(FloorLendError::InsufficientOutputAmount);
        }
        ledger.transfer(mint_in, trader, &self.address, amount_in)?;
        self.trade(ledger, out_collateral, out_quote, to)
    }

    // ========================================================================
    // Fee Capture
    // ========================================================================

    /// Mint the fee collector's share of reserve growth since the last capture
    pub fn capture_fee(&mut self) -> CoreResult<u128> {
        non_reentrant(self, |p| &mut p.lock, |pool| {
            let minted = pool.mint_fee()?;
            if pool.fee_collector.is_some() {
                pool.k_last = product(pool.reserve_collateral, pool.reserve_quote)?;
            }
            Ok(minted)
        })
    }

    /// Shares `s` such that `s / (S + s) = φ(√k − √k_last) / √k`, where φ is
    /// the capture share. Returns the shares minted.
    fn mint_fee(&mut self) -> CoreResult<u128> {
        let Some(collector) = self.fee_collector else {
            self.k_last = U256::ZERO;
            return Ok(0);
        };
        if self.k_last == U256::ZERO || self.total_shares == 0 {
            return Ok(0);
        }

        let root_k = sqrt_u256(product(self.reserve_collateral, self.reserve_quote)?);
        let root_k_last = sqrt_u256(self.k_last);
        if root_k <= root_k_last {
            return Ok(0);
        }

        let capture = widen(self.fee_capture_bps as u128);
        let keep = widen(BPS_DENOMINATOR) - capture;
        let numerator = widen(self.total_shares)
            .checked_mul(root_k - root_k_last)
            .and_then(|n| n.checked_mul(capture))
            .ok_or(FloorLendError::MathOverflow)?;
        let denominator = root_k * keep + root_k_last * capture;
        if denominator == U256::ZERO {
            return Ok(0);
        }
        let liquidity = narrow(numerator / denominator).ok_or(FloorLendError::MathOverflow)?;
        if liquidity > 0 {
            self.mint_shares(collector, liquidity)?;
            debug!(%collector, liquidity, "fee captured");
        }
        Ok(liquidity)
    }

    // ========================================================================
    // Shares
    // ========================================================================

    /// Move shares; only the fee collector and the pool itself may receive them
    pub fn transfer_shares(&mut self, from: &Address, to: &Address, amount: u128) -> CoreResult<()> {
        non_reentrant(self, |p| &mut p.lock, |pool| pool.move_shares(from, to, amount))
    }

    fn move_shares(&mut self, from: &Address, to: &Address, amount: u128) -> CoreResult<()> {
        if *to != self.address && Some(*to) != self.fee_collector {
            return Err(FloorLendError::ShareTransferRestricted);
        }
        let from_balance = self.share_balance(from);
        if from_balance < amount {
            return Err(FloorLendError::InsufficientShares);
        }
        self.shares.insert(*from, from_balance - amount);
        let to_balance = self.shares.entry(*to).or_default();
        *to_balance = safe_add_u128(*to_balance, amount)?;
        Ok(())
    }

    fn mint_shares(&mut self, to: Address, amount: u128) -> CoreResult<()> {
        self.total_shares = safe_add_u128(self.total_shares, amount)?;
        let balance = self.shares.entry(to).or_default();
        *balance = safe_add_u128(*balance, amount)?;
        Ok(())
    }

    fn burn_shares(&mut self, from: &Address, amount: u128) -> CoreResult<()> {
        let balance = self.share_balance(from);
        if balance < amount {
            return Err(FloorLendError::InsufficientShares);
        }
        self.shares.insert(*from, balance - amount);
        self.total_shares = safe_sub_u128(self.total_shares, amount)?;
        Ok(())
    }

    fn update_reserves(&mut self, collateral: u128, quote: u128) -> CoreResult<()> {
        if collateral > MAX_RESERVE || quote > MAX_RESERVE {
            return Err(FloorLendError::ReserveOverflow);
        }
        self.reserve_collateral = collateral;
        self.reserve_quote = quote;
        debug!(collateral, quote, "reserves updated");
        Ok(())
    }
}

/// Output of selling `amount_in` into a constant-product pool at `fee_bps`
pub fn get_amount_out(amount_in: u128, reserve_in: u128, reserve_out: u128, fee_bps: u16) -> CoreResult<u128> {
    if amount_in == 0 {
        return Ok(0);
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(FloorLendError::InsufficientLiquidity);
    }
    let scale = widen(BPS_DENOMINATOR);
    let in_with_fee = widen(amount_in) * (scale - widen(fee_bps.min(10_000) as u128));
    let numerator = in_with_fee
        .checked_mul(widen(reserve_out))
        .ok_or(FloorLendError::MathOverflow)?;
    let denominator = widen(reserve_in) * scale + in_with_fee;
    narrow(numerator / denominator).ok_or(FloorLendError::MathOverflow)
}
