//! # Market
//!
//! Binds a token ledger, trading pool, lending pool and collateral vault into
//! one execution context. Every entry point runs through [`Market::atomic`]:
//! if it fails, the whole market (ledger included) is restored to the state
//! it had before the call.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::MarketConfig;
use crate::errors::{CoreResult, FloorLendError};
use crate::lending::{LendingPool, RateModel};
use crate::ledger::TokenLedger;
use crate::pool::{FeeSchedule, LiquidityOutcome, TradeOutcome, TradingPool};
use crate::types::{Address, MarketEvent};
use crate::vault::{BorrowOutcome, CollateralVault, Position, RecoveryOutcome, RepayOutcome, VaultContext};

/// Read-only snapshot for indexers and front ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketView {
    pub collateral_mint: Address,
    pub quote_mint: Address,
    pub collateral_supply: u128,
    pub reserve_collateral: u128,
    pub reserve_quote: u128,
    pub fee_bps: u16,
    pub spot_price: u128,
    pub floor_price: u128,
    pub total_shares: u128,
    pub fee_collector: Option<Address>,
    pub cash: u128,
    pub total_borrows: u128,
    pub lending_reserves: u128,
    pub borrow_index: u128,
    pub utilization: u128,
    pub borrow_rate: u128,
    pub total_collateral: u128,
    pub borrowers: usize,
}

impl MarketView {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone)]
pub struct Market<L> {
    pub config: MarketConfig,
    deployer: Address,
    ledger: L,
    pool: TradingPool,
    lending: LendingPool,
    vault: CollateralVault,
    events: Vec<MarketEvent>,
}

impl<L: TokenLedger + Clone> Market<L> {
    /// Create the pool, lending pool and vault for a collateral/quote pair.
    ///
    /// The fee schedule captures the collateral's total supply at this point,
    /// and the deployer becomes lending admin with the vault authorized.
    pub fn launch(
        config: MarketConfig,
        ledger: L,
        deployer: Address,
        collateral_mint: Address,
        quote_mint: Address,
        now: i64,
    ) -> CoreResult<Self> {
        if let Err(err) = config.validate() {
            warn!(%err, "rejected market config");
            return Err(FloorLendError::InvalidParameter("market config"));
        }
        if collateral_mint == quote_mint {
            return Err(FloorLendError::InvalidParameter("collateral and quote mints must differ"));
        }

        let fee_schedule = FeeSchedule {
            start_fee_bps: config.start_fee_bps,
            end_fee_bps: config.end_fee_bps,
            decay_target: config.decay_target,
            initial_supply: ledger.total_supply(&collateral_mint),
        };
        let pool = TradingPool::new(
            Address::new_unique(),
            collateral_mint,
            quote_mint,
            deployer,
            fee_schedule,
            config.fee_capture_bps,
        );
        let vault = CollateralVault::new(
            Address::new_unique(),
            collateral_mint,
            config.grace_period_secs,
            config.recovery_bounty_bps,
        );
        let mut lending = LendingPool::new(
            Address::new_unique(),
            quote_mint,
            deployer,
            RateModel::from_config(&config),
            config.reserve_factor_bps,
            now,
        );
        lending.authorize(&deployer, vault.address)?;

        info!(
            pool = %pool.address,
            lending = %lending.address,
            vault = %vault.address,
            initial_supply = fee_schedule.initial_supply,
            "market launched"
        );
        Ok(Self {
            config,
            deployer,
            ledger,
            pool,
            lending,
            vault,
            events: Vec::new(),
        })
    }

    /// Run `f` against the market, restoring every component if it fails
    pub fn atomic<T>(&mut self, f: impl FnOnce(&mut Self) -> CoreResult<T>) -> CoreResult<T> {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    fn split(&mut self, now: i64) -> (&mut CollateralVault, VaultContext<'_, L>) {
        (
            &mut self.vault,
            VaultContext {
                ledger: &mut self.ledger,
                pool: &mut self.pool,
                lending: &mut self.lending,
                now,
            },
        )
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn deployer(&self) -> Address {
        self.deployer
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct token access for deposits ahead of a [`Market::trade`]
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn pool(&self) -> &TradingPool {
        &self.pool
    }

    pub fn lending(&self) -> &LendingPool {
        &self.lending
    }

    pub fn vault(&self) -> &CollateralVault {
        &self.vault
    }

    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    /// Take every event logged since the last drain
    pub fn drain_events(&mut self) -> Vec<MarketEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn floor_price(&self) -> u128 {
        self.vault.floor_price(&self.ledger, &self.pool)
    }

    pub fn spot_price(&self) -> u128 {
        self.pool.spot_price()
    }

    pub fn current_fee_bps(&self) -> u16 {
        self.pool.current_fee_bps(&self.ledger)
    }

    pub fn position(&self, account: &Address) -> Option<&Position> {
        self.vault.position(account)
    }

    pub fn debt_of(&self, account: &Address) -> CoreResult<u128> {
        self.vault.debt_of(&self.lending, account)
    }

    pub fn max_borrow(&self, account: &Address) -> CoreResult<u128> {
        self.vault.max_borrow(&self.ledger, &self.pool, account)
    }

    pub fn is_position_healthy(&self, account: &Address) -> CoreResult<bool> {
        self.vault.is_position_healthy(&self.pool, &self.lending, account)
    }

    pub fn view(&self) -> MarketView {
        let (reserve_collateral, reserve_quote) = self.pool.reserves();
        MarketView {
            collateral_mint: self.pool.collateral_mint,
            quote_mint: self.pool.quote_mint,
            collateral_supply: self.ledger.total_supply(&self.pool.collateral_mint),
            reserve_collateral,
            reserve_quote,
            fee_bps: self.current_fee_bps(),
            spot_price: self.spot_price(),
            floor_price: self.floor_price(),
            total_shares: self.pool.total_shares(),
            fee_collector: self.pool.fee_collector(),
            cash: self.lending.cash(),
            total_borrows: self.lending.total_borrows(),
            lending_reserves: self.lending.reserves(),
            borrow_index: self.lending.borrow_index(),
            utilization: self.lending.utilization(),
            borrow_rate: self.lending.current_rate(),
            total_collateral: self.vault.total_collateral(),
            borrowers: self.vault.borrowers().count(),
        }
    }

    // ========================================================================
    // Administration
    // ========================================================================

    pub fn register_fee_collector(&mut self, caller: &Address, collector: Address) -> CoreResult<()> {
        self.atomic(|m| m.pool.register_fee_collector(caller, collector))
    }

    pub fn authorize(&mut self, caller: &Address, component: Address) -> CoreResult<()> {
        self.atomic(|m| m.lending.authorize(caller, component))
    }

    pub fn revoke(&mut self, caller: &Address, component: &Address) -> CoreResult<()> {
        self.atomic(|m| m.lending.revoke(caller, component))
    }

    pub fn withdraw_reserves(&mut self, caller: &Address, amount: u128, to: &Address, now: i64) -> CoreResult<()> {
        self.atomic(|m| m.lending.withdraw_reserves(&mut m.ledger, caller, amount, to, now))
    }

    pub fn accrue(&mut self, now: i64) -> CoreResult<()> {
        self.atomic(|m| m.lending.accrue(now))
    }

    // ========================================================================
    // Trading Pool
    // ========================================================================

    pub fn add_liquidity(
        &mut self,
        provider: &Address,
        amount_collateral: u128,
        amount_quote: u128,
        to: &Address,
        now: i64,
    ) -> CoreResult<LiquidityOutcome> {
        self.atomic(|m| {
            let outcome = m
                .pool
                .add_liquidity(&mut m.ledger, provider, amount_collateral, amount_quote, to)?;
            m.log_fee_capture(outcome.fee_shares, now);
            m.events.push(MarketEvent::LiquidityAdded {
                provider: *provider,
                to: *to,
                amount_collateral: outcome.amount_collateral,
                amount_quote: outcome.amount_quote,
                shares: outcome.shares,
                timestamp: now,
            });
            Ok(outcome)
        })
    }

    pub fn remove_liquidity(&mut self, owner: &Address, shares: u128, to: &Address, now: i64) -> CoreResult<LiquidityOutcome> {
        self.atomic(|m| {
            let outcome = m.pool.remove_liquidity(&mut m.ledger, owner, shares, to)?;
            m.log_fee_capture(outcome.fee_shares, now);
            m.events.push(MarketEvent::LiquidityRemoved {
                owner: *owner,
                to: *to,
                amount_collateral: outcome.amount_collateral,
                amount_quote: outcome.amount_quote,
                shares: outcome.shares,
                timestamp: now,
            });
            Ok(outcome)
        })
    }

    /// Low-level trade against inputs already sent to the pool
    pub fn trade(&mut self, out_collateral: u128, out_quote: u128, to: &Address, now: i64) -> CoreResult<TradeOutcome> {
        self.atomic(|m| {
            let outcome = m.pool.trade(&mut m.ledger, out_collateral, out_quote, to)?;
            m.log_trade(to, &outcome, now);
            Ok(outcome)
        })
    }

    pub fn swap_exact_input(
        &mut self,
        trader: &Address,
        mint_in: &Address,
        amount_in: u128,
        min_out: u128,
        now: i64,
    ) -> CoreResult<TradeOutcome> {
        self.atomic(|m| {
            let outcome = m
                .pool
                .swap_exact_input(&mut m.ledger, trader, mint_in, amount_in, min_out, trader)?;
            m.log_trade(trader, &outcome, now);
            Ok(outcome)
        })
    }

    pub fn capture_fee(&mut self, now: i64) -> CoreResult<u128> {
        self.atomic(|m| {
            let minted = m.pool.capture_fee()?;
            m.log_fee_capture(minted, now);
            Ok(minted)
        })
    }

    pub fn transfer_shares(&mut self, from: &Address, to: &Address, amount: u128) -> CoreResult<()> {
        self.atomic(|m| m.pool.transfer_shares(from, to, amount))
    }

    /// Destroy the holder's own collateral, lowering total supply
    pub fn burn_collateral(&mut self, holder: &Address, amount: u128) -> CoreResult<()> {
        self.atomic(|m| {
            let mint = m.pool.collateral_mint;
            m.ledger.burn(&mint, holder, amount)?;
            info!(%holder, amount, fee_bps = m.current_fee_bps(), "collateral burned");
            Ok(())
        })
    }

    // ========================================================================
    // Lenders
    // ========================================================================

    pub fn deposit(&mut self, lender: &Address, assets: u128, now: i64) -> CoreResult<u128> {
        self.atomic(|m| {
            let shares = m.lending.deposit(&mut m.ledger, lender, assets, now)?;
            m.events.push(MarketEvent::LenderDeposited {
                lender: *lender,
                assets,
                shares,
                timestamp: now,
            });
            Ok(shares)
        })
    }

    pub fn redeem(&mut self, lender: &Address, shares: u128, now: i64) -> CoreResult<u128> {
        self.atomic(|m| {
            let assets = m.lending.redeem(&mut m.ledger, lender, shares, now)?;
            m.events.push(MarketEvent::LenderRedeemed {
                lender: *lender,
                assets,
                shares,
                timestamp: now,
            });
            Ok(assets)
        })
    }

    // ========================================================================
    // Borrowers
    // ========================================================================

    pub fn deposit_collateral(&mut self, account: &Address, amount: u128, now: i64) -> CoreResult<()> {
        self.atomic(|m| {
            let (vault, mut ctx) = m.split(now);
            vault.deposit_collateral(&mut ctx, account, amount)?;
            m.events.push(MarketEvent::CollateralDeposited {
                account: *account,
                amount,
                timestamp: now,
            });
            Ok(())
        })
    }

    pub fn withdraw_collateral(&mut self, account: &Address, amount: u128, now: i64) -> CoreResult<()> {
        self.atomic(|m| {
            let (vault, mut ctx) = m.split(now);
            vault.withdraw_collateral(&mut ctx, account, amount)?;
            m.events.push(MarketEvent::CollateralWithdrawn {
                account: *account,
                amount,
                timestamp: now,
            });
            Ok(())
        })
    }

    pub fn borrow(&mut self, account: &Address, amount: u128, now: i64) -> CoreResult<BorrowOutcome> {
        self.atomic(|m| {
            let (vault, mut ctx) = m.split(now);
            let outcome = vault.borrow(&mut ctx, account, amount)?;
            info!(%account, amount, debt = outcome.debt_after, floor_price = outcome.floor_price, "borrowed");
            m.events.push(MarketEvent::Borrowed {
                account: *account,
                amount,
                debt_after: outcome.debt_after,
                floor_price: outcome.floor_price,
                timestamp: now,
            });
            Ok(outcome)
        })
    }

    pub fn repay(&mut self, payer: &Address, account: &Address, amount: u128, now: i64) -> CoreResult<RepayOutcome> {
        self.atomic(|m| {
            let (vault, mut ctx) = m.split(now);
            let outcome = vault.repay(&mut ctx, payer, account, amount)?;
            info!(%account, %payer, repaid = outcome.repaid, debt = outcome.debt_after, "repaid");
            m.events.push(MarketEvent::Repaid {
                account: *account,
                payer: *payer,
                amount: outcome.repaid,
                debt_after: outcome.debt_after,
                timestamp: now,
            });
            Ok(outcome)
        })
    }

    pub fn mark_otm(&mut self, caller: &Address, account: &Address, now: i64) -> CoreResult<u128> {
        self.atomic(|m| {
            let (vault, mut ctx) = m.split(now);
            let debt = vault.mark_otm(&mut ctx, account)?;
            info!(%account, %caller, debt, "position marked out of the money");
            m.events.push(MarketEvent::MarkedOtm {
                account: *account,
                caller: *caller,
                debt,
                timestamp: now,
            });
            Ok(debt)
        })
    }

    pub fn recover(&mut self, caller: &Address, account: &Address, now: i64) -> CoreResult<RecoveryOutcome> {
        self.atomic(|m| {
            let (vault, mut ctx) = m.split(now);
            let outcome = vault.recover(&mut ctx, caller, account)?;
            info!(
                %account,
                %caller,
                sold = outcome.collateral_sold,
                received = outcome.quote_received,
                bounty = outcome.bounty,
                "position recovered"
            );
            m.events.push(MarketEvent::Recovered {
                account: *account,
                caller: *caller,
                collateral_sold: outcome.collateral_sold,
                quote_received: outcome.quote_received,
                debt_repaid: outcome.debt_repaid,
                bounty: outcome.bounty,
                yield_credited: outcome.yield_credited,
                loss_absorbed: outcome.loss_absorbed,
                timestamp: now,
            });
            if outcome.loss_absorbed > 0 {
                warn!(%account, loss = outcome.loss_absorbed, "recovery absorbed a loss");
                m.events.push(MarketEvent::LossAbsorbed {
                    account: *account,
                    amount: outcome.loss_absorbed,
                    timestamp: now,
                });
            }
            Ok(outcome)
        })
    }

    fn log_trade(&mut self, recipient: &Address, outcome: &TradeOutcome, now: i64) {
        self.events.push(MarketEvent::Trade {
            recipient: *recipient,
            amount_in_collateral: outcome.amount_in_collateral,
            amount_in_quote: outcome.amount_in_quote,
            amount_out_collateral: outcome.amount_out_collateral,
            amount_out_quote: outcome.amount_out_quote,
            fee_bps: outcome.fee_bps,
            timestamp: now,
        });
    }

    fn log_fee_capture(&mut self, shares: u128, now: i64) {
        if shares == 0 {
            return;
        }
        if let Some(collector) = self.pool.fee_collector() {
            self.events.push(MarketEvent::FeeCaptured {
                collector,
                shares,
                timestamp: now,
            });
        }
    }
}
