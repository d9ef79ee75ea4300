use floorlend_core::{Address, FloorLendError, Market, TokenLedger};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::KeeperConfig;
use crate::error::KeeperResult;

/// A position the sweep could not act on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub account: Address,
    pub code: u32,
    pub message: String,
}

/// What a single sweep did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Borrowing positions examined
    pub scanned: usize,
    pub marked: Vec<Address>,
    pub recovered: Vec<Address>,
    /// Marked positions still inside their grace period
    pub waiting: Vec<Address>,
    /// Marked positions that are healthy again and cannot be recovered
    pub rebounded: Vec<Address>,
    /// Marked positions left for the next sweep by the per-sweep cap
    pub deferred: usize,
    pub skipped_dust: usize,
    pub bounty_earned: u128,
    pub loss_absorbed: u128,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn to_json(&self) -> KeeperResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Marks unhealthy positions and recovers them once their grace period ends.
///
/// The keeper holds no privilege: it calls the same permissionless entry
/// points as anyone else and is paid through the recovery bounty.
pub struct Keeper {
    config: KeeperConfig,
}

impl Keeper {
    pub fn new(config: KeeperConfig) -> KeeperResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    /// One pass over every borrowing position in `market` at time `now`
    pub fn sweep<L: TokenLedger + Clone>(&self, market: &mut Market<L>, now: i64) -> SweepReport {
        let caller = self.config.caller;
        let mut report = SweepReport::default();

        let candidates: Vec<_> = market
            .vault()
            .borrowers()
            .map(|(account, position)| (*account, *position))
            .collect();

        for (account, position) in candidates {
            report.scanned += 1;
            if position.collateral < self.config.min_collateral {
                report.skipped_dust += 1;
                continue;
            }

            if !position.is_marked() {
                if !self.config.mark_unhealthy {
                    continue;
                }
                match market.is_position_healthy(&account) {
                    Ok(true) => continue,
                    Ok(false) => {}
                    Err(err) => {
                        record_failure(&mut report, account, err);
                        continue;
                    }
                }
                match market.mark_otm(&caller, &account, now) {
                    Ok(debt) => {
                        info!(%account, debt, "marked unhealthy position");
                        report.marked.push(account);
                    }
                    Err(err) => record_failure(&mut report, account, err),
                }
                continue;
            }

            if report.recovered.len() >= self.config.max_recoveries_per_sweep {
                report.deferred += 1;
                continue;
            }

            match market.recover(&caller, &account, now) {
                Ok(outcome) => {
                    info!(
                        %account,
                        bounty = outcome.bounty,
                        loss = outcome.loss_absorbed,
                        "recovered position"
                    );
                    report.bounty_earned += outcome.bounty;
                    report.loss_absorbed += outcome.loss_absorbed;
                    report.recovered.push(account);
                }
                Err(err) if err.is_retryable() => {
                    debug!(%account, %err, "recovery not yet possible");
                    report.waiting.push(account);
                }
                Err(FloorLendError::PositionHealthy) => {
                    debug!(%account, "marked position has recovered");
                    report.rebounded.push(account);
                }
                Err(err) => record_failure(&mut report, account, err),
            }
        }

        info!(
            scanned = report.scanned,
            marked = report.marked.len(),
            recovered = report.recovered.len(),
            waiting = report.waiting.len(),
            failures = report.failures.len(),
            "sweep complete"
        );
        report
    }
}

fn record_failure(report: &mut SweepReport, account: Address, err: FloorLendError) {
    warn!(%account, code = err.code(), %err, "keeper action failed");
    report.failures.push(SweepFailure {
        account,
        code: err.code(),
        message: err.to_string(),
    });
}
