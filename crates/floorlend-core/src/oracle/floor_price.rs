//! # Floor Price
//!
//! The floor price (pMin) is the worst-case *average* execution price if every
//! unit of collateral held outside the pool were sold into it at once, less
//! the recovery bounty. It is derived only from the pool's own reserves and
//! the collateral's circulating supply; no external oracle is consulted.
//!
//! The average is taken over the nominal amount dumped, not the post-fee
//! amount: the trade fee is value lost by the seller, not a change in the
//! price basis. For a dump that is small relative to the collateral reserve
//! the rounded average can sit above spot. That only raises the borrow limit
//! marginally and never lets a position borrow against value the pool cannot
//! release.
//!
//! The function never fails. Any degenerate input returns zero, which callers
//! treat as "cannot lend against this".

use ethnum::U256;
use tracing::warn;

use crate::constants::{BPS_DENOMINATOR, MIN_POST_DUMP_RESERVE, RECOVERY_BOUNTY_BPS, WAD};
use crate::math::big_int::{narrow, widen};

/// Inputs to the floor price calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorInputs {
    /// Collateral reserve `T`
    pub reserve_collateral: u128,
    /// Quote reserve `Q`
    pub reserve_quote: u128,
    /// Circulating collateral supply `S`, pool reserve included
    pub circulating_supply: u128,
    /// Current trade fee in basis points
    pub fee_bps: u16,
}

/// Floor price in WAD quote-per-collateral, discounted by the default recovery bounty
pub fn floor_price(inputs: FloorInputs) -> u128 {
    floor_price_with_bounty(inputs, RECOVERY_BOUNTY_BPS)
}

/// Floor price with an explicit bounty discount
pub fn floor_price_with_bounty(inputs: FloorInputs, bounty_bps: u16) -> u128 {
    match compute(inputs, bounty_bps) {
        Some(price) => price,
        None => {
            warn!(?inputs, "floor price failed safe to zero");
            0
        }
    }
}

/// Spot price `Q / T` in WAD, zero for an empty pool
pub fn spot_price(reserve_collateral: u128, reserve_quote: u128) -> u128 {
    if reserve_collateral == 0 {
        return 0;
    }
    narrow(widen(reserve_quote) * widen(WAD) / widen(reserve_collateral)).unwrap_or(0)
}

fn compute(inputs: FloorInputs, bounty_bps: u16) -> Option<u128> {
    let FloorInputs {
        reserve_collateral: t,
        reserve_quote: q,
        circulating_supply: s,
        fee_bps,
    } = inputs;

    if s == 0 || t == 0 || q == 0 {
        return None;
    }
    if fee_bps as u128 >= BPS_DENOMINATOR || bounty_bps as u128 > BPS_DENOMINATOR {
        return None;
    }
    let keep = widen(BPS_DENOMINATOR - bounty_bps as u128);
    let denom = widen(BPS_DENOMINATOR);

    // Nothing held outside the pool: discounted spot
    if s <= t {
        let spot = widen(q).checked_mul(widen(WAD))? / widen(t);
        return narrow(spot.checked_mul(keep)? / denom);
    }

    let dumped = widen(s - t);
    let effective = dumped * widen(BPS_DENOMINATOR - fee_bps as u128) / denom;
    let t_after = widen(t).checked_add(effective)?;
    if t_after < widen(MIN_POST_DUMP_RESERVE) {
        return None;
    }

    let k = widen(t).checked_mul(widen(q))?;
    let q_after = k / t_after;
    let q = widen(q);
    if q_after >= q {
        return None;
    }

    let released = q - q_after;
    let average: U256 = released.checked_mul(widen(WAD))? / dumped;
    narrow(average.checked_mul(keep)? / denom)
}
