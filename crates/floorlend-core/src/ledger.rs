//! # Token Ledger
//!
//! The fungible-token interface every component consumes. Transfers return a
//! result instead of running recipient code inline, so no callback can observe
//! a half-updated component.

use std::collections::BTreeMap;

use crate::errors::{CoreResult, FloorLendError};
use crate::types::Address;

/// Move, burn and balance-query semantics for non-rebasing, non-fee-on-transfer tokens
pub trait TokenLedger {
    fn balance_of(&self, mint: &Address, owner: &Address) -> u128;

    fn total_supply(&self, mint: &Address) -> u128;

    /// Move `amount` from `from` to `to`. A zero amount is a no-op.
    fn transfer(&mut self, mint: &Address, from: &Address, to: &Address, amount: u128) -> CoreResult<()>;

    /// Destroy `amount` of the holder's own balance, reducing total supply
    fn burn(&mut self, mint: &Address, holder: &Address, amount: u128) -> CoreResult<()>;
}

/// Balances and supply of a single mint
#[derive(Debug, Clone, Default)]
pub struct TokenAccounts {
    pub supply: u128,
    pub balances: BTreeMap<Address, u128>,
}

/// In-memory ledger of every mint in a market
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    tokens: BTreeMap<Address, TokenAccounts>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new mint with zero supply
    pub fn create_token(&mut self) -> Address {
        let mint = Address::new_unique();
        self.tokens.insert(mint, TokenAccounts::default());
        mint
    }

    /// Mint new units to `to`
    pub fn mint(&mut self, mint: &Address, to: &Address, amount: u128) -> CoreResult<()> {
        let token = self.tokens.get_mut(mint).ok_or(FloorLendError::UnknownToken)?;
        token.supply = token.supply.checked_add(amount).ok_or(FloorLendError::MathOverflow)?;
        let balance = token.balances.entry(*to).or_default();
        *balance = balance.checked_add(amount).ok_or(FloorLendError::MathOverflow)?;
        Ok(())
    }

    fn token_mut(&mut self, mint: &Address) -> CoreResult<&mut TokenAccounts> {
        self.tokens.get_mut(mint).ok_or(FloorLendError::UnknownToken)
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, mint: &Address, owner: &Address) -> u128 {
        self.tokens
            .get(mint)
            .and_then(|t| t.balances.get(owner).copied())
            .unwrap_or(0)
    }

    fn total_supply(&self, mint: &Address) -> u128 {
        self.tokens.get(mint).map(|t| t.supply).unwrap_or(0)
    }

    fn transfer(&mut self, mint: &Address, from: &Address, to: &Address, amount: u128) -> CoreResult<()> {
        let token = self.token_mut(mint)?;
        if amount == 0 {
            return Ok(());
        }
        let from_balance = token.balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(FloorLendError::InsufficientBalance);
        }
        token.balances.insert(*from, from_balance - amount);
        let to_balance = token.balances.entry(*to).or_default();
        *to_balance = to_balance.checked_add(amount).ok_or(FloorLendError::MathOverflow)?;
        Ok(())
    }

    fn burn(&mut self, mint: &Address, holder: &Address, amount: u128) -> CoreResult<()> {
        let token = self.token_mut(mint)?;
        let balance = token.balances.get(holder).copied().unwrap_or(0);
        if balance < amount {
            return Err(FloorLendError::InsufficientBalance);
        }
        token.balances.insert(*holder, balance - amount);
        token.supply -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_transfer_burn() {
        let mut ledger = MemoryLedger::new();
        let mint = ledger.create_token();
        let alice = Address::new_unique();
        let bob = Address::new_unique();

        ledger.mint(&mint, &alice, 1_000).unwrap();
        ledger.transfer(&mint, &alice, &bob, 400).unwrap();
        assert_eq!(ledger.balance_of(&mint, &alice), 600);
        assert_eq!(ledger.balance_of(&mint, &bob), 400);

        ledger.burn(&mint, &bob, 100).unwrap();
        assert_eq!(ledger.total_supply(&mint), 900);
    }

    #[test]
    fn test_transfer_rejects_overdraft() {
        let mut ledger = MemoryLedger::new();
        let mint = ledger.create_token();
        let alice = Address::new_unique();
        ledger.mint(&mint, &alice, 10).unwrap();

        let result = ledger.transfer(&mint, &alice, &Address::new_unique(), 11);
        assert_eq!(result, Err(FloorLendError::InsufficientBalance));
        assert_eq!(ledger.balance_of(&mint, &alice), 10);
    }

    #[test]
    fn test_unknown_mint() {
        let mut ledger = MemoryLedger::new();
        let result = ledger.transfer(&Address::new_unique(), &Address::DEAD, &Address::DEAD, 1);
        assert_eq!(result, Err(FloorLendError::UnknownToken));
    }
}
