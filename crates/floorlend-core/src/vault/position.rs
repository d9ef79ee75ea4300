//! Per-account borrow position.

use serde::Serialize;

/// Collateral and debt of one account.
///
/// Debt is stored as `principal` together with the lending pool's borrow
/// index at the time it was last written; current debt is
/// `principal * index / index_snapshot`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    pub collateral: u128,
    pub principal: u128,
    pub index_snapshot: u128,
    /// Time the position was marked out-of-the-money, if it is
    pub marked_at: Option<i64>,
}

impl Position {
    pub fn is_empty(&self) -> bool {
        self.collateral == 0 && self.principal == 0
    }

    pub fn has_debt(&self) -> bool {
        self.principal > 0
    }

    pub fn is_marked(&self) -> bool {
        self.marked_at.is_some()
    }

    /// First instant at which a marked position may be recovered
    pub fn recoverable_at(&self, grace_period_secs: i64) -> Option<i64> {
        self.marked_at.map(|t| t.saturating_add(grace_period_secs))
    }

    pub(crate) fn clear_debt(&mut self) {
        self.principal = 0;
        self.index_snapshot = 0;
        self.marked_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_debt_keeps_collateral() {
        let mut position = Position {
            collateral: 10,
            principal: 5,
            index_snapshot: 7,
            marked_at: Some(100),
        };
        assert_eq!(position.recoverable_at(3_600), Some(3_700));

        position.clear_debt();
        assert!(!position.has_debt());
        assert!(!position.is_marked());
        assert!(!position.is_empty());
        assert_eq!(position.collateral, 10);
    }
}
