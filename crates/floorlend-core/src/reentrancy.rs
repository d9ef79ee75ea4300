//! Reentrancy protection for every component that both mutates shared state
//! and moves tokens. Each component carries its own status; an entry point
//! acquires it on entry and releases it on every exit path, so a nested call
//! into any entry point of the same component is rejected.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{CoreResult, FloorLendError};

// ============================================================================
// Reentrancy Status Types
// ============================================================================

/// Reentrancy guard status flags
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReentrancyStatus {
    /// Component is unlocked and ready for operations
    #[default]
    Unlocked = 0,
    /// Component is locked due to ongoing operation
    Locked = 1,
}

impl TryFrom<u8> for ReentrancyStatus {
    type Error = FloorLendError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ReentrancyStatus::Unlocked),
            1 => Ok(ReentrancyStatus::Locked),
            _ => Err(FloorLendError::InvalidParameter("reentrancy status")),
        }
    }
}

// ============================================================================
// Reentrancy Guard Manager
// ============================================================================

/// Reentrancy guard manager
pub struct ReentrancyGuard;

impl ReentrancyGuard {
    /// Acquire lock for an entry point
    pub fn acquire(status: &mut ReentrancyStatus) -> CoreResult<()> {
        match *status {
            ReentrancyStatus::Unlocked => {
                *status = ReentrancyStatus::Locked;
                Ok(())
            }
            ReentrancyStatus::Locked => Err(FloorLendError::ReentrancyDetected),
        }
    }

    /// Release lock after the entry point completes
    pub fn release(status: &mut ReentrancyStatus) {
        if *status == ReentrancyStatus::Unlocked {
            warn!("releasing an already unlocked component");
        }
        *status = ReentrancyStatus::Unlocked;
    }

    pub fn is_locked(status: &ReentrancyStatus) -> bool {
        *status != ReentrancyStatus::Unlocked
    }

    /// Ensure component is not locked (for read operations)
    pub fn ensure_unlocked(status: &ReentrancyStatus) -> CoreResult<()> {
        if Self::is_locked(status) {
            return Err(FloorLendError::ReentrancyDetected);
        }
        Ok(())
    }
}

/// Run `f` with the lock held, releasing it whether `f` succeeds or fails
pub fn non_reentrant<S, T>(
    state: &mut S,
    lock: fn(&mut S) -> &mut ReentrancyStatus,
    f: impl FnOnce(&mut S) -> CoreResult<T>,
) -> CoreResult<T> {
    ReentrancyGuard::acquire(lock(state))?;
    let result = f(state);
    ReentrancyGuard::release(lock(state));
    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentrancy_guard_lifecycle() {
        let mut status = ReentrancyStatus::Unlocked;

        assert!(ReentrancyGuard::acquire(&mut status).is_ok());
        assert_eq!(status, ReentrancyStatus::Locked);

        assert_eq!(
            ReentrancyGuard::acquire(&mut status),
            Err(FloorLendError::ReentrancyDetected)
        );
        assert!(ReentrancyGuard::ensure_unlocked(&status).is_err());

        ReentrancyGuard::release(&mut status);
        assert_eq!(status, ReentrancyStatus::Unlocked);
    }

    struct Counter {
        lock: ReentrancyStatus,
        value: u32,
    }

    #[test]
    fn test_non_reentrant_releases_on_error() {
        let mut counter = Counter { lock: ReentrancyStatus::Unlocked, value: 0 };

        let result: CoreResult<()> = non_reentrant(&mut counter, |c| &mut c.lock, |c| {
            c.value += 1;
            Err(FloorLendError::InvalidAmount)
        });
        assert_eq!(result, Err(FloorLendError::InvalidAmount));
        assert_eq!(counter.lock, ReentrancyStatus::Unlocked);

        // Nested entry is rejected
        let nested = non_reentrant(&mut counter, |c| &mut c.lock, |c| {
            non_reentrant(c, |c| &mut c.lock, |_| Ok(()))
        });
        assert_eq!(nested, Err(FloorLendError::ReentrancyDetected));
        assert_eq!(counter.lock, ReentrancyStatus::Unlocked);
    }

    #[test]
    fn test_status_from_u8() {
        assert_eq!(ReentrancyStatus::try_from(1).unwrap(), ReentrancyStatus::Locked);
        assert!(ReentrancyStatus::try_from(7).is_err());
    }
}
