use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// In-process registry of accounts with a sync in flight.
///
/// Two overlapping runs for one account would both walk the whole feed and
/// race on every upsert. The second caller is turned away instead.
#[derive(Debug, Clone, Default)]
pub struct SyncLocks {
    running: Arc<Mutex<HashSet<String>>>,
}

impl SyncLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `account_id`, or `None` if a run already holds it.
    ///
    /// The claim is released when the returned permit is dropped.
    #[must_use]
    pub fn try_acquire(&self, account_id: &str) -> Option<SyncPermit> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if !running.insert(account_id.to_string()) {
            return None;
        }
        Some(SyncPermit {
            running: Arc::clone(&self.running),
            account_id: account_id.to_string(),
        })
    }

    #[must_use]
    pub fn is_running(&self, account_id: &str) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(account_id)
    }
}

/// Proof that the holder is the only sync running for an account.
#[derive(Debug)]
pub struct SyncPermit {
    running: Arc<Mutex<HashSet<String>>>,
    account_id: String,
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.account_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let locks = SyncLocks::new();
        let permit = locks.try_acquire("acct");
        assert!(permit.is_some());
        assert!(locks.try_acquire("acct").is_none());
        assert!(locks.is_running("acct"));
    }

    #[test]
    fn test_drop_releases() {
        let locks = SyncLocks::new();
        {
            let _permit = locks.try_acquire("acct").unwrap();
        }
        assert!(!locks.is_running("acct"));
        assert!(locks.try_acquire("acct").is_some());
    }

    #[test]
    fn test_accounts_are_independent() {
        let locks = SyncLocks::new();
        let _a = locks.try_acquire("a").unwrap();
        assert!(locks.try_acquire("b").is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let locks = SyncLocks::new();
        let other = locks.clone();
        let _permit = locks.try_acquire("acct").unwrap();
        assert!(other.try_acquire("acct").is_none());
    }
}
