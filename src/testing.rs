//! Deterministic mock collaborators for tests and documentation examples.
//!
//! The mocks are handle-based: cloning shares the underlying state, so a
//! test keeps a view of the ledger, the payment log or the clock after the
//! engine has taken ownership of its adapter.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use primitive_types::U256;

use crate::{
    config::VIRTUAL_TOKEN_DECIMALS,
    crypto::Address,
    time::{TimeProvider, TimestampSeconds},
    token::{NativeSink, PaymentError, TokenAdapter, TokenError},
};

#[derive(Debug)]
struct MemoryTokenInner {
    /// The engine's own holdings
    treasury: U256,
    accounts: HashMap<Address, U256>,
}

/// In-memory underlying-token ledger scoped to one engine instance
#[derive(Debug, Clone)]
pub struct MemoryToken {
    inner: Arc<Mutex<MemoryTokenInner>>,
    decimals: u8,
    fail_transfers: Arc<AtomicBool>,
}

impl MemoryToken {
    /// Ledger with `treasury` already credited to the engine, 18 decimals
    pub fn new(treasury: U256) -> Self {
        Self::with_decimals(treasury, VIRTUAL_TOKEN_DECIMALS)
    }

    pub fn with_decimals(treasury: U256, decimals: u8) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryTokenInner {
                treasury,
                accounts: HashMap::new(),
            })),
            decimals,
            fail_transfers: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Credit further principal to the engine's holdings
    pub fn fund(&self, amount: U256) {
        let mut inner = self.inner.lock().expect("mock ledger poisoned");
        inner.treasury = inner.treasury.saturating_add(amount);
    }

    /// The engine's current holdings
    pub fn treasury(&self) -> U256 {
        self.inner.lock().expect("mock ledger poisoned").treasury
    }

    pub fn balance_of(&self, who: &Address) -> U256 {
        self.inner
            .lock()
            .expect("mock ledger poisoned")
            .accounts
            .get(who)
            .copied()
            .unwrap_or_default()
    }

    /// Make every subsequent transfer fail, to exercise rollback paths
    pub fn set_fail_transfers(&self, fail: bool) {
        self.fail_transfers.store(fail, Ordering::SeqCst);
    }
}

impl TokenAdapter for MemoryToken {
    fn balance(&self) -> Result<U256, TokenError> {
        Ok(self.treasury())
    }

    fn transfer(&mut self, to: &Address, amount: U256) -> Result<(), TokenError> {
        if self.fail_transfers.load(Ordering::SeqCst) {
            return Err(TokenError::TransferFailed {
                reason: "forced failure".to_string(),
            });
        }
        let mut inner = self.inner.lock().expect("mock ledger poisoned");
        if inner.treasury < amount {
            return Err(TokenError::TransferFailed {
                reason: "insufficient treasury".to_string(),
            });
        }
        inner.treasury -= amount;
        let credit = inner.accounts.entry(*to).or_default();
        *credit = credit.saturating_add(amount);
        Ok(())
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }
}

/// Native-currency sink that records every payment it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    payments: Arc<Mutex<Vec<(Address, U256)>>>,
    fail_transfers: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payments(&self) -> Vec<(Address, U256)> {
        self.payments.lock().expect("payment log poisoned").clone()
    }

    /// Total native currency received by `who`
    pub fn total_to(&self, who: &Address) -> U256 {
        self.payments()
            .iter()
            .filter(|(to, _)| to == who)
            .fold(U256::zero(), |acc, (_, amount)| acc.saturating_add(*amount))
    }

    pub fn set_fail_transfers(&self, fail: bool) {
        self.fail_transfers.store(fail, Ordering::SeqCst);
    }
}

impl NativeSink for RecordingSink {
    fn transfer(&mut self, to: &Address, amount: U256) -> Result<(), PaymentError> {
        if self.fail_transfers.load(Ordering::SeqCst) {
            return Err(PaymentError::TransferFailed {
                reason: "forced failure".to_string(),
            });
        }
        self.payments
            .lock()
            .expect("payment log poisoned")
            .push((*to, amount));
        Ok(())
    }
}

/// Manually advanced clock; never moves backwards on its own
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(now: TimestampSeconds) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    pub fn set(&self, now: TimestampSeconds) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl TimeProvider for ManualClock {
    fn now(&self) -> TimestampSeconds {
        self.now.load(Ordering::SeqCst)
    }
}
