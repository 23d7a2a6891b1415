// External collaborators: the underlying fungible-token ledger and the
// native-currency payment sink. Both are bound at engine construction and
// consumed behind trait objects; the engine only ever moves value OUT, and
// only after all of its own state mutation.

use primitive_types::U256;
use thiserror::Error;

use crate::crypto::Address;

/// Errors surfaced by the underlying token ledger
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The ledger refused or could not complete the transfer.
    /// Partial transfers are forbidden; a failed transfer moved nothing.
    #[error("token transfer failed: {reason}")]
    TransferFailed { reason: String },

    /// The ledger could not report a balance
    #[error("token balance query failed: {reason}")]
    BalanceUnavailable { reason: String },
}

/// Errors surfaced by the native-currency payment sink
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The native-currency transfer to the receiver failed
    #[error("native payment failed: {reason}")]
    TransferFailed { reason: String },
}

/// Underlying fungible-token ledger, scoped to the engine's own holdings.
///
/// The adapter is bound to the engine's account at construction: `balance`
/// reports what the engine holds, `transfer` debits the engine. Transfers are
/// atomic; on error nothing moved.
pub trait TokenAdapter {
    /// The engine's own holdings on the underlying ledger
    fn balance(&self) -> Result<U256, TokenError>;

    /// Move `amount` from the engine's account to `to`, all or nothing
    fn transfer(&mut self, to: &Address, amount: U256) -> Result<(), TokenError>;

    /// Decimal precision of the underlying token
    fn decimals(&self) -> u8;
}

/// Recipient of native-currency payments collected by the purchasable claim
/// gate. Forwards the exact attached price to the configured receiver.
pub trait NativeSink {
    fn transfer(&mut self, to: &Address, amount: U256) -> Result<(), PaymentError>;
}
