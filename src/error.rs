use primitive_types::U256;
use thiserror::Error;

use crate::token::{PaymentError, TokenError};

/// Result type for engine operations
pub type VestingResult<T> = Result<T, VestingError>;

/// Every externally distinguishable failure of the engine.
///
/// Each entry point either completes fully or returns exactly one of these,
/// naming the first violated precondition; no partial state survives a
/// failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VestingError {
    /// The underlying token does not expose 18 decimals
    #[error("underlying token must have 18 decimals, found {found}")]
    UnsupportedDecimals { found: u8 },

    /// Free pool too small for the requested commitment or withdrawal
    #[error("insufficient tokens in contract: requested {requested}, withdrawable {available}")]
    InsufficientTokensInContract { requested: U256, available: U256 },

    /// Release amount exceeds what the schedule has vested so far
    #[error("insufficient releasable tokens: requested {requested}, releasable {releasable}")]
    InsufficientReleasableTokens { requested: U256, releasable: U256 },

    /// No schedule exists under the given identifier
    #[error("schedule does not exist")]
    InvalidSchedule,

    /// Duration outside [7 days, 50 years]
    #[error("invalid vesting duration: {duration} seconds")]
    InvalidDuration { duration: u64 },

    /// Amount is zero or exceeds the per-schedule maximum
    #[error("invalid amount")]
    InvalidAmount,

    /// Slice period outside [1, 60] seconds
    #[error("invalid slice period: {slice_seconds} seconds")]
    InvalidSlicePeriod { slice_seconds: u64 },

    /// Start lies more than 30 weeks past the current time
    #[error("invalid start time: {start}")]
    InvalidStart { start: u64 },

    /// Cliff offset exceeds the total duration
    #[error("duration {duration} is shorter than cliff offset {cliff_offset}")]
    DurationShorterThanCliff { duration: u64, cliff_offset: u64 },

    /// Revoke attempted on a schedule created without the revokable flag
    #[error("schedule is not revokable")]
    NotRevokable,

    /// Caller lacks the role the operation requires
    #[error("caller is not authorized")]
    Unauthorized,

    /// Operation attempted on a revoked schedule
    #[error("schedule was revoked")]
    ScheduleWasRevoked,

    /// Operation exists on the surface but is forbidden by construction
    /// (virtual-balance transfers, gate operations on an ungated engine)
    #[error("operation not supported")]
    NotSupported,

    /// The zero identity where a real identity is required
    #[error("invalid address")]
    InvalidAddress,

    /// Merkle proof does not connect the claimed tuple to the current root
    #[error("invalid merkle proof")]
    InvalidProof,

    /// The exact schedule tuple was already installed through the gate
    #[error("schedule already claimed")]
    AlreadyClaimed,

    /// Schedule creation paths are suspended
    #[error("engine is paused")]
    Paused,

    /// A value-moving entry point was re-entered
    #[error("reentrant call")]
    ReentrantCall,

    /// Handover acceptance by anyone but the pending nominee
    #[error("admin transfer failed: caller is not the pending admin")]
    AdminTransferFailed,

    /// Outbound transfer on the underlying token ledger failed
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Outbound native-currency payment failed
    #[error(transparent)]
    Payment(#[from] PaymentError),
}
