// Schedule records and the canonical packed encodings.
//
// Three digests derive from the same tight big-endian packing of a schedule
// tuple under a beneficiary:
//   fingerprint = keccak(pack)            claim-registry key
//   leaf        = keccak(fingerprint)     Merkle leaf; the double hash keeps
//                                         leaves from colliding with internal
//                                         nodes
//   id          = keccak(beneficiary || index_be8)
//                                         storage key, independent of the
//                                         schedule contents
// Proofs are generated off-engine, so the packing is normative and must not
// change.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{
    config::{
        MAX_SCHEDULE_AMOUNT, MAX_SLICE_PERIOD, MAX_START_DELAY, MAX_VESTING_DURATION,
        MIN_SLICE_PERIOD, MIN_VESTING_DURATION,
    },
    crypto::{keccak, Address, Hash},
    error::{VestingError, VestingResult},
    time::TimestampSeconds,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleStatus {
    /// Live schedule accruing releasable balance
    Initialized,
    /// Terminated by the administrator; the slot and its index survive
    Revoked,
}

/// The schedule tuple supplied on create, and presented (with a proof) on
/// claim. The claim fingerprint and Merkle leaf are computed over exactly
/// these fields plus the beneficiary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleParams {
    /// Absolute time accrual begins, seconds
    pub start: TimestampSeconds,
    /// No-release interval measured from `start`, seconds
    pub cliff_offset: u64,
    /// Accrual completes at `start + duration`
    pub duration: u64,
    /// Release granularity, 1-60 seconds
    pub slice_seconds: u64,
    /// Whether the administrator may revoke
    pub revokable: bool,
    /// Committed principal
    pub amount: U256,
}

impl ScheduleParams {
    /// Range preconditions shared by direct create and the claim gate.
    /// Checked in the documented order; each failure has its own tag.
    pub fn validate(&self, now: TimestampSeconds) -> VestingResult<()> {
        if self.amount.is_zero() || self.amount > MAX_SCHEDULE_AMOUNT {
            return Err(VestingError::InvalidAmount);
        }
        if self.duration < MIN_VESTING_DURATION || self.duration > MAX_VESTING_DURATION {
            return Err(VestingError::InvalidDuration {
                duration: self.duration,
            });
        }
        if self.slice_seconds < MIN_SLICE_PERIOD || self.slice_seconds > MAX_SLICE_PERIOD {
            return Err(VestingError::InvalidSlicePeriod {
                slice_seconds: self.slice_seconds,
            });
        }
        if self.cliff_offset > self.duration {
            return Err(VestingError::DurationShorterThanCliff {
                duration: self.duration,
                cliff_offset: self.cliff_offset,
            });
        }
        if self.start > now.saturating_add(MAX_START_DELAY) {
            return Err(VestingError::InvalidStart { start: self.start });
        }
        Ok(())
    }
}

/// A stored token-release schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub beneficiary: Address,
    /// Absolute time accrual begins
    pub start: TimestampSeconds,
    /// Absolute time before which nothing is releasable (`start + cliff_offset`)
    pub cliff: TimestampSeconds,
    pub duration: u64,
    pub slice_seconds: u64,
    /// Committed principal, fixed at creation
    pub amount_total: U256,
    /// Cumulative amount already paid out
    pub released: U256,
    pub revokable: bool,
    pub status: ScheduleStatus,
}

impl Schedule {
    pub fn new(beneficiary: Address, params: &ScheduleParams) -> Self {
        Self {
            beneficiary,
            start: params.start,
            cliff: params.start.saturating_add(params.cliff_offset),
            duration: params.duration,
            slice_seconds: params.slice_seconds,
            amount_total: params.amount,
            released: U256::zero(),
            revokable: params.revokable,
            status: ScheduleStatus::Initialized,
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.status == ScheduleStatus::Revoked
    }

    /// Committed principal not yet paid out
    pub fn unreleased(&self) -> U256 {
        self.amount_total.saturating_sub(self.released)
    }

    /// Absolute time accrual completes
    pub fn end(&self) -> TimestampSeconds {
        self.start.saturating_add(self.duration)
    }
}

// 32 (beneficiary) + 4 * 8 (times) + 1 (flag) + 32 (amount)
const PACKED_TUPLE_SIZE: usize = 97;

fn pack_tuple(beneficiary: &Address, params: &ScheduleParams) -> Vec<u8> {
    let mut data = Vec::with_capacity(PACKED_TUPLE_SIZE);
    data.extend_from_slice(beneficiary.as_bytes());
    data.extend_from_slice(&params.start.to_be_bytes());
    data.extend_from_slice(&params.cliff_offset.to_be_bytes());
    data.extend_from_slice(&params.duration.to_be_bytes());
    data.extend_from_slice(&params.slice_seconds.to_be_bytes());
    data.push(params.revokable as u8);
    let mut amount = [0u8; 32];
    params.amount.to_big_endian(&mut amount);
    data.extend_from_slice(&amount);
    data
}

/// Claim-registry key for a schedule tuple under a beneficiary
pub fn fingerprint(beneficiary: &Address, params: &ScheduleParams) -> Hash {
    keccak(&pack_tuple(beneficiary, params))
}

/// Merkle leaf for a schedule tuple under a beneficiary
pub fn leaf_hash(beneficiary: &Address, params: &ScheduleParams) -> Hash {
    keccak(fingerprint(beneficiary, params).as_bytes())
}

/// Storage identifier of the beneficiary's `index`-th schedule
pub fn schedule_id(beneficiary: &Address, index: u64) -> Hash {
    let mut data = Vec::with_capacity(32 + 8);
    data.extend_from_slice(beneficiary.as_bytes());
    data.extend_from_slice(&index.to_be_bytes());
    keccak(&data)
}
