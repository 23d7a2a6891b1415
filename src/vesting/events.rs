// Structured notifications emitted by state transitions.
//
// Events are buffered on the engine per successful operation and drained by
// the embedder (indexer, RPC layer, test harness). Virtual-token supply
// changes additionally emit a pseudo-transfer with the zero identity as
// counterpart: mint on create/claim, burn on release and revoke.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{
    access::Role,
    crypto::{Address, Hash},
    time::TimestampSeconds,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum EngineEvent {
    ScheduleCreated {
        id: Hash,
        beneficiary: Address,
        index: u64,
        start: TimestampSeconds,
        cliff: TimestampSeconds,
        duration: u64,
        slice_seconds: u64,
        revokable: bool,
        amount: U256,
    },
    TokensReleased {
        id: Hash,
        beneficiary: Address,
        amount: U256,
    },
    ScheduleRevoked {
        id: Hash,
        beneficiary: Address,
        /// Vested remainder paid out as part of the revoke
        released: U256,
        /// Unreleased principal returned to the free pool
        refunded: U256,
    },
    /// A schedule was self-installed through the Merkle gate
    ScheduleClaimed {
        id: Hash,
        beneficiary: Address,
        fingerprint: Hash,
        amount: U256,
        /// Native currency forwarded to the payment receiver (zero when the
        /// gate has no purchase terms)
        price: U256,
    },
    /// Mint/burn pseudo-transfer on the virtual balance; `from` or `to` is
    /// the zero identity
    VirtualTransfer {
        from: Address,
        to: Address,
        value: U256,
    },
    Withdrawn {
        to: Address,
        amount: U256,
    },
    Paused,
    Unpaused,
    RoleGranted {
        role: Role,
        account: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
    },
    AdminTransferStarted {
        incumbent: Address,
        nominee: Address,
    },
    AdminTransferCompleted {
        incumbent: Address,
        nominee: Address,
    },
    AdminTransferCanceled {
        incumbent: Address,
        nominee: Address,
    },
    MerkleRootUpdated {
        previous: Hash,
        current: Hash,
    },
    UnitCostUpdated {
        previous: U256,
        current: U256,
    },
    PaymentReceiverUpdated {
        previous: Address,
        current: Address,
    },
}
