pub mod claim;
pub mod engine;
pub mod events;
pub mod math;
pub mod schedule;
pub mod store;

pub use claim::{MerkleGate, PurchaseTerms};
pub use engine::{EngineConfig, EngineState, GateConfig, VestingEngine};
pub use events::EngineEvent;
pub use schedule::{
    fingerprint, leaf_hash, schedule_id, Schedule, ScheduleParams, ScheduleStatus,
};
pub use store::ScheduleStore;

#[cfg(test)]
mod proptests;
