// Allow specific clippy lints that are acceptable design decisions
#![allow(clippy::too_many_arguments)] // API design choice
#![allow(clippy::module_inception)] // Module organization choice

//! # vesting-engine
//!
//! A vesting accounting engine with a Merkle-gated claim protocol.
//!
//! The engine manages a collection of token-release schedules, each gradually
//! converting a committed principal into releasable balance over time. An
//! administrator either installs schedules directly, or publishes a Merkle
//! commitment against which eligible beneficiaries self-install schedules by
//! presenting an inclusion proof (optionally paying a per-unit fee in native
//! currency).
//!
//! The underlying fungible-token ledger and the native-currency payment sink
//! are external collaborators, bound at construction through the
//! [`token::TokenAdapter`] and [`token::NativeSink`] traits.

pub mod access;
pub mod config;
pub mod crypto;
pub mod error;
pub mod testing;
pub mod time;
pub mod token;
pub mod vesting;

pub use error::{VestingError, VestingResult};
pub use vesting::{
    EngineConfig, EngineEvent, GateConfig, PurchaseTerms, Schedule, ScheduleParams,
    ScheduleStatus, VestingEngine,
};
