// Time source for the engine.
//
// All vesting math runs on wall-clock seconds. The engine consumes time
// through the TimeProvider trait so embedders can supply the executor's
// clock; the provider must be monotone non-decreasing or releasable amounts
// could appear to shrink between reads.

use std::time::{SystemTime, UNIX_EPOCH};

// Seconds timestamps used to determine it using its type
pub type TimestampSeconds = u64;

/// Clock consumed by the engine. Implementations must never go backwards.
pub trait TimeProvider {
    /// Current time in seconds since the Unix epoch
    fn now(&self) -> TimestampSeconds;
}

/// Wall-clock provider backed by `SystemTime`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> TimestampSeconds {
        // A system clock before the epoch is a host misconfiguration; treat
        // it as time zero rather than aborting the embedder.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
