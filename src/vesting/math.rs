// The release function.
//
// Piecewise over `now`: zero before the cliff (and forever once revoked),
// the full remainder at or past `start + duration`, and in between the
// slice-quantised linear form
//
//   vested = floor(amount_total * vested_seconds / duration) - released
//
// The multiply-before-divide order is normative: it is what quantises
// vesting to whole slices identically to the published commitment scheme.

use primitive_types::U256;

use crate::time::TimestampSeconds;

use super::schedule::Schedule;

/// Amount releasable from `schedule` at `now`. Monotone non-decreasing in
/// `now` for a fixed schedule; zero for a revoked schedule.
pub fn releasable(schedule: &Schedule, now: TimestampSeconds) -> U256 {
    if schedule.is_revoked() || now < schedule.cliff {
        return U256::zero();
    }
    if now >= schedule.end() {
        return schedule.unreleased();
    }

    // now >= cliff >= start here, so the subtraction cannot underflow
    let elapsed = now - schedule.start;
    let slices = elapsed / schedule.slice_seconds;
    let vested_seconds = slices * schedule.slice_seconds;

    // amount_total <= 2^200 and vested_seconds < duration < 2^31, so the
    // product stays well under 2^256
    let vested = schedule.amount_total * U256::from(vested_seconds) / U256::from(schedule.duration);
    vested.saturating_sub(schedule.released)
}
