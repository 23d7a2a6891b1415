use primitive_types::U256;

// Decimal precision required from the underlying token. The vesting math and
// the unit-cost pricing both assume 18-decimal fixed point; construction
// fails for any other precision.
pub const VIRTUAL_TOKEN_DECIMALS: u8 = 18;

// 10^18, one whole token (and one whole native-currency unit)
pub const UNIT_SCALE: U256 = U256([10u64.pow(VIRTUAL_TOKEN_DECIMALS as u32), 0, 0, 0]);

// ===== SCHEDULE RANGE LIMITS =====

// Minimum vesting duration in seconds (7 days)
pub const MIN_VESTING_DURATION: u64 = 7 * 86_400;
// Maximum vesting duration in seconds (50 years)
pub const MAX_VESTING_DURATION: u64 = 50 * 365 * 86_400;

// Slice period bounds in seconds. Vesting advances in whole slices.
pub const MIN_SLICE_PERIOD: u64 = 1;
pub const MAX_SLICE_PERIOD: u64 = 60;

// A schedule may start at most 30 weeks into the future
pub const MAX_START_DELAY: u64 = 30 * 7 * 86_400;

// Maximum committed principal per schedule: 2^200.
// Keeps amount_total * vested_seconds below 2^231 so the slice-quantised
// release formula never overflows 256 bits.
pub const MAX_SCHEDULE_AMOUNT: U256 = U256([0, 0, 0, 1 << 8]);

// ===== PURCHASABLE CLAIM LIMITS =====

// Unit cost must stay below one native-currency unit per vested token unit
pub const MAX_UNIT_COST: U256 = UNIT_SCALE;
