//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the usize range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_usize(value: f64) -> usize {
    if !value.is_finite() {
        return 0;
    }
    let max = cast::<usize, f64>(usize::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).floor();
    cast::<f64, usize>(clamped).unwrap_or(0)
}

/// Floor a f64 into the u32 range; `None` for negative, non-finite, or too-large values.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    cast::<f64, u32>(value.floor())
}

/// Convert the top 53 bits of a hash into a ratio in `[0, 1)`.
#[must_use]
pub fn unit_ratio_from_u64(hash: u64) -> f64 {
    const MANTISSA_BITS: u32 = 53;
    let top = hash >> (u64::BITS - MANTISSA_BITS);
    let denom = cast::<u64, f64>(1_u64 << MANTISSA_BITS).unwrap_or(f64::MAX);
    cast::<u64, f64>(top).unwrap_or(0.0) / denom
}

/// Convert a reliability percentage into an error probability in `[0, 1]`.
#[must_use]
pub fn failure_probability(reliability_pct: u8) -> f64 {
    let clamped = f64::from(reliability_pct.min(100));
    (1.0 - clamped / 100.0).clamp(0.0, 1.0)
}
