//! Gas limit buffering.
//!
//! Estimates are taken against the state at estimation time and can be
//! optimistic by the time the transaction mines, so the submitted limit is
//! the estimate scaled up by a fixed percentage.

/// Default buffer: 120% of the estimate.
pub const DEFAULT_GAS_BUFFER_PERCENT: u64 = 120;

/// Scale `estimate` by `percent`, rounding up and saturating at `u64::MAX`.
pub fn buffered_gas_limit(estimate: u64, percent: u64) -> u64 {
    let scaled = (u128::from(estimate) * u128::from(percent)).div_ceil(100);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
