//! Default policy parameters.

/// Default width of the Aging shift counter, in bits.
///
/// Eight bits is the textbook choice: enough history to separate pages
/// touched in the last few ticks from pages idle for many.
pub const DEFAULT_AGING_BITS: u32 = 8;

/// Widest supported Aging counter (the counter is a `u64`).
pub const MAX_AGING_BITS: u32 = 64;

/// Default number of references between Aging ticks.
pub const DEFAULT_AGING_REFRESH: u64 = 1;

/// Default working-set window for WorkingSet and WSClock, in time units.
pub const DEFAULT_WINDOW: u64 = 4;

/// Default NRU reference-bit reset interval for a given frame count.
///
/// NRU periodically clears every reference bit so the (R, M) classes stay
/// meaningful; twice the frame count gives each resident page a chance to
/// be re-referenced between resets.
pub fn default_nru_reset_interval(frame_count: usize) -> u64 {
    (frame_count as u64 * 2).max(1)
}
