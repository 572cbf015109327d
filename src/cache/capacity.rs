//! Capacity Policy
//!
//! Byte ceiling and recovery threshold that drive the LRU sweep.

// == Capacity Policy ==
/// Capacity limits for the cache.
///
/// When the total size exceeds `max_bytes`, a sweep frees at least
/// `max(total - max_bytes, max_bytes * recover_pct / 100)` bytes, so a burst of
/// evictions leaves headroom below the ceiling instead of trimming to it exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapacityPolicy {
    /// Ceiling in bytes, 0 = unbounded
    pub max_bytes: u64,
    /// Share of the ceiling (0..=100) to recover per sweep, None = trim to the ceiling
    pub recover_pct: Option<u8>,
}

impl CapacityPolicy {
    /// Creates a policy; percentages above 100 are clamped.
    pub fn new(max_bytes: u64, recover_pct: Option<u8>) -> Self {
        Self {
            max_bytes,
            recover_pct: recover_pct.map(|pct| pct.min(100)),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_bounded(&self) -> bool {
        self.max_bytes > 0
    }

    /// True when `total_bytes` is over the ceiling.
    pub fn is_exceeded_by(&self, total_bytes: u64) -> bool {
        self.is_bounded() && total_bytes > self.max_bytes
    }

    /// Minimum number of bytes a sweep recovers.
    pub fn recovery_bytes(&self) -> u64 {
        let pct = u64::from(self.recover_pct.unwrap_or(0));
        self.max_bytes.saturating_mul(pct) / 100
    }

    /// Occupancy a sweep starting at `total_bytes` must reach.
    pub fn sweep_target(&self, total_bytes: u64) -> u64 {
        self.max_bytes
            .min(total_bytes.saturating_sub(self.recovery_bytes()))
    }
}
