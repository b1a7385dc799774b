//! PoW difficulty thresholds per network.

const LIVE_THRESHOLD: u64 = 0xFFFF_FFC0_0000_0000;

/// The proof-of-work bar every block must clear over its root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkThresholds {
    pub threshold: u64,
}

impl WorkThresholds {
    /// Production threshold.
    pub fn live() -> Self {
        Self {
            threshold: LIVE_THRESHOLD,
        }
    }

    /// Development/test threshold: PoW disabled.
    pub fn dev() -> Self {
        Self { threshold: 0 }
    }

    /// Construct with a custom threshold (low-difficulty devnets).
    pub fn with_threshold(threshold: u64) -> Self {
        Self { threshold }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_threshold_is_disabled() {
        assert_eq!(WorkThresholds::dev().threshold, 0);
    }

    #[test]
    fn live_threshold_is_hard() {
        assert!(WorkThresholds::live().threshold > u64::MAX / 2);
    }
}
