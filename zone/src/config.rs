/// Zone server tuning. The handoff margin is part of each [`Zone`](crate::Zone).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ZoneConfig {
    /// Wait for a handoff acknowledgement before authority is resumed.
    pub handoff_timeout_ms: u64,
    /// Time between two evaluations of local objects.
    pub evaluate_interval_ms: u64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            handoff_timeout_ms: 2000,
            evaluate_interval_ms: 100,
        }
    }
}

impl ZoneConfig {
    /// Creates a config suitable for testing with smaller values.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            handoff_timeout_ms: 200,
            evaluate_interval_ms: 10,
        }
    }
}
