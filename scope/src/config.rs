/// Distance bands and sync cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScopeConfig {
    /// Outer edge of [`ScopeTier::Level1`](crate::ScopeTier::Level1).
    pub level1_distance: f32,
    /// Outer edge of [`ScopeTier::Level2`](crate::ScopeTier::Level2).
    pub level2_distance: f32,
    /// Outer edge of [`ScopeTier::Level3`](crate::ScopeTier::Level3); beyond it
    /// an object is out of scope.
    pub level3_distance: f32,
    /// Extra distance a viewer may drift past its current band before dropping
    /// to the next one.
    pub hysteresis: f32,
    /// Time between two sync ticks.
    pub sync_interval_ms: u64,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            level1_distance: 15.0,
            level2_distance: 40.0,
            level3_distance: 80.0,
            hysteresis: 0.0,
            sync_interval_ms: 50,
        }
    }
}

impl ScopeConfig {
    /// Creates a config suitable for testing with smaller values.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            level1_distance: 5.0,
            level2_distance: 10.0,
            level3_distance: 20.0,
            hysteresis: 0.0,
            sync_interval_ms: 10,
        }
    }
}
