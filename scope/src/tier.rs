use std::fmt;

use crate::config::ScopeConfig;

/// How often a viewer hears about an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScopeTier {
    /// The object does not exist for the viewer.
    #[default]
    Out,
    /// Every sync tick.
    Level1,
    /// Every 2nd sync tick.
    Level2,
    /// Every 4th sync tick.
    Level3,
}

impl ScopeTier {
    /// Sync ticks between two transmissions, `None` when out of scope.
    #[must_use]
    pub const fn period(self) -> Option<u32> {
        match self {
            Self::Out => None,
            Self::Level1 => Some(1),
            Self::Level2 => Some(2),
            Self::Level3 => Some(4),
        }
    }

    #[must_use]
    pub const fn is_in_scope(self) -> bool {
        !matches!(self, Self::Out)
    }

    /// Band for `distance`. The band a viewer is currently in is widened by
    /// the configured hysteresis.
    #[must_use]
    pub fn classify(distance: f32, config: &ScopeConfig, current: Self) -> Self {
        let bands = [
            (Self::Level1, config.level1_distance),
            (Self::Level2, config.level2_distance),
            (Self::Level3, config.level3_distance),
        ];
        for (tier, edge) in bands {
            let slack = if tier == current { config.hysteresis } else { 0.0 };
            if distance <= edge + slack {
                return tier;
            }
        }
        Self::Out
    }
}

impl fmt::Display for ScopeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Out => "out",
            Self::Level1 => "level1",
            Self::Level2 => "level2",
            Self::Level3 => "level3",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_by_distance() {
        let config = ScopeConfig::for_testing();
        let classify = |d| ScopeTier::classify(d, &config, ScopeTier::Out);
        assert_eq!(classify(0.0), ScopeTier::Level1);
        assert_eq!(classify(5.0), ScopeTier::Level1);
        assert_eq!(classify(7.0), ScopeTier::Level2);
        assert_eq!(classify(15.0), ScopeTier::Level3);
        assert_eq!(classify(20.5), ScopeTier::Out);
    }

    #[test]
    fn hysteresis_only_widens_current_band() {
        let config = ScopeConfig {
            hysteresis: 2.0,
            ..ScopeConfig::for_testing()
        };
        assert_eq!(
            ScopeTier::classify(6.0, &config, ScopeTier::Level1),
            ScopeTier::Level1
        );
        assert_eq!(
            ScopeTier::classify(6.0, &config, ScopeTier::Level2),
            ScopeTier::Level2
        );
        assert_eq!(
            ScopeTier::classify(21.0, &config, ScopeTier::Level3),
            ScopeTier::Level3
        );
        assert_eq!(
            ScopeTier::classify(21.0, &config, ScopeTier::Out),
            ScopeTier::Out
        );
    }

    #[test]
    fn periods() {
        assert_eq!(ScopeTier::Level1.period(), Some(1));
        assert_eq!(ScopeTier::Level2.period(), Some(2));
        assert_eq!(ScopeTier::Level3.period(), Some(4));
        assert_eq!(ScopeTier::Out.period(), None);
    }
}
