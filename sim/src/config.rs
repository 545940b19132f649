//! Simulation settings, loadable from JSON.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use codec::Vec3;
use net::NodeConfig;
use scope::ScopeConfig;
use serde::{Deserialize, Serialize};
use transport::TransportConfig;
use zone::{Zone, ZoneConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub transport: TransportConfig,
    pub node: NodeConfig,
    pub zone: ZoneConfig,
    pub scope: ScopeConfig,
    pub layout: Layout,
}

impl SimConfig {
    /// Reads `path` if given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
    }
}

/// A row of equal cubic zones along the x axis, zone 0 centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub zones: u32,
    pub zone_width: f32,
    pub margin: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            zones: 2,
            zone_width: 40.0,
            margin: 2.0,
        }
    }
}

impl Layout {
    pub fn zones(&self) -> Vec<Zone> {
        let half = self.zone_width / 2.0;
        (0..self.zones)
            .map(|index| {
                let center = Vec3::new(index as f32 * self.zone_width, 0.0, 0.0);
                Zone::new(index, center, Vec3::new(half, half, half), self.margin)
            })
            .collect()
    }

    /// Smallest and largest x a walker may reach.
    pub fn bounds(&self) -> (f32, f32) {
        let half = self.zone_width / 2.0;
        let last = self.zones.saturating_sub(1) as f32 * self.zone_width;
        (-half, last + half)
    }
}
