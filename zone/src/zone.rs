//! Zone geometry and assignment state.

use std::fmt;
use std::net::SocketAddr;

use codec::Vec3;

/// An axis-aligned region of the world simulated by at most one server.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Zone {
    pub index: u32,
    pub center: Vec3,
    /// Half the box size along each axis.
    pub half_extents: Vec3,
    /// Slack past the boundary before an object is handed off.
    pub margin: f32,
}

impl Zone {
    #[must_use]
    pub const fn new(index: u32, center: Vec3, half_extents: Vec3, margin: f32) -> Self {
        Self {
            index,
            center,
            half_extents,
            margin,
        }
    }

    /// Whether `position` lies inside the box, boundary included.
    #[must_use]
    pub fn contains(&self, position: Vec3) -> bool {
        self.contains_with_margin(position, 0.0)
    }

    /// Whether `position` lies inside the box grown by `margin` on every side.
    #[must_use]
    pub fn contains_with_margin(&self, position: Vec3, margin: f32) -> bool {
        (position.x - self.center.x).abs() <= self.half_extents.x + margin
            && (position.y - self.center.y).abs() <= self.half_extents.y + margin
            && (position.z - self.center.z).abs() <= self.half_extents.z + margin
    }

    /// Whether an object at `position` has left this zone for good.
    #[must_use]
    pub fn releases(&self, position: Vec3) -> bool {
        !self.contains_with_margin(position, self.margin)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "zone {} at {} ±{}",
            self.index, self.center, self.half_extents
        )
    }
}

/// Which server, if any, simulates a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneAssignment {
    #[default]
    Unassigned,
    Assigned(SocketAddr),
}

impl ZoneAssignment {
    #[must_use]
    pub const fn server(self) -> Option<SocketAddr> {
        match self {
            Self::Unassigned => None,
            Self::Assigned(addr) => Some(addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_zone() -> Zone {
        Zone::new(0, Vec3::ZERO, Vec3::new(10.0, 10.0, 10.0), 2.0)
    }

    #[test]
    fn contains_includes_boundary() {
        let zone = unit_zone();
        assert!(zone.contains(Vec3::new(10.0, -10.0, 0.0)));
        assert!(!zone.contains(Vec3::new(10.5, 0.0, 0.0)));
    }

    #[test]
    fn margin_delays_release() {
        let zone = unit_zone();
        assert!(!zone.releases(Vec3::new(11.5, 0.0, 0.0)));
        assert!(zone.releases(Vec3::new(12.5, 0.0, 0.0)));
        assert!(zone.releases(Vec3::new(0.0, 0.0, -13.0)));
    }

    #[test]
    fn assignment_server() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(ZoneAssignment::Unassigned.server(), None);
        assert_eq!(ZoneAssignment::Assigned(addr).server(), Some(addr));
    }
}
