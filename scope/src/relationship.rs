use std::fmt;
use std::net::SocketAddr;

use net::{ConnectionRole, ObjectRecord};

/// How a viewer relates to an object it starts observing. Selects which
/// instantiation data it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    /// The viewer asked for the object to exist.
    Creator,
    /// The viewer controls the object.
    Owner,
    /// The viewer is another server.
    Peer,
    /// Anybody else.
    Proxy,
}

impl Relationship {
    /// Picks the relationship of `viewer` to `record`. Creator wins over
    /// owner when a client both spawned and drives an object.
    #[must_use]
    pub fn of(viewer: SocketAddr, role: ConnectionRole, record: &ObjectRecord) -> Self {
        if role == ConnectionRole::Peer {
            Self::Peer
        } else if record.creator == Some(viewer) {
            Self::Creator
        } else if record.controller == Some(viewer) {
            Self::Owner
        } else {
            Self::Proxy
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Creator => 0,
            Self::Owner => 1,
            Self::Peer => 2,
            Self::Proxy => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Creator),
            1 => Some(Self::Owner),
            2 => Some(Self::Peer),
            3 => Some(Self::Proxy),
            _ => None,
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Creator => "creator",
            Self::Owner => "owner",
            Self::Peer => "peer",
            Self::Proxy => "proxy",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use codec::{ObjectId, Vec3};
    use net::Authority;

    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn selection_order() {
        let mut record = ObjectRecord::new(ObjectId::new(1), Vec3::ZERO, Authority::Local);
        record.creator = Some(addr(1));
        record.controller = Some(addr(2));

        let client = ConnectionRole::Client;
        assert_eq!(Relationship::of(addr(1), client, &record), Relationship::Creator);
        assert_eq!(Relationship::of(addr(2), client, &record), Relationship::Owner);
        assert_eq!(Relationship::of(addr(3), client, &record), Relationship::Proxy);
        assert_eq!(
            Relationship::of(addr(1), ConnectionRole::Peer, &record),
            Relationship::Peer
        );

        record.controller = Some(addr(1));
        assert_eq!(Relationship::of(addr(1), client, &record), Relationship::Creator);
    }

    #[test]
    fn codes_are_distinct() {
        for relationship in [
            Relationship::Creator,
            Relationship::Owner,
            Relationship::Peer,
            Relationship::Proxy,
        ] {
            assert_eq!(Relationship::from_code(relationship.code()), Some(relationship));
        }
        assert_eq!(Relationship::from_code(4), None);
    }
}
