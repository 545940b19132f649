use std::net::SocketAddr;

use codec::ObjectId;

use crate::zone::Zone;

/// Outcomes of the zone layer, returned to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneEvent {
    /// The authority gave `zone` to `server`.
    ZoneAssigned { zone: Zone, server: SocketAddr },
    /// The authority took a zone back from a departed server.
    ZoneReleased { index: u32, server: SocketAddr },
    /// This server simulates `zone` from now on.
    Joined(Zone),
    NeighborAdded { zone: Zone, server: SocketAddr },
    NeighborRemoved { index: u32, server: SocketAddr },
    /// A neighbor handed an object to this server.
    ObjectClaimed { object: ObjectId, from: SocketAddr },
    /// This server gave up an object to a neighbor.
    ObjectHandedOff { object: ObjectId, to: SocketAddr },
    /// A handoff went unanswered; this server authors the object again.
    HandoffRolledBack { object: ObjectId },
    /// The old owner had moved on; the claim on `object` was withdrawn.
    ClaimCancelled { object: ObjectId, from: SocketAddr },
    /// A server asked this client to reach `object` through `server`.
    TargetAdded { object: ObjectId, server: SocketAddr },
}
