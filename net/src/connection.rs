//! Per-remote connection state.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::net::SocketAddr;

use codec::Message;
use rpc::{IdTable, Negotiation};

/// How many recent reliable sequences are remembered for duplicate detection.
const SEEN_WINDOW: usize = 1024;

/// RPCs held back while negotiation is incomplete.
pub(crate) const MAX_DEFERRED: usize = 64;

/// The far end of a connection, as seen from this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionRole {
    /// The remote connected to us as a client.
    Client,
    /// We connected to the remote as a client.
    Server,
    /// Server-to-server link in either direction.
    Peer,
}

impl fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
            Self::Peer => write!(f, "peer"),
        }
    }
}

/// Which kind of handshake an outbound attempt uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectKind {
    Client,
    Peer,
}

impl ConnectKind {
    /// Role of the remote once the attempt succeeds.
    #[must_use]
    pub const fn outbound_role(self) -> ConnectionRole {
        match self {
            Self::Client => ConnectionRole::Server,
            Self::Peer => ConnectionRole::Peer,
        }
    }

    /// Role of the remote when it made this kind of request to us.
    #[must_use]
    pub const fn inbound_role(self) -> ConnectionRole {
        match self {
            Self::Client => ConnectionRole::Client,
            Self::Peer => ConnectionRole::Peer,
        }
    }
}

/// An outbound handshake waiting for an answer.
#[derive(Debug, Clone)]
pub(crate) struct PendingConnect {
    pub(crate) kind: ConnectKind,
    pub(crate) datagram: Vec<u8>,
    pub(crate) sent_at: u64,
    pub(crate) retries_left: u32,
}

/// A reliable message waiting for its ack.
#[derive(Debug, Clone)]
pub(crate) struct Unacked {
    pub(crate) datagram: Vec<u8>,
    pub(crate) last_sent: u64,
    pub(crate) resends: u32,
}

#[derive(Debug, Default)]
struct SeenSequences {
    seen: HashSet<u32>,
    order: VecDeque<u32>,
}

impl SeenSequences {
    /// Records `sequence`; returns `false` if it was already seen.
    fn insert(&mut self, sequence: u32) -> bool {
        if !self.seen.insert(sequence) {
            return false;
        }
        self.order.push_back(sequence);
        if self.order.len() > SEEN_WINDOW {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }
}

/// An established connection.
#[derive(Debug)]
pub struct Connection {
    addr: SocketAddr,
    role: ConnectionRole,
    pub(crate) negotiation: Negotiation,
    pub(crate) last_activity: u64,
    pub(crate) last_send: u64,
    next_sequence: u32,
    pub(crate) unacked: BTreeMap<u32, Unacked>,
    seen: SeenSequences,
    pub(crate) deferred: Vec<Message>,
}

impl Connection {
    pub(crate) fn new(addr: SocketAddr, role: ConnectionRole, now: u64) -> Self {
        Self {
            addr,
            role,
            negotiation: Negotiation::new(),
            last_activity: now,
            last_send: now,
            next_sequence: 0,
            unacked: BTreeMap::new(),
            seen: SeenSequences::default(),
            deferred: Vec::new(),
        }
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    #[must_use]
    pub const fn role(&self) -> ConnectionRole {
        self.role
    }

    /// `true` once RPC ids are resolved.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.negotiation.is_ready()
    }

    #[must_use]
    pub const fn ids(&self) -> &IdTable {
        self.negotiation.ids()
    }

    #[must_use]
    pub const fn last_activity(&self) -> u64 {
        self.last_activity
    }

    /// Reliable messages still waiting for an ack.
    #[must_use]
    pub fn unacked_len(&self) -> usize {
        self.unacked.len()
    }

    /// RPCs received before negotiation finished, replayed once ready.
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub(crate) fn take_sequence(&mut self) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        sequence
    }

    /// Returns `false` for a duplicate reliable sequence.
    pub(crate) fn accept_sequence(&mut self, sequence: u32) -> bool {
        self.seen.insert(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        Connection::new("127.0.0.1:1".parse().unwrap(), ConnectionRole::Peer, 0)
    }

    #[test]
    fn roles_by_direction() {
        assert_eq!(ConnectKind::Client.outbound_role(), ConnectionRole::Server);
        assert_eq!(ConnectKind::Client.inbound_role(), ConnectionRole::Client);
        assert_eq!(ConnectKind::Peer.outbound_role(), ConnectionRole::Peer);
        assert_eq!(ConnectKind::Peer.inbound_role(), ConnectionRole::Peer);
    }

    #[test]
    fn sequences_increase() {
        let mut conn = conn();
        assert_eq!(conn.take_sequence(), 0);
        assert_eq!(conn.take_sequence(), 1);
    }

    #[test]
    fn duplicate_sequences_detected() {
        let mut conn = conn();
        assert!(conn.accept_sequence(5));
        assert!(!conn.accept_sequence(5));
        assert!(conn.accept_sequence(6));
    }

    #[test]
    fn seen_window_is_bounded() {
        let mut seen = SeenSequences::default();
        for sequence in 0..(SEEN_WINDOW as u32 + 10) {
            assert!(seen.insert(sequence));
        }
        assert_eq!(seen.order.len(), SEEN_WINDOW);
        assert!(seen.insert(0));
    }
}
