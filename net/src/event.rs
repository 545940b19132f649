use std::net::SocketAddr;

use rpc::RpcCall;

use crate::connection::ConnectionRole;

/// Notifications produced by [`Node::tick`](crate::Node::tick).
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// An inbound client finished negotiation.
    ClientConnected(SocketAddr),
    /// Our client connection to a server finished negotiation.
    ConnectedToServer(SocketAddr),
    /// A peer link finished negotiation.
    PeerConnected(SocketAddr),
    ClientDisconnected(SocketAddr),
    DisconnectedFromServer(SocketAddr),
    PeerDisconnected(SocketAddr),
    /// The remote refused our connect request.
    ConnectionRefused(SocketAddr),
    /// Every connect attempt went unanswered.
    ConnectionFailed(SocketAddr),
    /// An established connection went silent.
    ConnectionTimedOut(SocketAddr, ConnectionRole),
    /// An RPC without a bound handler.
    Rpc(RpcCall),
}

impl NodeEvent {
    pub(crate) const fn connected(addr: SocketAddr, role: ConnectionRole) -> Self {
        match role {
            ConnectionRole::Client => Self::ClientConnected(addr),
            ConnectionRole::Server => Self::ConnectedToServer(addr),
            ConnectionRole::Peer => Self::PeerConnected(addr),
        }
    }

    pub(crate) const fn disconnected(addr: SocketAddr, role: ConnectionRole) -> Self {
        match role {
            ConnectionRole::Client => Self::ClientDisconnected(addr),
            ConnectionRole::Server => Self::DisconnectedFromServer(addr),
            ConnectionRole::Peer => Self::PeerDisconnected(addr),
        }
    }
}
