use std::net::SocketAddr;

use codec::CodecError;
use rpc::RpcError;
use thiserror::Error;

pub type NetResult<T> = Result<T, NetError>;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("no connection to {addr}")]
    NotConnected { addr: SocketAddr },

    #[error("connection to {addr} has not finished id negotiation")]
    NotReady { addr: SocketAddr },

    #[error("transport refused datagram to {addr}")]
    SendFailed { addr: SocketAddr },

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("message encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("datagram framing failed: {0}")]
    Wire(#[from] wire::EncodeError),
}
