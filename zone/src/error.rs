use codec::ObjectId;
use net::NetError;
use rpc::RpcError;
use thiserror::Error;
use transport::TransportError;

pub type ZoneResult<T> = Result<T, ZoneError>;

#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("zone {index} is defined twice")]
    DuplicateZone { index: u32 },

    #[error("no communication target for {object}")]
    NoTarget { object: ObjectId },

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Address(#[from] TransportError),

    #[error(transparent)]
    Net(#[from] NetError),
}
