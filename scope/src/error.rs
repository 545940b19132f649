use bitstream::BitError;
use net::NetError;
use rpc::RpcError;
use thiserror::Error;

pub type ScopeResult<T> = Result<T, ScopeError>;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("unknown relationship code {code}")]
    UnknownRelationship { code: u8 },

    #[error("view payload: {0}")]
    View(#[from] BitError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Net(#[from] NetError),
}
