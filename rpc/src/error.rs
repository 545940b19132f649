use codec::{CodecError, MessageId};
use thiserror::Error;

pub type RpcResult<T> = Result<T, RpcError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("method '{name}' is already registered")]
    DuplicateMethod { name: String },

    #[error("method '{name}' is not registered")]
    UnknownMethod { name: String },

    #[error("method '{name}' has no negotiated id on this connection")]
    Unresolved { name: String },

    #[error("no method is bound to id {id}")]
    UnknownId { id: MessageId },

    #[error("id {id} is not a known command")]
    UnknownCommand { id: MessageId },

    #[error("argument {index} of '{method}' is missing or has the wrong type")]
    BadArgument { method: String, index: usize },

    #[error("rpc id space exhausted")]
    IdSpaceExhausted,

    #[error("malformed parameters: {0}")]
    Codec(#[from] CodecError),
}
