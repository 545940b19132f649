//! RPC registration, control commands and id negotiation for zonal.
//!
//! Method names are mapped to compact numeric ids per connection. The node
//! configured as protocol authority assigns ids from its [`MethodRegistry`] in
//! registration order ([`GlobalIds`]) and pushes them to each new connection;
//! the other side fills the gaps by asking. [`Negotiation`] tracks that
//! exchange for one connection. Ids at or above [`wire::COMMAND_BASE`] never
//! go through negotiation: they are the fixed [`Command`] table.

mod args;
mod command;
mod dispatch;
mod error;
mod hash;
mod ids;
mod negotiation;
mod registry;

pub use args::Args;
pub use command::{Command, CommandKind};
pub use dispatch::{prepare_call, resolve_call};
pub use error::{RpcError, RpcResult};
pub use hash::registry_hash;
pub use ids::{GlobalIds, IdTable, Insert};
pub use negotiation::Negotiation;
pub use registry::{Handler, MethodRegistry, RpcCall};
