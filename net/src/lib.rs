//! The zonal node: connection lifecycle, id negotiation and message dispatch.
//!
//! A [`Node`] owns one [`Transport`](transport::Transport) and every
//! connection on it. Each [`Node::tick`] drains the transport, answers
//! handshakes, runs RPC id negotiation, dispatches commands and RPCs, then
//! performs the end-of-frame work: connect retries, liveness expiry, reliable
//! resends and heartbeats. Everything observable comes back as [`NodeEvent`]s.
//!
//! # Connection roles
//!
//! Roles are computed locally from the handshake direction and never sent:
//!
//! | request | initiator sees | responder sees |
//! |---|---|---|
//! | `connect` | `Server` | `Client` |
//! | `connect_to_peer` | `Peer` | `Peer` |

mod config;
mod connection;
mod error;
mod event;
mod node;
mod object;

pub use config::NodeConfig;
pub use connection::{ConnectKind, Connection, ConnectionRole};
pub use error::{NetError, NetResult};
pub use event::NodeEvent;
pub use node::{Approval, Delivery, Node};
pub use object::{Authority, ObjectRecord, ObjectTable};
