//! Spatial zones for zonal: who simulates which region, and moving objects
//! between the servers that do.
//!
//! - [`ZoneAuthority`] owns the zone list. Each peer that negotiates with it
//!   gets the lowest-indexed free [`Zone`] and learns about the others.
//! - [`ZoneServer`] simulates one zone. Its [`tick`](ZoneServer::tick) hands
//!   objects that left the zone (past the margin) to the neighbor now
//!   containing them, with a two-phase request/ack so no object ever has two
//!   authors.
//! - [`ZoneClient`] follows `Zone.AddTarget` redirects so controller RPCs
//!   reach the current owner.
//!
//! All three consume [`NodeEvent`](net::NodeEvent)s returned by
//! [`Node::tick`](net::Node::tick). The zone methods must be registered on
//! every node with [`register_methods`] before the node is built.

mod authority;
mod client;
mod config;
mod error;
mod event;
pub mod methods;
mod server;
mod world;
mod zone;

pub use authority::ZoneAuthority;
pub use client::ZoneClient;
pub use config::ZoneConfig;
pub use error::{ZoneError, ZoneResult};
pub use event::ZoneEvent;
pub use methods::register_methods;
pub use server::ZoneServer;
pub use world::{RecordedPositions, WorldQuery};
pub use zone::{Zone, ZoneAssignment};
