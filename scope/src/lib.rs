//! Scope: which objects each connection observes, and how often it hears
//! about them.
//!
//! Every (viewer, object) pair is placed in a [`ScopeTier`] by distance:
//! `Level1` objects sync on every sync tick, `Level2` on every 2nd, `Level3`
//! on every 4th, and `Out` objects do not exist for the viewer at all.
//! Entering scope sends an instantiation whose payload depends on the
//! viewer's [`Relationship`] to the object; leaving sends a destroy to that
//! viewer only.
//!
//! [`ScopeManager`] is the bookkeeping, [`ScopeReplicator`] drives it from a
//! node's object table on the authoritative side, and [`ScopeReceiver`]
//! applies the resulting messages through a [`ViewReader`] on the other.

mod config;
mod error;
mod manager;
pub mod methods;
mod receiver;
mod relationship;
mod replicator;
mod tier;
mod view;

pub use config::ScopeConfig;
pub use error::{ScopeError, ScopeResult};
pub use manager::{ScopeEntry, ScopeManager, Transition};
pub use methods::register_methods;
pub use receiver::{ScopeReceiver, ViewEvent};
pub use relationship::Relationship;
pub use replicator::{ScopeReplicator, ScopeStats};
pub use tier::ScopeTier;
pub use view::{ViewReader, ViewWriter};
pub use zone::WorldQuery;
