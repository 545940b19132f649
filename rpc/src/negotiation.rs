//! Per-connection RPC id negotiation.
//!
//! The protocol authority pushes `ConnectionRequirements` and one
//! `RemoteAssignment` per id it knows, then is ready. The other side waits
//! for all pushed assignments, requests ids for its remaining local names,
//! and becomes ready once every request is answered.

use std::collections::HashSet;

use codec::MessageId;

use crate::command::Command;
use crate::hash::registry_hash;
use crate::ids::{GlobalIds, IdTable, Insert};
use crate::registry::MethodRegistry;

/// Negotiation state of one connection.
#[derive(Debug, Clone, Default)]
pub struct Negotiation {
    ids: IdTable,
    expected: Option<u32>,
    received: u32,
    requested: bool,
    pending: HashSet<String>,
    ready: bool,
}

impl Negotiation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once RPC ids are resolved and ordinary traffic may flow.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// The ids agreed for this connection.
    #[must_use]
    pub const fn ids(&self) -> &IdTable {
        &self.ids
    }

    /// Called once the connection is established.
    ///
    /// `global` is `Some` on the protocol authority.
    pub fn start(
        &mut self,
        registry: &MethodRegistry,
        global: Option<&GlobalIds>,
    ) -> Vec<Command> {
        let Some(global) = global else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(global.len() + 1);
        out.push(Command::ConnectionRequirements {
            count: u32::try_from(global.len()).unwrap_or(u32::MAX),
            registry_hash: registry_hash(registry),
        });
        for (id, name) in global.iter() {
            self.ids.insert(id, name);
            out.push(Command::RemoteAssignment {
                id,
                name: name.to_owned(),
            });
        }
        self.ready = true;
        out
    }

    /// Applies one negotiation command and returns the replies to send.
    pub fn handle(
        &mut self,
        command: Command,
        registry: &MethodRegistry,
        global: Option<&mut GlobalIds>,
    ) -> Vec<Command> {
        match command {
            Command::ConnectionRequirements {
                count,
                registry_hash: remote,
            } => {
                let local = registry_hash(registry);
                if remote != local {
                    log::warn!(
                        "method registries differ (local {local:016x}, remote {remote:016x}), ids are negotiated by name"
                    );
                }
                if global.is_some() {
                    return Vec::new();
                }
                self.expected = Some(count);
                self.progress(registry)
            }
            Command::RemoteAssignment { id, name } => {
                self.merge(id, &name);
                self.received = self.received.saturating_add(1);
                if global.is_some() {
                    return Vec::new();
                }
                self.progress(registry)
            }
            Command::AssignmentRequest { name } => {
                let Some(global) = global else {
                    log::warn!("ignoring assignment request for '{name}', not the protocol authority");
                    return Vec::new();
                };
                match global.assign(&name) {
                    Ok(id) => {
                        self.merge(id, &name);
                        vec![Command::AssignmentResponse { id, name }]
                    }
                    Err(err) => {
                        log::warn!("cannot assign an id to '{name}': {err}");
                        Vec::new()
                    }
                }
            }
            Command::AssignmentResponse { id, name } => {
                self.merge(id, &name);
                self.pending.remove(&name);
                if global.is_some() {
                    return Vec::new();
                }
                self.progress(registry)
            }
            Command::Ack { .. } | Command::Heartbeat => Vec::new(),
        }
    }

    fn merge(&mut self, id: MessageId, name: &str) {
        if let Insert::Conflict {
            existing_id,
            existing_name,
        } = self.ids.insert(id, name)
        {
            log::warn!(
                "conflicting assignment {id} -> '{name}' ignored (local: {existing_id:?} / {existing_name:?})"
            );
        }
    }

    fn progress(&mut self, registry: &MethodRegistry) -> Vec<Command> {
        let Some(expected) = self.expected else {
            return Vec::new();
        };
        if self.received < expected {
            return Vec::new();
        }
        let mut out = Vec::new();
        if !self.requested {
            self.requested = true;
            for name in registry.names() {
                if self.ids.id(name).is_none() {
                    self.pending.insert(name.to_owned());
                    out.push(Command::AssignmentRequest {
                        name: name.to_owned(),
                    });
                }
            }
        }
        if self.pending.is_empty() && !self.ready {
            self.ready = true;
            log::debug!("rpc ids resolved ({} methods)", self.ids.len());
        }
        out
    }
}
