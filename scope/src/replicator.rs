//! Server side: decides who sees which local object and sends the views.

use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;

use codec::{ObjectId, Value};
use net::{Connection, ConnectionRole, Delivery, Node, ObjectRecord};
use transport::Transport;
use zone::WorldQuery;

use crate::config::ScopeConfig;
use crate::manager::{ScopeManager, Transition};
use crate::methods::{DESTROY, INSTANTIATE, SYNC};
use crate::relationship::Relationship;
use crate::view::{write_instantiate, write_sync, ViewWriter};

/// Messages sent by one [`ScopeReplicator::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScopeStats {
    pub instantiated: usize,
    pub synced: usize,
    pub destroyed: usize,
}

/// Drives a [`ScopeManager`] from a node's object table.
///
/// Viewers are the ready client and peer connections. A viewer looks from
/// its explicit viewpoint, or else from the first object it controls; the
/// objects it controls are always in scope. Objects leaving local authority
/// through a handoff are dropped without a destroy, the new owner takes the
/// view over.
#[derive(Debug, Clone)]
pub struct ScopeReplicator {
    manager: ScopeManager,
    last_sync: Option<u64>,
}

impl ScopeReplicator {
    #[must_use]
    pub fn new(config: ScopeConfig) -> Self {
        Self {
            manager: ScopeManager::new(config),
            last_sync: None,
        }
    }

    pub const fn manager(&self) -> &ScopeManager {
        &self.manager
    }

    pub fn set_viewpoint(&mut self, viewer: SocketAddr, position: codec::Vec3) {
        self.manager.set_viewpoint(viewer, position);
    }

    /// Runs one sync tick once the sync interval has elapsed.
    pub fn tick<T, Q, W>(
        &mut self,
        node: &mut Node<T>,
        world: &Q,
        writer: &mut W,
        now: u64,
    ) -> ScopeStats
    where
        T: Transport,
        Q: WorldQuery,
        W: ViewWriter,
    {
        let interval = self.manager.config().sync_interval_ms;
        if self
            .last_sync
            .is_some_and(|last| now.saturating_sub(last) < interval)
        {
            return ScopeStats::default();
        }
        self.last_sync = Some(now);

        let mut stats = ScopeStats::default();
        let viewers: Vec<(SocketAddr, ConnectionRole)> = node
            .connections()
            .filter(|connection| is_viewer(connection))
            .map(|connection| (connection.addr(), connection.role()))
            .collect();
        for viewer in self.manager.viewers() {
            if !viewers.iter().any(|(addr, _)| *addr == viewer) {
                self.manager.remove_viewer(viewer);
            }
        }

        let local: BTreeSet<ObjectId> = node.objects().local_ids().into_iter().collect();
        self.forget_departed(node, &local, &mut stats);

        for &object in &local {
            if let (Some(position), Some(record)) =
                (world.position(object), node.objects_mut().get_mut(object))
            {
                record.position = position;
            }
        }
        let controlled = controlled_positions(node);

        for &object in &local {
            let Some(record) = node.objects().get(object).cloned() else {
                continue;
            };
            for &(viewer, role) in &viewers {
                let pinned = record.controller == Some(viewer);
                let distance = self
                    .manager
                    .viewpoint(viewer)
                    .or_else(|| controlled.get(&viewer).copied())
                    .map(|viewpoint| viewpoint.distance(record.position));
                match self.manager.update(viewer, object, distance, pinned) {
                    Transition::Entered(tier) => {
                        let relationship = Relationship::of(viewer, role, &record);
                        log::debug!("{object} enters scope of {viewer} at {tier} as {relationship}");
                        if instantiate(node, writer, viewer, relationship, &record) {
                            stats.instantiated += 1;
                        }
                        if let Some(record) = node.objects_mut().get_mut(object) {
                            record.observers.insert(viewer);
                        }
                    }
                    Transition::Left => {
                        log::debug!("{object} leaves scope of {viewer}");
                        if destroy(node, viewer, object) {
                            stats.destroyed += 1;
                        }
                        if let Some(record) = node.objects_mut().get_mut(object) {
                            record.observers.remove(&viewer);
                        }
                    }
                    Transition::Retiered { .. } | Transition::Unchanged => {}
                }
            }
        }

        for (viewer, object) in self.manager.sync_tick() {
            let Some(record) = node.objects().get(object).cloned() else {
                continue;
            };
            if sync(node, writer, viewer, &record) {
                stats.synced += 1;
            }
        }
        stats
    }

    /// Drops entries of objects this node no longer authors. Destroyed
    /// objects get a destroy, handed-off ones are left to their new owner.
    fn forget_departed<T: Transport>(
        &mut self,
        node: &mut Node<T>,
        local: &BTreeSet<ObjectId>,
        stats: &mut ScopeStats,
    ) {
        for object in self.manager.objects() {
            if local.contains(&object) {
                continue;
            }
            let viewers = self.manager.remove_object(object);
            if node.objects().contains(object) {
                log::debug!("{object} is no longer local, dropping {} views", viewers.len());
                continue;
            }
            for viewer in viewers {
                if destroy(node, viewer, object) {
                    stats.destroyed += 1;
                }
            }
        }
    }
}

fn controlled_positions<T: Transport>(node: &Node<T>) -> HashMap<SocketAddr, codec::Vec3> {
    let mut positions = HashMap::new();
    for record in node.objects().iter().filter(|record| record.is_local()) {
        if let Some(controller) = record.controller {
            positions.entry(controller).or_insert(record.position);
        }
    }
    positions
}

fn instantiate<T: Transport, W: ViewWriter>(
    node: &mut Node<T>,
    writer: &mut W,
    viewer: SocketAddr,
    relationship: Relationship,
    record: &ObjectRecord,
) -> bool {
    let data = match write_instantiate(writer, relationship, record) {
        Ok(data) => data,
        Err(err) => {
            log::warn!("cannot write {relationship} view of {}: {err}", record.id);
            return false;
        }
    };
    let params = vec![
        Value::U32(record.id.raw()),
        Value::U8(relationship.code()),
        Value::Vec3(record.position),
        Value::Bytes(data),
    ];
    send(node, viewer, INSTANTIATE, params, Delivery::Reliable)
}

fn sync<T: Transport, W: ViewWriter>(
    node: &mut Node<T>,
    writer: &mut W,
    viewer: SocketAddr,
    record: &ObjectRecord,
) -> bool {
    let data = match write_sync(writer, record) {
        Ok(data) => data,
        Err(err) => {
            log::warn!("cannot write sync of {}: {err}", record.id);
            return false;
        }
    };
    let params = vec![
        Value::U32(record.id.raw()),
        Value::Vec3(record.position),
        Value::Bytes(data),
    ];
    send(node, viewer, SYNC, params, Delivery::Unreliable)
}

fn destroy<T: Transport>(node: &mut Node<T>, viewer: SocketAddr, object: ObjectId) -> bool {
    let params = vec![Value::U32(object.raw())];
    send(node, viewer, DESTROY, params, Delivery::Reliable)
}

fn send<T: Transport>(
    node: &mut Node<T>,
    viewer: SocketAddr,
    method: &str,
    params: Vec<Value>,
    delivery: Delivery,
) -> bool {
    match node.send_rpc(viewer, method, ObjectId::NONE, params, delivery) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("'{method}' to {viewer} failed: {err}");
            false
        }
    }
}

fn is_viewer(connection: &Connection) -> bool {
    connection.is_ready() && connection.role() != ConnectionRole::Server
}
