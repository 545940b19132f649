//! A server simulating one zone and trading objects with its neighbors.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use codec::{ObjectId, Value, Vec3};
use net::{Authority, ConnectionRole, Delivery, Node, NodeEvent, ObjectRecord};
use rpc::RpcCall;
use transport::{format_address, Transport};

use crate::authority::ZoneAuthority;
use crate::config::ZoneConfig;
use crate::error::ZoneResult;
use crate::event::ZoneEvent;
use crate::methods::{
    read_address, read_zone, Handoff, ADD_TARGET, ASSIGN, HANDOFF_ACK, HANDOFF_CANCEL,
    HANDOFF_REQUEST, NEIGHBOR, RELEASE,
};
use crate::world::WorldQuery;
use crate::zone::Zone;

/// Zone state of one simulating server.
///
/// Handoff is two-phase: the old server marks the object
/// [`Authority::Transferring`] and stops authoring it before the request is
/// sent, the new server claims it and acknowledges, and only then does the
/// old server record the new owner and redirect clients.
#[derive(Debug, Clone)]
pub struct ZoneServer {
    config: ZoneConfig,
    zone: Option<Zone>,
    neighbors: BTreeMap<u32, (Zone, SocketAddr)>,
    last_evaluation: Option<u64>,
}

impl ZoneServer {
    #[must_use]
    pub const fn new(config: ZoneConfig) -> Self {
        Self {
            config,
            zone: None,
            neighbors: BTreeMap::new(),
            last_evaluation: None,
        }
    }

    /// Connects to the zone authority as a peer; the zone arrives once the
    /// link is negotiated.
    pub fn join<T: Transport>(
        &self,
        node: &mut Node<T>,
        authority: SocketAddr,
        payload: &[u8],
    ) -> ZoneResult<()> {
        node.connect_to_peer(authority, payload)?;
        Ok(())
    }

    pub const fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// The zone this server simulates.
    pub const fn zone(&self) -> Option<&Zone> {
        self.zone.as_ref()
    }

    pub fn neighbors(&self) -> impl Iterator<Item = (&Zone, SocketAddr)> {
        self.neighbors.values().map(|(zone, server)| (zone, *server))
    }

    /// Takes zone and neighbors from an authority running in this process.
    pub fn sync_with_authority(&mut self, authority: &ZoneAuthority, local: SocketAddr) {
        self.zone = authority.zone_of(local).copied();
        self.neighbors = authority
            .neighbors_of(local)
            .map(|(zone, server)| (zone.index, (*zone, server)))
            .collect();
    }

    pub fn handle_event<T: Transport>(
        &mut self,
        node: &mut Node<T>,
        event: &NodeEvent,
    ) -> Vec<ZoneEvent> {
        match event {
            NodeEvent::Rpc(call) => match self.handle_call(node, call) {
                Ok(events) => events,
                Err(err) => {
                    log::warn!("dropping '{}' from {}: {err}", call.method, call.source);
                    Vec::new()
                }
            },
            NodeEvent::PeerDisconnected(server)
            | NodeEvent::ConnectionTimedOut(server, ConnectionRole::Peer) => {
                self.forget_server(node, *server)
            }
            _ => Vec::new(),
        }
    }

    fn handle_call<T: Transport>(
        &mut self,
        node: &mut Node<T>,
        call: &RpcCall,
    ) -> ZoneResult<Vec<ZoneEvent>> {
        let method = call.method.as_str();
        if !matches!(
            method,
            ASSIGN | NEIGHBOR | RELEASE | HANDOFF_REQUEST | HANDOFF_ACK | HANDOFF_CANCEL
        ) {
            return Ok(Vec::new());
        }
        let from_peer = node
            .connection(call.source)
            .is_some_and(|connection| connection.role() == ConnectionRole::Peer);
        if !from_peer {
            log::warn!("ignoring '{method}' from non-peer {}", call.source);
            return Ok(Vec::new());
        }

        let mut args = call.args();
        let event = match method {
            ASSIGN => {
                let zone = read_zone(&mut args)?;
                log::info!("simulating {zone}");
                self.zone = Some(zone);
                self.neighbors.remove(&zone.index);
                Some(ZoneEvent::Joined(zone))
            }
            NEIGHBOR => {
                let zone = read_zone(&mut args)?;
                let server = read_address(&mut args)?;
                self.add_neighbor(node, zone, server)
            }
            RELEASE => {
                let index = args.u32()?;
                self.neighbors
                    .remove(&index)
                    .map(|(_, server)| ZoneEvent::NeighborRemoved { index, server })
            }
            HANDOFF_REQUEST => {
                let handoff = Handoff::read(&mut args)?;
                self.claim(node, call.source, &handoff)
            }
            HANDOFF_ACK => {
                let object = ObjectId::new(args.u32()?);
                self.relinquish(node, call.source, object)
            }
            _ => {
                let object = ObjectId::new(args.u32()?);
                Self::withdraw_claim(node, call.source, object)
            }
        };
        Ok(event.into_iter().collect())
    }

    fn add_neighbor<T: Transport>(
        &mut self,
        node: &mut Node<T>,
        zone: Zone,
        server: SocketAddr,
    ) -> Option<ZoneEvent> {
        if server == node.local_addr() {
            return None;
        }
        if node.connection(server).is_none() {
            if let Err(err) = node.connect_to_peer(server, &[]) {
                log::warn!("cannot reach neighbor {server}: {err}");
            }
        }
        log::info!("neighbor {zone} on {server}");
        self.neighbors.insert(zone.index, (zone, server));
        Some(ZoneEvent::NeighborAdded { zone, server })
    }

    fn claim<T: Transport>(
        &self,
        node: &mut Node<T>,
        from: SocketAddr,
        handoff: &Handoff,
    ) -> Option<ZoneEvent> {
        let object = handoff.object;
        let already_local = node
            .objects()
            .get(object)
            .is_some_and(ObjectRecord::is_local);
        if !already_local {
            let mut record = ObjectRecord::new(object, handoff.position, Authority::Local);
            record.controller = handoff.controller;
            record.creator = handoff.creator;
            node.objects_mut().insert(record);
            log::info!("claimed {object} from {from} at {}", handoff.position);
        }
        if let Err(err) = node.send_rpc(
            from,
            HANDOFF_ACK,
            ObjectId::NONE,
            vec![Value::U32(object.raw())],
            Delivery::Reliable,
        ) {
            log::warn!("failed to acknowledge handoff of {object} to {from}: {err}");
        }
        (!already_local).then_some(ZoneEvent::ObjectClaimed { object, from })
    }

    fn relinquish<T: Transport>(
        &self,
        node: &mut Node<T>,
        to: SocketAddr,
        object: ObjectId,
    ) -> Option<ZoneEvent> {
        let authority = node.objects().get(object).map(|record| record.authority);
        match authority {
            Some(Authority::Transferring { to: target, .. }) if target == to => {}
            // A late ack after a rollback still wins: the neighbor already authors it.
            Some(Authority::Local) => log::info!("late handoff ack for {object} from {to}"),
            Some(Authority::Remote(owner)) if owner == to => {
                log::debug!("duplicate handoff ack for {object} from {to}");
                return None;
            }
            // The object went elsewhere or is gone; the sender's claim must not stand.
            _ => {
                log::warn!("stale handoff ack for {object} from {to}, cancelling its claim");
                if let Err(err) = node.send_rpc(
                    to,
                    HANDOFF_CANCEL,
                    ObjectId::NONE,
                    vec![Value::U32(object.raw())],
                    Delivery::Reliable,
                ) {
                    log::warn!("failed to cancel claim of {object} on {to}: {err}");
                }
                return None;
            }
        }
        let record = node.objects_mut().get_mut(object)?;
        record.authority = Authority::Remote(to);
        let mut targets = record.observers.clone();
        targets.extend(record.controller);

        let server = format_address(to);
        for client in targets {
            let is_client = node
                .connection(client)
                .is_some_and(|connection| connection.role() == ConnectionRole::Client);
            if !is_client {
                continue;
            }
            if let Err(err) = node.send_rpc(
                client,
                ADD_TARGET,
                ObjectId::NONE,
                vec![Value::U32(object.raw()), Value::String(server.clone())],
                Delivery::Reliable,
            ) {
                log::warn!("failed to redirect {client} for {object}: {err}");
            }
        }
        log::info!("handed {object} off to {to}");
        Some(ZoneEvent::ObjectHandedOff { object, to })
    }

    fn withdraw_claim<T: Transport>(
        node: &mut Node<T>,
        from: SocketAddr,
        object: ObjectId,
    ) -> Option<ZoneEvent> {
        let claimed = node
            .objects()
            .get(object)
            .is_some_and(ObjectRecord::is_local);
        if !claimed {
            log::debug!("cancel for {object} from {from} with nothing to withdraw");
            return None;
        }
        node.objects_mut().remove(object);
        log::warn!("claim on {object} cancelled by {from}");
        Some(ZoneEvent::ClaimCancelled { object, from })
    }

    fn forget_server<T: Transport>(
        &mut self,
        node: &mut Node<T>,
        server: SocketAddr,
    ) -> Vec<ZoneEvent> {
        let mut events = Vec::new();
        self.neighbors.retain(|&index, (_, addr)| {
            if *addr == server {
                events.push(ZoneEvent::NeighborRemoved { index, server });
                false
            } else {
                true
            }
        });
        for record in node.objects_mut().iter_mut() {
            if matches!(record.authority, Authority::Transferring { to, .. } if to == server) {
                record.authority = Authority::Local;
                log::warn!("handoff of {} aborted, {server} left", record.id);
                events.push(ZoneEvent::HandoffRolledBack { object: record.id });
            }
        }
        events
    }

    /// Resolves stale handoffs and, once per evaluation interval, hands
    /// objects that left this zone to the neighbor now containing them.
    pub fn tick<T: Transport, W: WorldQuery>(
        &mut self,
        node: &mut Node<T>,
        world: &W,
        now: u64,
    ) -> Vec<ZoneEvent> {
        let mut events = self.roll_back_stale(node, now);
        let due = self
            .last_evaluation
            .map_or(true, |last| now.saturating_sub(last) >= self.config.evaluate_interval_ms);
        if due {
            self.last_evaluation = Some(now);
            self.evaluate(node, world, now);
        }
        events
    }

    fn roll_back_stale<T: Transport>(&self, node: &mut Node<T>, now: u64) -> Vec<ZoneEvent> {
        let timeout = self.config.handoff_timeout_ms;
        let mut events = Vec::new();
        for record in node.objects_mut().iter_mut() {
            if let Authority::Transferring { to, since } = record.authority {
                if now.saturating_sub(since) >= timeout {
                    log::warn!("handoff of {} to {to} timed out", record.id);
                    record.authority = Authority::Local;
                    events.push(ZoneEvent::HandoffRolledBack { object: record.id });
                }
            }
        }
        events
    }

    fn evaluate<T: Transport, W: WorldQuery>(&self, node: &mut Node<T>, world: &W, now: u64) {
        let Some(zone) = self.zone else {
            return;
        };
        for object in node.objects().local_ids() {
            let Some(record) = node.objects_mut().get_mut(object) else {
                continue;
            };
            if let Some(position) = world.position(object) {
                record.position = position;
            }
            let position = record.position;
            if !zone.releases(position) {
                continue;
            }
            let Some(server) = self.neighbor_containing(node, position) else {
                continue;
            };
            let Some(record) = node.objects_mut().get_mut(object) else {
                continue;
            };
            let handoff = Handoff {
                object,
                position,
                controller: record.controller,
                creator: record.creator,
            };
            // Authority is dropped before the request leaves.
            record.authority = Authority::Transferring { to: server, since: now };
            match node.send_rpc(
                server,
                HANDOFF_REQUEST,
                ObjectId::NONE,
                handoff.params(),
                Delivery::Reliable,
            ) {
                Ok(()) => log::info!("handing {object} at {position} to {server}"),
                Err(err) => {
                    log::warn!("handoff of {object} to {server} not sent: {err}");
                    if let Some(record) = node.objects_mut().get_mut(object) {
                        record.authority = Authority::Local;
                    }
                }
            }
        }
    }

    fn neighbor_containing<T: Transport>(
        &self,
        node: &Node<T>,
        position: Vec3,
    ) -> Option<SocketAddr> {
        self.neighbors
            .values()
            .find(|(zone, server)| zone.contains(position) && node.is_ready(*server))
            .map(|(_, server)| *server)
    }
}
