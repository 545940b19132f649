//! Per-role node drivers shared by the in-memory scenario and `serve`.

use std::net::SocketAddr;

use anyhow::Result;
use codec::{ObjectId, Value, Vec3};
use net::{Delivery, Node, NodeEvent};
use scope::{Relationship, ScopeReceiver, ScopeReplicator, ScopeStats, ViewEvent};
use serde::Serialize;
use transport::Transport;
use zone::{ZoneAuthority, ZoneClient, ZoneEvent, ZoneServer};

use crate::config::SimConfig;
use crate::world::{Sightings, WalkerWriter, Walkers, SPAWN};

/// Running totals of everything the hosts did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Tally {
    pub zones_assigned: u32,
    pub handoffs: u32,
    pub rollbacks: u32,
    pub targets_added: u32,
    pub scope: ScopeStats,
    pub views_received: u32,
    pub views_destroyed: u32,
}

impl Tally {
    fn zone(&mut self, events: impl IntoIterator<Item = ZoneEvent>) {
        for event in events {
            log::debug!("{event:?}");
            match event {
                ZoneEvent::ZoneAssigned { .. } => self.zones_assigned += 1,
                ZoneEvent::ObjectHandedOff { .. } => self.handoffs += 1,
                ZoneEvent::HandoffRolledBack { .. } => self.rollbacks += 1,
                ZoneEvent::TargetAdded { .. } => self.targets_added += 1,
                _ => {}
            }
        }
    }

    fn scope(&mut self, stats: ScopeStats) {
        self.scope.instantiated += stats.instantiated;
        self.scope.synced += stats.synced;
        self.scope.destroyed += stats.destroyed;
    }

    fn view(&mut self, event: &ViewEvent) {
        match event {
            ViewEvent::Instantiated { .. } => self.views_received += 1,
            ViewEvent::Destroyed { .. } => self.views_destroyed += 1,
            ViewEvent::Synced { .. } => {}
        }
    }
}

/// A zone server, optionally also the zone authority.
pub struct ServerHost<T: Transport> {
    pub node: Node<T>,
    pub authority: Option<ZoneAuthority>,
    pub zone: ZoneServer,
    pub scope: ScopeReplicator,
}

impl<T: Transport> ServerHost<T> {
    /// Builds the authority host and assigns itself zone 0.
    pub fn authority(node: Node<T>, config: &SimConfig) -> Result<Self> {
        let mut authority = ZoneAuthority::new(config.layout.zones())?;
        let local = node.local_addr();
        if let Some(zone) = authority.assign(local) {
            log::info!("authority {local} simulates {zone}");
        }
        let mut zone = ZoneServer::new(config.zone);
        zone.sync_with_authority(&authority, local);
        Ok(Self {
            node,
            authority: Some(authority),
            zone,
            scope: ScopeReplicator::new(config.scope),
        })
    }

    /// Builds a zone server and starts joining `authority`.
    pub fn joining(mut node: Node<T>, config: &SimConfig, authority: SocketAddr) -> Result<Self> {
        let zone = ZoneServer::new(config.zone);
        zone.join(&mut node, authority, b"zone-server")?;
        Ok(Self {
            node,
            authority: None,
            zone,
            scope: ScopeReplicator::new(config.scope),
        })
    }

    pub fn step(&mut self, world: &mut Walkers, now: u64, tally: &mut Tally) {
        for event in self.node.tick(now) {
            world.handle_spawn(&mut self.node, &event);
            if let Some(authority) = self.authority.as_mut() {
                tally.zone(authority.handle_event(&mut self.node, &event));
            }
            let events = self.zone.handle_event(&mut self.node, &event);
            for event in &events {
                if let ZoneEvent::ObjectClaimed { object, .. } = event {
                    if let Some(record) = self.node.objects().get(*object) {
                        world.adopt(*object, record.position);
                    }
                }
            }
            tally.zone(events);
        }
        if let Some(authority) = &self.authority {
            self.zone.sync_with_authority(authority, self.node.local_addr());
        }
        let world: &Walkers = world;
        tally.zone(self.zone.tick(&mut self.node, world, now));
        let stats = self
            .scope
            .tick(&mut self.node, world, &mut WalkerWriter(world), now);
        tally.scope(stats);
    }

    /// Whether this server currently authors `object`.
    pub fn authors(&self, object: ObjectId) -> bool {
        self.node
            .objects()
            .get(object)
            .is_some_and(net::ObjectRecord::is_local)
    }
}

/// A player: spawns one walker on its first server and follows it.
pub struct ClientHost<T: Transport> {
    pub node: Node<T>,
    pub zone: ZoneClient,
    pub receiver: ScopeReceiver,
    pub sightings: Sightings,
    pub servers: Vec<SocketAddr>,
    name: String,
    start: Vec3,
    spawned: bool,
}

impl<T: Transport> ClientHost<T> {
    pub fn new(mut node: Node<T>, server: SocketAddr, name: &str, start: Vec3) -> Result<Self> {
        let payload = name.as_bytes().to_vec();
        node.connect(server, &payload)?;
        Ok(Self {
            node,
            zone: ZoneClient::new(payload),
            receiver: ScopeReceiver::new(),
            sightings: Sightings::default(),
            servers: Vec::new(),
            name: name.to_owned(),
            start,
            spawned: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step(&mut self, now: u64, tally: &mut Tally) -> Result<()> {
        for event in self.node.tick(now) {
            match &event {
                NodeEvent::ConnectedToServer(server) => {
                    self.servers.push(*server);
                    if !self.spawned {
                        self.node.send_rpc(
                            *server,
                            SPAWN,
                            ObjectId::NONE,
                            vec![Value::Vec3(self.start), Value::from(self.name.as_str())],
                            Delivery::Reliable,
                        )?;
                        self.spawned = true;
                    }
                }
                NodeEvent::ConnectionRefused(server) | NodeEvent::ConnectionFailed(server) => {
                    log::warn!("{} could not reach {server}", self.name);
                }
                _ => {}
            }
            if let Some(event) = self.zone.handle_event(&mut self.node, &event) {
                tally.zone([event]);
            }
            let view = self
                .receiver
                .handle_event(&mut self.node, &mut self.sightings, &event);
            if let Some(view) = view {
                if let ViewEvent::Instantiated {
                    object,
                    relationship: Relationship::Creator,
                    server,
                } = view
                {
                    if self.zone.target(object).is_none() {
                        self.zone.set_target(object, server);
                    }
                }
                tally.view(&view);
            }
        }
        Ok(())
    }
}
