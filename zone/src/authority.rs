//! The node owning the zone list and deciding who simulates what.

use std::net::SocketAddr;

use codec::ObjectId;
use net::{ConnectionRole, Delivery, Node, NodeEvent};
use transport::Transport;

use crate::error::{ZoneError, ZoneResult};
use crate::event::ZoneEvent;
use crate::methods::{neighbor_params, zone_params, ASSIGN, NEIGHBOR, RELEASE};
use crate::zone::{Zone, ZoneAssignment};

#[derive(Debug, Clone)]
struct Slot {
    zone: Zone,
    assignment: ZoneAssignment,
}

/// Zone table plus assignment state.
///
/// Every peer that finishes negotiation with the authority receives the
/// lowest-indexed free zone, the list of already assigned zones, and is
/// announced to every other zone server.
#[derive(Debug, Clone)]
pub struct ZoneAuthority {
    slots: Vec<Slot>,
}

impl ZoneAuthority {
    pub fn new(zones: impl IntoIterator<Item = Zone>) -> ZoneResult<Self> {
        let mut slots: Vec<Slot> = zones
            .into_iter()
            .map(|zone| Slot {
                zone,
                assignment: ZoneAssignment::Unassigned,
            })
            .collect();
        slots.sort_by_key(|slot| slot.zone.index);
        if let Some(pair) = slots
            .windows(2)
            .find(|pair| pair[0].zone.index == pair[1].zone.index)
        {
            return Err(ZoneError::DuplicateZone {
                index: pair[0].zone.index,
            });
        }
        Ok(Self { slots })
    }

    /// Zones in index order with their assignment.
    pub fn zones(&self) -> impl Iterator<Item = (&Zone, ZoneAssignment)> {
        self.slots.iter().map(|slot| (&slot.zone, slot.assignment))
    }

    #[must_use]
    pub fn assignment(&self, index: u32) -> Option<ZoneAssignment> {
        self.slot(index).map(|slot| slot.assignment)
    }

    /// The zone `server` simulates.
    #[must_use]
    pub fn zone_of(&self, server: SocketAddr) -> Option<&Zone> {
        self.slots
            .iter()
            .find(|slot| slot.assignment == ZoneAssignment::Assigned(server))
            .map(|slot| &slot.zone)
    }

    /// Assigned zones other than the one `server` holds.
    pub fn neighbors_of(&self, server: SocketAddr) -> impl Iterator<Item = (&Zone, SocketAddr)> {
        self.slots.iter().filter_map(move |slot| match slot.assignment {
            ZoneAssignment::Assigned(addr) if addr != server => Some((&slot.zone, addr)),
            _ => None,
        })
    }

    /// Gives `server` the lowest-indexed free zone. A server already holding a
    /// zone keeps it.
    pub fn assign(&mut self, server: SocketAddr) -> Option<Zone> {
        if let Some(zone) = self.zone_of(server) {
            return Some(*zone);
        }
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.assignment == ZoneAssignment::Unassigned)?;
        slot.assignment = ZoneAssignment::Assigned(server);
        log::info!("assigned {} to {server}", slot.zone);
        Some(slot.zone)
    }

    /// Frees the zone held by `server`.
    pub fn release(&mut self, server: SocketAddr) -> Option<Zone> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.assignment == ZoneAssignment::Assigned(server))?;
        slot.assignment = ZoneAssignment::Unassigned;
        log::info!("released {} from {server}", slot.zone);
        Some(slot.zone)
    }

    fn slot(&self, index: u32) -> Option<&Slot> {
        self.slots
            .binary_search_by_key(&index, |slot| slot.zone.index)
            .ok()
            .map(|position| &self.slots[position])
    }

    /// Reacts to peers joining and leaving.
    pub fn handle_event<T: Transport>(
        &mut self,
        node: &mut Node<T>,
        event: &NodeEvent,
    ) -> Vec<ZoneEvent> {
        match *event {
            NodeEvent::PeerConnected(server) => self
                .on_server_joined(node, server)
                .into_iter()
                .collect(),
            NodeEvent::PeerDisconnected(server)
            | NodeEvent::ConnectionTimedOut(server, ConnectionRole::Peer) => self
                .on_server_left(node, server)
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    fn on_server_joined<T: Transport>(
        &mut self,
        node: &mut Node<T>,
        server: SocketAddr,
    ) -> Option<ZoneEvent> {
        if self.zone_of(server).is_some() {
            return None;
        }
        let Some(zone) = self.assign(server) else {
            log::info!("no free zone for {server}");
            return None;
        };
        let local = node.local_addr();
        send(node, server, ASSIGN, zone_params(&zone));
        let others: Vec<(Zone, SocketAddr)> = self
            .neighbors_of(server)
            .map(|(zone, addr)| (*zone, addr))
            .collect();
        for (other, addr) in others {
            send(node, server, NEIGHBOR, neighbor_params(&other, addr));
            if addr != local {
                send(node, addr, NEIGHBOR, neighbor_params(&zone, server));
            }
        }
        Some(ZoneEvent::ZoneAssigned { zone, server })
    }

    fn on_server_left<T: Transport>(
        &mut self,
        node: &mut Node<T>,
        server: SocketAddr,
    ) -> Option<ZoneEvent> {
        let zone = self.release(server)?;
        let local = node.local_addr();
        let others: Vec<SocketAddr> = self
            .neighbors_of(server)
            .map(|(_, addr)| addr)
            .filter(|addr| *addr != local)
            .collect();
        for addr in others {
            send(node, addr, RELEASE, vec![codec::Value::U32(zone.index)]);
        }
        Some(ZoneEvent::ZoneReleased {
            index: zone.index,
            server,
        })
    }
}

fn send<T: Transport>(
    node: &mut Node<T>,
    to: SocketAddr,
    method: &str,
    params: Vec<codec::Value>,
) {
    if let Err(err) = node.send_rpc(to, method, ObjectId::NONE, params, Delivery::Reliable) {
        log::warn!("failed to send '{method}' to {to}: {err}");
    }
}
