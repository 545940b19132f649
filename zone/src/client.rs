//! Client-side routing of object RPCs to the server that owns each object.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use codec::{ObjectId, Value};
use net::{ConnectionRole, Delivery, Node, NodeEvent};
use rpc::RpcCall;
use transport::Transport;

use crate::error::{ZoneError, ZoneResult};
use crate::event::ZoneEvent;
use crate::methods::{read_address, ADD_TARGET};

/// Tracks which server to talk to for each controlled object.
///
/// A client may stay connected to several zone servers at once; only the
/// target of an object receives its controller RPCs.
#[derive(Debug, Clone, Default)]
pub struct ZoneClient {
    targets: BTreeMap<ObjectId, SocketAddr>,
    payload: Vec<u8>,
}

impl ZoneClient {
    /// `payload` is presented to servers this client connects to on a redirect.
    #[must_use]
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            targets: BTreeMap::new(),
            payload: payload.into(),
        }
    }

    pub fn set_target(&mut self, object: ObjectId, server: SocketAddr) {
        self.targets.insert(object, server);
    }

    #[must_use]
    pub fn target(&self, object: ObjectId) -> Option<SocketAddr> {
        self.targets.get(&object).copied()
    }

    pub fn targets(&self) -> impl Iterator<Item = (ObjectId, SocketAddr)> + '_ {
        self.targets.iter().map(|(object, server)| (*object, *server))
    }

    pub fn handle_event<T: Transport>(
        &mut self,
        node: &mut Node<T>,
        event: &NodeEvent,
    ) -> Option<ZoneEvent> {
        match event {
            NodeEvent::Rpc(call) if call.method == ADD_TARGET => {
                let from_server = node
                    .connection(call.source)
                    .is_some_and(|connection| connection.role() == ConnectionRole::Server);
                if !from_server {
                    log::warn!("ignoring '{ADD_TARGET}' from non-server {}", call.source);
                    return None;
                }
                match read_target(call) {
                    Ok((object, server)) => Some(self.add_target(node, object, server)),
                    Err(err) => {
                        log::warn!("dropping '{ADD_TARGET}' from {}: {err}", call.source);
                        None
                    }
                }
            }
            NodeEvent::DisconnectedFromServer(server)
            | NodeEvent::ConnectionTimedOut(server, ConnectionRole::Server) => {
                self.targets.retain(|_, target| target != server);
                None
            }
            _ => None,
        }
    }

    fn add_target<T: Transport>(
        &mut self,
        node: &mut Node<T>,
        object: ObjectId,
        server: SocketAddr,
    ) -> ZoneEvent {
        if node.connection(server).is_none() && !node.is_connecting(server) {
            if let Err(err) = node.connect(server, &self.payload) {
                log::warn!("cannot connect to new target {server}: {err}");
            }
        }
        log::info!("{object} is now served by {server}");
        self.targets.insert(object, server);
        ZoneEvent::TargetAdded { object, server }
    }

    /// Sends an object RPC to the object's current target.
    pub fn send_to_object<T: Transport>(
        &self,
        node: &mut Node<T>,
        method: &str,
        object: ObjectId,
        params: Vec<Value>,
        delivery: Delivery,
    ) -> ZoneResult<()> {
        let server = self.target(object).ok_or(ZoneError::NoTarget { object })?;
        node.send_rpc(server, method, object, params, delivery)?;
        Ok(())
    }
}

fn read_target(call: &RpcCall) -> ZoneResult<(ObjectId, SocketAddr)> {
    let mut args = call.args();
    let object = ObjectId::new(args.u32()?);
    Ok((object, read_address(&mut args)?))
}
