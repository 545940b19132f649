//! Client (or peer) side: applies view messages from servers.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use bitstream::BitReader;
use codec::{ObjectId, Vec3};
use net::{Authority, ConnectionRole, Node, NodeEvent, ObjectRecord};
use rpc::RpcCall;
use transport::Transport;

use crate::error::{ScopeError, ScopeResult};
use crate::methods::{DESTROY, INSTANTIATE, SYNC};
use crate::relationship::Relationship;
use crate::view::{read_instantiate, ViewReader};

/// A view change applied by [`ScopeReceiver::handle_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    Instantiated {
        object: ObjectId,
        relationship: Relationship,
        server: SocketAddr,
    },
    Synced { object: ObjectId },
    Destroyed { object: ObjectId },
}

/// Tracks remote views and which server feeds each one.
///
/// Only the server that last instantiated a view may sync or destroy it, so
/// stale traffic from a previous owner is ignored after a handoff. Remote
/// views are mirrored into the node's object table as
/// [`Authority::Remote`] records.
#[derive(Debug, Clone, Default)]
pub struct ScopeReceiver {
    views: BTreeMap<ObjectId, SocketAddr>,
}

impl ScopeReceiver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Server currently feeding the view of `object`.
    #[must_use]
    pub fn source(&self, object: ObjectId) -> Option<SocketAddr> {
        self.views.get(&object).copied()
    }

    pub fn views(&self) -> impl Iterator<Item = (ObjectId, SocketAddr)> + '_ {
        self.views.iter().map(|(object, server)| (*object, *server))
    }

    pub fn handle_event<T: Transport, R: ViewReader>(
        &mut self,
        node: &mut Node<T>,
        reader: &mut R,
        event: &NodeEvent,
    ) -> Option<ViewEvent> {
        match event {
            NodeEvent::Rpc(call) if matches!(call.method.as_str(), INSTANTIATE | SYNC | DESTROY) => {
                let from_server = node.connection(call.source).is_some_and(|connection| {
                    matches!(
                        connection.role(),
                        ConnectionRole::Server | ConnectionRole::Peer
                    )
                });
                if !from_server {
                    log::warn!("ignoring '{}' from client {}", call.method, call.source);
                    return None;
                }
                match self.apply(node, reader, call) {
                    Ok(event) => event,
                    Err(err) => {
                        log::warn!("dropping '{}' from {}: {err}", call.method, call.source);
                        None
                    }
                }
            }
            NodeEvent::DisconnectedFromServer(server)
            | NodeEvent::PeerDisconnected(server)
            | NodeEvent::ConnectionTimedOut(server, _) => {
                self.drop_server(node, reader, *server);
                None
            }
            _ => None,
        }
    }

    fn apply<T: Transport, R: ViewReader>(
        &mut self,
        node: &mut Node<T>,
        reader: &mut R,
        call: &RpcCall,
    ) -> ScopeResult<Option<ViewEvent>> {
        let server = call.source;
        let mut args = call.args();
        let object = ObjectId::new(args.u32()?);
        match call.method.as_str() {
            INSTANTIATE => {
                let code = args.u8()?;
                let relationship =
                    Relationship::from_code(code).ok_or(ScopeError::UnknownRelationship { code })?;
                let position = args.vec3()?;
                read_instantiate(reader, relationship, object, position, args.bytes()?)?;
                self.views.insert(object, server);
                mirror(node, object, position, server);
                Ok(Some(ViewEvent::Instantiated {
                    object,
                    relationship,
                    server,
                }))
            }
            SYNC => {
                if self.source(object) != Some(server) {
                    log::debug!("stale sync of {object} from {server}");
                    return Ok(None);
                }
                let position = args.vec3()?;
                reader.sync(object, position, &mut BitReader::new(args.bytes()?))?;
                mirror(node, object, position, server);
                Ok(Some(ViewEvent::Synced { object }))
            }
            _ => {
                if self.source(object) != Some(server) {
                    log::debug!("stale destroy of {object} from {server}");
                    return Ok(None);
                }
                self.views.remove(&object);
                reader.destroy(object);
                unmirror(node, object, server);
                Ok(Some(ViewEvent::Destroyed { object }))
            }
        }
    }

    fn drop_server<T: Transport, R: ViewReader>(
        &mut self,
        node: &mut Node<T>,
        reader: &mut R,
        server: SocketAddr,
    ) {
        let objects: Vec<ObjectId> = self
            .views
            .iter()
            .filter(|(_, source)| **source == server)
            .map(|(object, _)| *object)
            .collect();
        for object in objects {
            self.views.remove(&object);
            reader.destroy(object);
            unmirror(node, object, server);
        }
    }
}

/// Records the view in the object table unless this node authors the object.
fn mirror<T: Transport>(node: &mut Node<T>, object: ObjectId, position: Vec3, server: SocketAddr) {
    match node.objects_mut().get_mut(object) {
        Some(record) if record.is_local() => {}
        Some(record) => {
            record.position = position;
            record.authority = Authority::Remote(server);
        }
        None => {
            node.objects_mut().insert(ObjectRecord::new(
                object,
                position,
                Authority::Remote(server),
            ));
        }
    }
}

fn unmirror<T: Transport>(node: &mut Node<T>, object: ObjectId, server: SocketAddr) {
    let mirrored = node
        .objects()
        .get(object)
        .is_some_and(|record| record.authority == Authority::Remote(server));
    if mirrored {
        node.objects_mut().remove(object);
    }
}
