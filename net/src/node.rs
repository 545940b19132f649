//! The tick-driven node.

use std::collections::HashMap;
use std::net::SocketAddr;

use codec::{
    decode_message, encode_message, Message, MessageHeader, MessageId, ObjectId, TypeRegistry,
    Value,
};
use rpc::{prepare_call, resolve_call, Command, GlobalIds, MethodRegistry, RpcCall};
use transport::Transport;
use wire::{decode_datagram, encode_datagram, Datagram};

use crate::config::NodeConfig;
use crate::connection::{
    ConnectKind, Connection, ConnectionRole, PendingConnect, Unacked, MAX_DEFERRED,
};
use crate::error::{NetError, NetResult};
use crate::event::NodeEvent;
use crate::object::ObjectTable;

/// Decides whether an inbound connect request is admitted.
pub type Approval = Box<dyn FnMut(SocketAddr, &[u8]) -> bool>;

/// Delivery guarantee for an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Resent until acknowledged or the resend budget runs out.
    Reliable,
    /// Sent once.
    Unreliable,
}

/// One endpoint of the network: a transport plus every connection on it.
///
/// Nothing happens between calls to [`tick`](Self::tick). The host drives
/// the node with a monotonic millisecond clock.
pub struct Node<T: Transport> {
    transport: T,
    config: NodeConfig,
    methods: MethodRegistry,
    types: TypeRegistry,
    global_ids: Option<GlobalIds>,
    connections: HashMap<SocketAddr, Connection>,
    pending: HashMap<SocketAddr, PendingConnect>,
    client_approval: Approval,
    peer_approval: Approval,
    objects: ObjectTable,
    events: Vec<NodeEvent>,
    now: u64,
}

impl<T: Transport> Node<T> {
    /// Creates a node. Both approval callbacks start out accepting everyone.
    pub fn new(
        transport: T,
        config: NodeConfig,
        methods: MethodRegistry,
        types: TypeRegistry,
    ) -> NetResult<Self> {
        let global_ids = if config.protocol_authority {
            Some(GlobalIds::from_registry(&methods)?)
        } else {
            None
        };
        log::info!(
            "node on {} ({} methods, authority: {})",
            transport.local_addr(),
            methods.len(),
            config.protocol_authority
        );
        Ok(Self {
            objects: ObjectTable::new(config.object_id_base),
            transport,
            config,
            methods,
            types,
            global_ids,
            connections: HashMap::new(),
            pending: HashMap::new(),
            client_approval: Box::new(|_, _| true),
            peer_approval: Box::new(|_, _| true),
            events: Vec::new(),
            now: 0,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    pub const fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub const fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// Binds a handler to an already registered method.
    pub fn set_handler(
        &mut self,
        method: &str,
        handler: impl FnMut(&RpcCall) + 'static,
    ) -> NetResult<()> {
        Ok(self.methods.set_handler(method, handler)?)
    }

    pub const fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub const fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut ObjectTable {
        &mut self.objects
    }

    /// Timestamp of the last tick.
    pub const fn now(&self) -> u64 {
        self.now
    }

    pub fn set_client_approval(
        &mut self,
        approval: impl FnMut(SocketAddr, &[u8]) -> bool + 'static,
    ) {
        self.client_approval = Box::new(approval);
    }

    pub fn set_peer_approval(
        &mut self,
        approval: impl FnMut(SocketAddr, &[u8]) -> bool + 'static,
    ) {
        self.peer_approval = Box::new(approval);
    }

    pub fn connection(&self, addr: SocketAddr) -> Option<&Connection> {
        self.connections.get(&addr)
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// `true` if the connection exists and finished negotiation.
    pub fn is_ready(&self, addr: SocketAddr) -> bool {
        self.connections.get(&addr).is_some_and(Connection::is_ready)
    }

    /// `true` while an outbound connect to `addr` is waiting for an answer.
    pub fn is_connecting(&self, addr: SocketAddr) -> bool {
        self.pending.contains_key(&addr)
    }

    /// Starts a client handshake with a server.
    pub fn connect(&mut self, addr: SocketAddr, payload: &[u8]) -> NetResult<()> {
        self.start_connect(addr, payload, ConnectKind::Client)
    }

    /// Starts a peer handshake with another server.
    pub fn connect_to_peer(&mut self, addr: SocketAddr, payload: &[u8]) -> NetResult<()> {
        self.start_connect(addr, payload, ConnectKind::Peer)
    }

    fn start_connect(
        &mut self,
        addr: SocketAddr,
        payload: &[u8],
        kind: ConnectKind,
    ) -> NetResult<()> {
        if self.connections.contains_key(&addr) || self.pending.contains_key(&addr) {
            log::debug!("connect to {addr} ignored, already connected or connecting");
            return Ok(());
        }
        let datagram = match kind {
            ConnectKind::Client => Datagram::Connect { payload },
            ConnectKind::Peer => Datagram::ConnectToPeer { payload },
        };
        let datagram = encode_datagram(&datagram, &self.config.wire_limits)?;
        self.transport.send(addr, &datagram);
        log::info!("connecting to {addr} as {kind:?}");
        self.pending.insert(
            addr,
            PendingConnect {
                kind,
                datagram,
                sent_at: self.now,
                retries_left: self.config.connect_retries,
            },
        );
        Ok(())
    }

    /// Abandons an outbound attempt without firing any event.
    pub fn cancel_connect(&mut self, addr: SocketAddr) -> bool {
        self.pending.remove(&addr).is_some()
    }

    /// Closes a connection, tells the remote, and fires the disconnect event.
    pub fn disconnect(&mut self, addr: SocketAddr) -> bool {
        let Some(connection) = self.connections.remove(&addr) else {
            return false;
        };
        self.send_control(addr, &Datagram::Disconnect);
        self.objects.forget_connection(addr);
        log::info!("disconnected {} {addr}", connection.role());
        self.events
            .push(NodeEvent::disconnected(addr, connection.role()));
        true
    }

    /// Sends an RPC on a ready connection.
    ///
    /// `params` are the wire parameters only: connection slots of the
    /// method's signature are left out.
    pub fn send_rpc(
        &mut self,
        addr: SocketAddr,
        method: &str,
        object: ObjectId,
        params: Vec<Value>,
        delivery: Delivery,
    ) -> NetResult<()> {
        let connection = self
            .connections
            .get(&addr)
            .ok_or(NetError::NotConnected { addr })?;
        if !connection.is_ready() {
            return Err(NetError::NotReady { addr });
        }
        let id = prepare_call(&self.methods, connection.ids(), method, &params)?;
        self.send_message(addr, id, object, params, delivery)
    }

    /// Sends an RPC to every ready connection with the given role.
    pub fn broadcast_rpc(
        &mut self,
        role: ConnectionRole,
        method: &str,
        object: ObjectId,
        params: &[Value],
        delivery: Delivery,
    ) -> usize {
        let targets: Vec<SocketAddr> = self
            .connections
            .values()
            .filter(|connection| connection.role() == role && connection.is_ready())
            .map(Connection::addr)
            .collect();
        let mut sent = 0;
        for addr in targets {
            match self.send_rpc(addr, method, object, params.to_vec(), delivery) {
                Ok(()) => sent += 1,
                Err(err) => log::warn!("broadcast of '{method}' to {addr} failed: {err}"),
            }
        }
        sent
    }

    /// Runs one receive phase and one end-of-frame phase.
    pub fn tick(&mut self, now: u64) -> Vec<NodeEvent> {
        self.now = self.now.max(now);
        for (from, bytes) in self.transport.poll() {
            self.handle_datagram(from, &bytes);
        }
        self.retry_connects();
        self.expire_connections();
        self.resend_unacked();
        self.send_heartbeats();
        std::mem::take(&mut self.events)
    }

    fn handle_datagram(&mut self, from: SocketAddr, bytes: &[u8]) {
        let datagram = match decode_datagram(bytes, &self.config.wire_limits) {
            Ok(datagram) => datagram,
            Err(err) => {
                log::warn!("dropping datagram from {from}: {err}");
                return;
            }
        };
        match datagram {
            Datagram::Connect { payload } => self.handle_inbound(from, payload, ConnectKind::Client),
            Datagram::ConnectToPeer { payload } => {
                self.handle_inbound(from, payload, ConnectKind::Peer);
            }
            Datagram::Accepted => self.handle_accepted(from),
            Datagram::Refuse => {
                if self.pending.remove(&from).is_some() {
                    log::info!("{from} refused the connection");
                    self.events.push(NodeEvent::ConnectionRefused(from));
                }
            }
            Datagram::Disconnect => {
                if let Some(connection) = self.connections.remove(&from) {
                    log::info!("{} {from} disconnected", connection.role());
                    self.objects.forget_connection(from);
                    self.events
                        .push(NodeEvent::disconnected(from, connection.role()));
                }
            }
            Datagram::Message { body } => self.handle_message(from, body),
        }
    }

    fn handle_inbound(&mut self, from: SocketAddr, payload: &[u8], kind: ConnectKind) {
        if let Some(connection) = self.connections.get_mut(&from) {
            // Our accept was lost; answer again.
            connection.last_activity = self.now;
            self.send_control(from, &Datagram::Accepted);
            return;
        }
        if self.connections.len() >= self.config.max_connections {
            log::info!(
                "refusing {from}: connection limit {} reached",
                self.config.max_connections
            );
            self.send_control(from, &Datagram::Refuse);
            return;
        }
        let approved = match kind {
            ConnectKind::Client => (self.client_approval)(from, payload),
            ConnectKind::Peer => (self.peer_approval)(from, payload),
        };
        if !approved {
            log::info!("refusing {from}: not approved");
            self.send_control(from, &Datagram::Refuse);
            return;
        }
        if self.pending.remove(&from).is_some() {
            log::debug!("inbound request from {from} supersedes our pending connect");
        }
        self.send_control(from, &Datagram::Accepted);
        self.establish(from, kind.inbound_role());
    }

    fn handle_accepted(&mut self, from: SocketAddr) {
        if let Some(connection) = self.connections.get_mut(&from) {
            connection.last_activity = self.now;
            return;
        }
        let Some(pending) = self.pending.remove(&from) else {
            log::debug!("unsolicited accept from {from}");
            return;
        };
        self.establish(from, pending.kind.outbound_role());
    }

    fn establish(&mut self, addr: SocketAddr, role: ConnectionRole) {
        log::info!("established {role} connection with {addr}");
        let mut connection = Connection::new(addr, role, self.now);
        let commands = connection
            .negotiation
            .start(&self.methods, self.global_ids.as_ref());
        let ready = connection.is_ready();
        self.connections.insert(addr, connection);
        for command in commands {
            self.send_command(addr, &command);
        }
        if ready {
            self.events.push(NodeEvent::connected(addr, role));
        }
    }

    fn handle_message(&mut self, from: SocketAddr, body: &[u8]) {
        if !self.connections.contains_key(&from) {
            // Traffic from a server we are connecting to means our accept was lost.
            let Some(pending) = self.pending.remove(&from) else {
                log::debug!("message from unknown address {from}");
                return;
            };
            self.establish(from, pending.kind.outbound_role());
        }
        let Some(connection) = self.connections.get_mut(&from) else {
            return;
        };
        connection.last_activity = self.now;
        let message = match decode_message(body, &self.types, &self.config.codec_limits) {
            Ok(message) => message,
            Err(err) => {
                log::warn!("dropping malformed message from {from}: {err}");
                return;
            }
        };
        let id = message.header.id;
        let ready = connection.is_ready();
        if !id.is_command() && !ready && connection.deferred.len() >= MAX_DEFERRED {
            // Left unacked so the sender resends once negotiation catches up.
            log::warn!("deferred rpcs from {from} at capacity, dropping id {}", id.raw());
            return;
        }
        if let Some(sequence) = message.header.sequence {
            let fresh = connection.accept_sequence(sequence);
            self.send_command(from, &Command::Ack { sequence });
            if !fresh {
                return;
            }
        }
        if id.is_command() {
            match Command::parse(id, &message.params) {
                Ok(command) => self.handle_command(from, command),
                Err(err) => log::warn!("dropping command from {from}: {err}"),
            }
        } else if ready {
            self.handle_rpc(from, message);
        } else if let Some(connection) = self.connections.get_mut(&from) {
            log::debug!("deferring rpc id {} from {from} until ids resolve", id.raw());
            connection.deferred.push(message);
        }
    }

    fn handle_command(&mut self, from: SocketAddr, command: Command) {
        let Some(connection) = self.connections.get_mut(&from) else {
            return;
        };
        match command {
            Command::Ack { sequence } => {
                connection.unacked.remove(&sequence);
            }
            Command::Heartbeat => {}
            command => {
                let was_ready = connection.is_ready();
                let replies = connection.negotiation.handle(
                    command,
                    &self.methods,
                    self.global_ids.as_mut(),
                );
                let role = connection.role();
                let now_ready = connection.is_ready();
                for reply in replies {
                    self.send_command(from, &reply);
                }
                if !was_ready && now_ready {
                    self.events.push(NodeEvent::connected(from, role));
                    self.replay_deferred(from);
                }
            }
        }
    }

    fn replay_deferred(&mut self, from: SocketAddr) {
        let deferred = match self.connections.get_mut(&from) {
            Some(connection) => std::mem::take(&mut connection.deferred),
            None => return,
        };
        for message in deferred {
            self.handle_rpc(from, message);
        }
    }

    fn handle_rpc(&mut self, from: SocketAddr, message: Message) {
        let Some(connection) = self.connections.get(&from) else {
            return;
        };
        let role = connection.role();
        let call = match resolve_call(&self.methods, connection.ids(), from, message) {
            Ok(call) => call,
            Err(err) => {
                log::warn!("dropping rpc from {from}: {err}");
                return;
            }
        };
        if !call.object.is_none() {
            let allowed = self
                .objects
                .get(call.object)
                .is_some_and(|record| record.authorizes(from, role));
            if !allowed {
                log::warn!(
                    "rejected '{}' on {} from {role} {from}: not authorized",
                    call.method,
                    call.object
                );
                return;
            }
        }
        if !self.methods.invoke(&call) {
            self.events.push(NodeEvent::Rpc(call));
        }
    }

    fn retry_connects(&mut self) {
        let now = self.now;
        let timeout = self.config.connect_timeout_ms;
        let mut failed = Vec::new();
        for (addr, pending) in &mut self.pending {
            if now.saturating_sub(pending.sent_at) < timeout {
                continue;
            }
            if pending.retries_left == 0 {
                failed.push(*addr);
                continue;
            }
            pending.retries_left -= 1;
            log::debug!(
                "retrying connect to {addr}, {} retries left",
                pending.retries_left
            );
            pending.sent_at = now;
            self.transport.send(*addr, &pending.datagram);
        }
        for addr in failed {
            self.pending.remove(&addr);
            log::info!("connect to {addr} failed: no response");
            self.events.push(NodeEvent::ConnectionFailed(addr));
        }
    }

    fn expire_connections(&mut self) {
        let now = self.now;
        let window = self.config.liveness_timeout_ms;
        let expired: Vec<SocketAddr> = self
            .connections
            .values()
            .filter(|connection| now.saturating_sub(connection.last_activity) > window)
            .map(Connection::addr)
            .collect();
        for addr in expired {
            if let Some(connection) = self.connections.remove(&addr) {
                log::info!("{} {addr} timed out", connection.role());
                self.objects.forget_connection(addr);
                self.events
                    .push(NodeEvent::ConnectionTimedOut(addr, connection.role()));
            }
        }
    }

    fn resend_unacked(&mut self) {
        let now = self.now;
        let interval = self.config.resend_interval_ms;
        let max_resends = self.config.max_resends;
        for connection in self.connections.values_mut() {
            let addr = connection.addr();
            let mut sent_any = false;
            connection.unacked.retain(|sequence, unacked| {
                if now.saturating_sub(unacked.last_sent) < interval {
                    return true;
                }
                if unacked.resends >= max_resends {
                    log::warn!("giving up on reliable message {sequence} to {addr}");
                    return false;
                }
                unacked.resends += 1;
                unacked.last_sent = now;
                self.transport.send(addr, &unacked.datagram);
                sent_any = true;
                true
            });
            if sent_any {
                connection.last_send = now;
            }
        }
    }

    fn send_heartbeats(&mut self) {
        let now = self.now;
        let interval = self.config.heartbeat_interval_ms;
        let idle: Vec<SocketAddr> = self
            .connections
            .values()
            .filter(|connection| now.saturating_sub(connection.last_send) >= interval)
            .map(Connection::addr)
            .collect();
        for addr in idle {
            self.send_command(addr, &Command::Heartbeat);
        }
    }

    fn send_command(&mut self, addr: SocketAddr, command: &Command) {
        let delivery = if command.is_reliable() {
            Delivery::Reliable
        } else {
            Delivery::Unreliable
        };
        let params = command.params();
        if let Err(err) = self.send_message(addr, command.id(), ObjectId::NONE, params, delivery) {
            log::warn!("failed to send {:?} to {addr}: {err}", command.kind());
        }
    }

    fn send_message(
        &mut self,
        addr: SocketAddr,
        id: MessageId,
        object: ObjectId,
        params: Vec<Value>,
        delivery: Delivery,
    ) -> NetResult<()> {
        let connection = self
            .connections
            .get_mut(&addr)
            .ok_or(NetError::NotConnected { addr })?;
        let sequence = (delivery == Delivery::Reliable).then(|| connection.take_sequence());
        let message = Message::new(
            MessageHeader {
                id,
                object,
                sequence,
            },
            params,
        );
        let body = encode_message(&message, &self.types)?;
        let datagram =
            encode_datagram(&Datagram::Message { body: &body }, &self.config.wire_limits)?;
        connection.last_send = self.now;
        let sent = self.transport.send(addr, &datagram);
        match sequence {
            Some(sequence) => {
                connection.unacked.insert(
                    sequence,
                    Unacked {
                        datagram,
                        last_sent: self.now,
                        resends: 0,
                    },
                );
                Ok(())
            }
            None if sent => Ok(()),
            None => Err(NetError::SendFailed { addr }),
        }
    }

    fn send_control(&mut self, addr: SocketAddr, datagram: &Datagram<'_>) {
        match encode_datagram(datagram, &self.config.wire_limits) {
            Ok(bytes) => {
                self.transport.send(addr, &bytes);
            }
            Err(err) => log::warn!("failed to frame control datagram for {addr}: {err}"),
        }
    }
}
