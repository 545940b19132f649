//! Inbound robustness: loss during negotiation and malformed messages.

use std::net::SocketAddr;

use codec::{
    decode_message, encode_message, CodecLimits, Message, MessageHeader, MessageId, ObjectId,
    Signature, TypeRegistry, TypeTag, Value,
};
use net::{Delivery, Node, NodeConfig, NodeEvent};
use rpc::{Command, MethodRegistry, RpcCall};
use transport::{MemoryNetwork, MemoryTransport, Transport, TransportConfig};
use wire::{decode_datagram, encode_datagram, Datagram, Limits};

fn methods() -> MethodRegistry {
    let mut methods = MethodRegistry::new();
    methods
        .register(
            "spawn",
            Signature::new([TypeTag::Connection, TypeTag::String]),
        )
        .unwrap();
    methods
        .register("say", Signature::new([TypeTag::String]))
        .unwrap();
    methods
}

fn node<T: Transport>(transport: T, config: NodeConfig) -> Node<T> {
    let _ = env_logger::builder().is_test(true).try_init();
    Node::new(transport, config, methods(), TypeRegistry::new()).unwrap()
}

fn rpcs(events: &[NodeEvent]) -> Vec<RpcCall> {
    events
        .iter()
        .filter_map(|event| match event {
            NodeEvent::Rpc(call) => Some(call.clone()),
            _ => None,
        })
        .collect()
}

/// Drops the first `RemoteAssignment` for one method name; resends pass.
struct LosesAssignment {
    inner: MemoryTransport,
    name: &'static str,
    dropped: bool,
}

impl LosesAssignment {
    fn new(inner: MemoryTransport, name: &'static str) -> Self {
        Self {
            inner,
            name,
            dropped: false,
        }
    }

    fn assigns(&self, bytes: &[u8]) -> bool {
        let Ok(Datagram::Message { body }) = decode_datagram(bytes, &Limits::default()) else {
            return false;
        };
        let Ok(message) = decode_message(body, &TypeRegistry::new(), &CodecLimits::default())
        else {
            return false;
        };
        matches!(
            Command::parse(message.header.id, &message.params),
            Ok(Command::RemoteAssignment { name, .. }) if name == self.name
        )
    }
}

impl Transport for LosesAssignment {
    fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr()
    }

    fn poll(&mut self) -> Vec<(SocketAddr, Vec<u8>)> {
        self.inner.poll()
    }

    fn send(&mut self, addr: SocketAddr, bytes: &[u8]) -> bool {
        if !self.dropped && self.assigns(bytes) {
            self.dropped = true;
            return true;
        }
        self.inner.send(addr, bytes)
    }
}

#[test]
fn rpc_sent_before_ids_resolve_is_delivered_once_ready() {
    let network = MemoryNetwork::new();
    let lossy = LosesAssignment::new(
        network.bind(None, &TransportConfig::default()).unwrap(),
        "say",
    );
    let mut server = node(lossy, NodeConfig::for_testing().authority());
    let mut client = node(
        network.bind(None, &TransportConfig::default()).unwrap(),
        NodeConfig::for_testing(),
    );
    let server_addr = server.local_addr();
    let client_addr = client.local_addr();

    client.connect(server_addr, b"").unwrap();
    let events = server.tick(0);
    assert!(events.contains(&NodeEvent::ClientConnected(client_addr)));
    server
        .send_rpc(
            client_addr,
            "say",
            ObjectId::NONE,
            vec![Value::from("welcome")],
            Delivery::Reliable,
        )
        .unwrap();

    let events = client.tick(0);
    assert!(rpcs(&events).is_empty());
    assert!(!client.is_ready(server_addr));
    assert_eq!(client.connection(server_addr).unwrap().deferred_len(), 1);

    let mut said = Vec::new();
    for now in (10..=300).step_by(10) {
        server.tick(now);
        said.extend(rpcs(&client.tick(now)));
    }

    assert!(client.is_ready(server_addr));
    assert_eq!(said.len(), 1);
    assert_eq!(said[0].method, "say");
    assert_eq!(said[0].params, vec![Value::from("welcome")]);
    assert_eq!(client.connection(server_addr).unwrap().deferred_len(), 0);
    assert_eq!(server.connection(client_addr).unwrap().unacked_len(), 0);
}

/// A hand-driven client that writes raw datagrams at an authority.
struct RawClient {
    _network: MemoryNetwork,
    server: Node<MemoryTransport>,
    raw: MemoryTransport,
    say: MessageId,
}

impl RawClient {
    fn connect() -> Self {
        let network = MemoryNetwork::new();
        let mut server = node(
            network.bind(None, &TransportConfig::default()).unwrap(),
            NodeConfig::for_testing().authority(),
        );
        let mut raw = network.bind(None, &TransportConfig::default()).unwrap();
        let request =
            encode_datagram(&Datagram::Connect { payload: b"" }, &Limits::for_testing()).unwrap();
        raw.send(server.local_addr(), &request);
        let events = server.tick(0);
        assert!(events.contains(&NodeEvent::ClientConnected(raw.local_addr())));
        let say = server
            .connection(raw.local_addr())
            .and_then(|connection| connection.ids().id("say"))
            .unwrap();
        Self {
            _network: network,
            server,
            raw,
            say,
        }
    }

    fn body(id: MessageId, params: Vec<Value>) -> Vec<u8> {
        let header = MessageHeader {
            id,
            object: ObjectId::NONE,
            sequence: None,
        };
        encode_message(&Message::new(header, params), &TypeRegistry::new()).unwrap()
    }

    fn inject(&mut self, body: &[u8], now: u64) -> Vec<NodeEvent> {
        let datagram =
            encode_datagram(&Datagram::Message { body }, &Limits::for_testing()).unwrap();
        self.raw.send(self.server.local_addr(), &datagram);
        self.server.tick(now)
    }

    fn assert_survives_and_still_dispatches(mut self) {
        let addr = self.raw.local_addr();
        assert!(self
            .server
            .connection(addr)
            .is_some_and(|connection| connection.is_ready()));

        let body = Self::body(self.say, vec![Value::from("hello")]);
        let calls = rpcs(&self.inject(&body, 2));
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "say");
        assert_eq!(calls[0].source, addr);
        assert_eq!(calls[0].params, vec![Value::from("hello")]);
    }
}

#[test]
fn wrong_parameter_types_are_dropped_without_disconnect() {
    let mut client = RawClient::connect();
    let body = RawClient::body(client.say, vec![Value::U32(7)]);

    let events = client.inject(&body, 1);

    assert!(rpcs(&events).is_empty());
    client.assert_survives_and_still_dispatches();
}

#[test]
fn truncated_body_is_dropped_without_disconnect() {
    let mut client = RawClient::connect();
    let body = RawClient::body(client.say, vec![Value::from("a greeting cut short")]);

    let events = client.inject(&body[..body.len() / 2], 1);

    assert!(rpcs(&events).is_empty());
    client.assert_survives_and_still_dispatches();
}

#[test]
fn unassigned_rpc_id_is_dropped_without_disconnect() {
    let mut client = RawClient::connect();
    let unknown = MessageId::new(500);
    assert!(client
        .server
        .connection(client.raw.local_addr())
        .is_some_and(|connection| connection.ids().name(unknown).is_none()));
    let body = RawClient::body(unknown, vec![Value::from("hello")]);

    let events = client.inject(&body, 1);

    assert!(rpcs(&events).is_empty());
    client.assert_survives_and_still_dispatches();
}
