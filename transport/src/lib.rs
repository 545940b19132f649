//! Datagram transports for zonal.
//!
//! A [`Transport`] owns one endpoint and moves opaque byte buffers. It never
//! parses payloads and never fails loudly after startup: send and receive
//! errors are logged and reported as `false` or an empty poll.
//!
//! [`UdpTransport`] is the real socket. [`MemoryNetwork`] hands out
//! [`MemoryTransport`]s that exchange datagrams in-process, which keeps
//! multi-node tests deterministic.

mod address;
mod bind;
mod config;
mod error;
mod memory;
mod udp;

use std::net::SocketAddr;

pub use address::{format_address, parse_address};
pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use memory::{MemoryNetwork, MemoryTransport};
pub use udp::UdpTransport;

/// A non-blocking datagram endpoint.
pub trait Transport {
    /// The bound local address.
    fn local_addr(&self) -> SocketAddr;

    /// Drains every queued datagram, in receive order.
    fn poll(&mut self) -> Vec<(SocketAddr, Vec<u8>)>;

    /// Sends one datagram. Returns `false` if the OS rejected it.
    fn send(&mut self, addr: SocketAddr, bytes: &[u8]) -> bool;
}
