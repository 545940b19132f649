//! Non-blocking UDP endpoint.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use crate::bind::bind_with_fallback;
use crate::config::TransportConfig;
use crate::error::{TransportError, TransportResult};
use crate::Transport;

/// A single non-blocking UDP socket.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    recv_buf: Vec<u8>,
}

impl UdpTransport {
    /// Binds `address`, or an OS-chosen port on all interfaces when `None`.
    ///
    /// If the port is taken the next one is tried, up to
    /// [`TransportConfig::max_bind_attempts`] ports in total.
    pub fn start(address: Option<SocketAddr>, config: &TransportConfig) -> TransportResult<Self> {
        let requested =
            address.unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)));
        let socket = bind_with_fallback(requested, config.max_bind_attempts, UdpSocket::bind)?;
        socket
            .set_nonblocking(true)
            .map_err(TransportError::Configure)?;
        let local_addr = socket.local_addr().map_err(TransportError::Configure)?;
        log::info!("udp transport listening on {local_addr}");
        Ok(Self {
            socket,
            local_addr,
            recv_buf: vec![0; config.recv_buffer_bytes.max(1)],
        })
    }
}

impl Transport for UdpTransport {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn poll(&mut self) -> Vec<(SocketAddr, Vec<u8>)> {
        let mut received = Vec::new();
        loop {
            match self.socket.recv_from(&mut self.recv_buf) {
                Ok((len, from)) => received.push((from, self.recv_buf[..len].to_vec())),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) if is_port_unreachable(&err) => {
                    // ICMP port-unreachable from an earlier send.
                    log::debug!("ignoring receive error on {}: {err}", self.local_addr);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    log::warn!("receive failed on {}: {err}", self.local_addr);
                    break;
                }
            }
        }
        received
    }

    fn send(&mut self, addr: SocketAddr, bytes: &[u8]) -> bool {
        match self.socket.send_to(bytes, addr) {
            Ok(sent) if sent == bytes.len() => true,
            Ok(sent) => {
                log::warn!("short send to {addr}: {sent} of {} bytes", bytes.len());
                false
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                log::debug!("send to {addr} would block, dropping datagram");
                false
            }
            Err(err) => {
                log::warn!("send to {addr} failed: {err}");
                false
            }
        }
    }
}

fn is_port_unreachable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused
    )
}
