//! In-process datagram network for deterministic tests and demos.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::rc::Rc;

use crate::bind::bind_with_fallback;
use crate::config::TransportConfig;
use crate::error::TransportResult;
use crate::Transport;

type Inbox = VecDeque<(SocketAddr, Vec<u8>)>;

#[derive(Debug)]
struct NetworkState {
    inboxes: HashMap<SocketAddr, Inbox>,
    dropped: HashSet<SocketAddr>,
    sent: HashMap<SocketAddr, usize>,
    next_port: u16,
}

/// A shared, single-threaded datagram switch.
///
/// Cloning yields another handle to the same network.
#[derive(Debug, Clone)]
pub struct MemoryNetwork {
    state: Rc<RefCell<NetworkState>>,
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(NetworkState {
                inboxes: HashMap::new(),
                dropped: HashSet::new(),
                sent: HashMap::new(),
                next_port: 40_000,
            })),
        }
    }

    /// Binds an endpoint with the same port fallback as a UDP socket.
    ///
    /// `None` picks a fresh loopback port.
    pub fn bind(
        &self,
        address: Option<SocketAddr>,
        config: &TransportConfig,
    ) -> TransportResult<MemoryTransport> {
        let requested = match address {
            Some(addr) if addr.port() != 0 => addr,
            Some(addr) => SocketAddr::new(addr.ip(), self.fresh_port()),
            None => SocketAddr::from((Ipv4Addr::LOCALHOST, self.fresh_port())),
        };
        let local_addr = bind_with_fallback(requested, config.max_bind_attempts, |addr| {
            let mut state = self.state.borrow_mut();
            if state.inboxes.contains_key(&addr) {
                return Err(io::Error::from(io::ErrorKind::AddrInUse));
            }
            state.inboxes.insert(addr, VecDeque::new());
            Ok(addr)
        })?;
        log::debug!("memory transport bound {local_addr}");
        Ok(MemoryTransport {
            network: self.clone(),
            local_addr,
        })
    }

    /// Silently discards every datagram sent to `addr` while `drop` is set.
    pub fn set_dropped(&self, addr: SocketAddr, drop: bool) {
        let mut state = self.state.borrow_mut();
        if drop {
            state.dropped.insert(addr);
        } else {
            state.dropped.remove(&addr);
        }
    }

    /// Number of datagrams sent to `addr`, including dropped ones.
    #[must_use]
    pub fn sent_to(&self, addr: SocketAddr) -> usize {
        self.state.borrow().sent.get(&addr).copied().unwrap_or(0)
    }

    /// Number of datagrams waiting for `addr`.
    #[must_use]
    pub fn pending_for(&self, addr: SocketAddr) -> usize {
        self.state
            .borrow()
            .inboxes
            .get(&addr)
            .map_or(0, VecDeque::len)
    }

    fn fresh_port(&self) -> u16 {
        let mut state = self.state.borrow_mut();
        loop {
            let port = state.next_port;
            state.next_port = state.next_port.checked_add(1).unwrap_or(40_000);
            let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
            if !state.inboxes.contains_key(&addr) {
                return port;
            }
        }
    }
}

/// One endpoint on a [`MemoryNetwork`]. Unbinds on drop.
#[derive(Debug)]
pub struct MemoryTransport {
    network: MemoryNetwork,
    local_addr: SocketAddr,
}

impl Transport for MemoryTransport {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn poll(&mut self) -> Vec<(SocketAddr, Vec<u8>)> {
        let mut state = self.network.state.borrow_mut();
        state
            .inboxes
            .get_mut(&self.local_addr)
            .map(|inbox| inbox.drain(..).collect())
            .unwrap_or_default()
    }

    fn send(&mut self, addr: SocketAddr, bytes: &[u8]) -> bool {
        let mut state = self.network.state.borrow_mut();
        *state.sent.entry(addr).or_insert(0) += 1;
        if state.dropped.contains(&addr) {
            return true;
        }
        if let Some(inbox) = state.inboxes.get_mut(&addr) {
            inbox.push_back((self.local_addr, bytes.to_vec()));
        }
        true
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.network
            .state
            .borrow_mut()
            .inboxes
            .remove(&self.local_addr);
    }
}
