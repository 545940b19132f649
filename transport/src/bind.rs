//! Port-fallback binding shared by every transport.

use std::io;
use std::net::SocketAddr;

use crate::error::{TransportError, TransportResult};

/// Calls `try_bind` on `requested`, then on successive ports while the port
/// is in use, for at most `max_attempts` tries.
///
/// Port 0 asks the OS for a free port and is tried once.
pub(crate) fn bind_with_fallback<T>(
    requested: SocketAddr,
    max_attempts: u16,
    mut try_bind: impl FnMut(SocketAddr) -> io::Result<T>,
) -> TransportResult<T> {
    let mut addr = requested;
    for attempt in 0..max_attempts.max(1) {
        match try_bind(addr) {
            Ok(bound) => {
                if attempt > 0 {
                    log::info!("port {} in use, bound {} instead", requested.port(), addr);
                }
                return Ok(bound);
            }
            Err(err) if err.kind() == io::ErrorKind::AddrInUse && addr.port() != 0 => {
                log::debug!("bind {addr} failed: address in use");
                match addr.port().checked_add(1) {
                    Some(port) => addr.set_port(port),
                    None => break,
                }
            }
            Err(source) => return Err(TransportError::Bind { addr, source }),
        }
    }
    Err(TransportError::BindExhausted {
        requested,
        attempts: max_attempts,
    })
}
