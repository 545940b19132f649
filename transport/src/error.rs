use std::io;
use std::net::SocketAddr;

use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

/// Errors surfaced while starting a transport.
///
/// Send and receive failures are advisory and never reach this type.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Every port from the requested one upward was taken.
    #[error("no free port starting at {requested} after {attempts} attempts")]
    BindExhausted { requested: SocketAddr, attempts: u16 },

    /// The bind failed for a reason other than the port being in use.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Socket configuration after bind failed.
    #[error("failed to configure socket: {0}")]
    Configure(#[source] io::Error),

    /// An address was not in `<ipv4>:<port>` form.
    #[error("invalid address '{input}', expected <ipv4>:<port>")]
    InvalidAddress { input: String },
}
