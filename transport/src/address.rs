//! Text form of endpoint addresses.

use std::net::{SocketAddr, SocketAddrV4};

use crate::error::{TransportError, TransportResult};

/// Parses `"<ipv4>:<port>"`.
pub fn parse_address(input: &str) -> TransportResult<SocketAddr> {
    input
        .trim()
        .parse::<SocketAddrV4>()
        .map(SocketAddr::V4)
        .map_err(|_| TransportError::InvalidAddress {
            input: input.to_owned(),
        })
}

/// Renders an address in the same form [`parse_address`] accepts.
#[must_use]
pub fn format_address(addr: SocketAddr) -> String {
    format!("{}:{}", addr.ip(), addr.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format_agree() {
        let addr = parse_address("192.168.1.20:7777").unwrap();
        assert_eq!(format_address(addr), "192.168.1.20:7777");
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!(parse_address(" 127.0.0.1:80\n").unwrap().port(), 80);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_address("localhost").is_err());
        assert!(parse_address("127.0.0.1").is_err());
        assert!(parse_address("127.0.0.1:99999").is_err());
        assert!(parse_address("[::1]:80").is_err());
    }
}
