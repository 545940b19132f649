//! Real loopback sockets: exchange and port fallback.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use transport::{Transport, TransportConfig, TransportError, UdpTransport};

fn poll_until_some(transport: &mut UdpTransport) -> Vec<(SocketAddr, Vec<u8>)> {
    for _ in 0..200 {
        let received = transport.poll();
        if !received.is_empty() {
            return received;
        }
        thread::sleep(Duration::from_millis(5));
    }
    Vec::new()
}

#[test]
fn loopback_exchange() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = TransportConfig::default();
    let localhost = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
    let mut a = UdpTransport::start(Some(localhost), &config).unwrap();
    let mut b = UdpTransport::start(Some(localhost), &config).unwrap();

    assert!(a.send(b.local_addr(), b"ping"));
    let received = poll_until_some(&mut b);
    assert_eq!(received, vec![(a.local_addr(), b"ping".to_vec())]);
}

#[test]
fn bind_falls_back_past_used_port() {
    let _ = env_logger::builder().is_test(true).try_init();
    let blocker = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let taken = blocker.local_addr().unwrap();

    match UdpTransport::start(Some(taken), &TransportConfig::default()) {
        Ok(transport) => {
            assert!(transport.local_addr().port() > taken.port());
            assert!(transport.local_addr().port() - taken.port() < 32);
        }
        Err(err) => assert!(matches!(err, TransportError::BindExhausted { .. })),
    }
}

#[test]
fn send_to_closed_port_does_not_break_poll() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = TransportConfig::default();
    let localhost = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
    let closed = {
        let socket = UdpSocket::bind(localhost).unwrap();
        socket.local_addr().unwrap()
    };
    let mut a = UdpTransport::start(Some(localhost), &config).unwrap();
    let mut b = UdpTransport::start(Some(localhost), &config).unwrap();

    a.send(closed, b"nobody");
    thread::sleep(Duration::from_millis(20));
    let _ = a.poll();

    assert!(b.send(a.local_addr(), b"still alive"));
    let received = poll_until_some(&mut a);
    assert_eq!(received.len(), 1);
}
