//! Client Transport Tests
//!
//! Tests verify:
//! - Backoff schedule
//! - Retransmission bound and identical retransmissions
//! - Stray and corrupt datagrams are ignored while waiting
//! - Late answers are still accepted

use std::net::UdpSocket;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use udpkv::network::ClientTransport;
use udpkv::protocol::{Envelope, MessageId, MAX_DATAGRAM_SIZE};
use udpkv::{ClientConfig, KvError};

// =============================================================================
// Helper Functions
// =============================================================================

fn fast_config(retries: u32) -> ClientConfig {
    ClientConfig::builder()
        .max_retries(retries)
        .initial_timeout_ms(20)
        .max_timeout_ms(80)
        .build()
}

fn client(config: ClientConfig) -> ClientTransport {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    ClientTransport::with_socket(socket, config).unwrap()
}

fn fake_server() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    socket
}

/// Drain every datagram that arrives within a short quiet period
fn drain(socket: &UdpSocket) -> Vec<Vec<u8>> {
    socket
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];
    let mut received = Vec::new();
    while let Ok((len, _)) = socket.recv_from(&mut buf) {
        received.push(buf[..len].to_vec());
    }
    received
}

fn answer(socket: &UdpSocket, id: MessageId, payload: &'static [u8], to: std::net::SocketAddr) {
    let reply = Envelope::new(id, Bytes::from_static(payload)).encode().unwrap();
    socket.send_to(&reply, to).unwrap();
}

// =============================================================================
// Backoff Schedule Tests
// =============================================================================

#[test]
fn test_default_schedule() {
    let timeouts: Vec<u64> = ClientConfig::default()
        .timeouts()
        .map(|t| t.as_millis() as u64)
        .collect();
    assert_eq!(timeouts, vec![100, 200, 400, 800]);
}

#[test]
fn test_schedule_is_capped() {
    let config = ClientConfig::builder()
        .max_retries(5)
        .initial_timeout_ms(100)
        .max_timeout_ms(300)
        .build();
    let timeouts: Vec<u64> = config.timeouts().map(|t| t.as_millis() as u64).collect();
    assert_eq!(timeouts, vec![100, 200, 300, 300, 300, 300]);
}

#[test]
fn test_zero_retries_sends_once() {
    assert_eq!(fast_config(0).timeouts().count(), 1);
}

#[test]
fn test_invalid_config_rejected() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let config = ClientConfig::builder().initial_timeout_ms(0).build();
    assert!(matches!(
        ClientTransport::with_socket(socket, config),
        Err(KvError::Config(_))
    ));

    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let config = ClientConfig::builder()
        .initial_timeout_ms(500)
        .max_timeout_ms(100)
        .build();
    assert!(ClientTransport::with_socket(socket, config).is_err());
}

// =============================================================================
// Retransmission Tests
// =============================================================================

#[test]
fn test_silent_server_gets_bounded_identical_retries() {
    let server = fake_server();
    let transport = client(fast_config(3));

    let result = transport.send(b"request", server.local_addr().unwrap());
    assert!(matches!(result, Err(KvError::Timeout { attempts: 4 })));

    let received = drain(&server);
    assert_eq!(received.len(), 4);
    assert!(received.iter().all(|d| d == &received[0]));

    let envelope = Envelope::decode_verified(&received[0]).unwrap();
    assert_eq!(envelope.payload, Bytes::from_static(b"request"));
}

#[test]
fn test_answer_to_first_attempt() {
    let server = fake_server();
    let server_addr = server.local_addr().unwrap();
    let transport = client(fast_config(3));

    let responder = thread::spawn(move || {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let (len, from) = server.recv_from(&mut buf).unwrap();
        let request = Envelope::decode_verified(&buf[..len]).unwrap();
        answer(&server, request.id, b"pong", from);
    });

    let reply = transport.send(b"ping", server_addr).unwrap();
    assert_eq!(reply, Bytes::from_static(b"pong"));
    responder.join().unwrap();
}

#[test]
fn test_answer_to_later_attempt() {
    let server = fake_server();
    let server_addr = server.local_addr().unwrap();
    let transport = client(fast_config(5));

    let responder = thread::spawn(move || {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        // Ignore the first two transmissions
        for _ in 0..2 {
            server.recv_from(&mut buf).unwrap();
        }
        let (len, from) = server.recv_from(&mut buf).unwrap();
        let request = Envelope::decode_verified(&buf[..len]).unwrap();
        answer(&server, request.id, b"late", from);
    });

    let reply = transport.send(b"ping", server_addr).unwrap();
    assert_eq!(reply, Bytes::from_static(b"late"));
    responder.join().unwrap();
}

#[test]
fn test_stray_datagrams_are_ignored() {
    let server = fake_server();
    let server_addr = server.local_addr().unwrap();
    let transport = client(fast_config(3));

    let responder = thread::spawn(move || {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let (len, from) = server.recv_from(&mut buf).unwrap();
        let request = Envelope::decode_verified(&buf[..len]).unwrap();

        // Garbage, a corrupted reply, and a reply for another request
        server.send_to(b"garbage", from).unwrap();

        let mut corrupted = Envelope::new(request.id, Bytes::from_static(b"bad"))
            .encode()
            .unwrap()
            .to_vec();
        corrupted[16] ^= 0xFF;
        server.send_to(&corrupted, from).unwrap();

        answer(&server, MessageId::from_bytes([9; 16]), b"wrong", from);
        answer(&server, request.id, b"right", from);
    });

    let reply = transport.send(b"ping", server_addr).unwrap();
    assert_eq!(reply, Bytes::from_static(b"right"));
    responder.join().unwrap();
}

#[test]
fn test_each_request_gets_a_fresh_id() {
    let server = fake_server();
    let transport = client(fast_config(0));
    let addr = server.local_addr().unwrap();

    let _ = transport.send(b"one", addr);
    let _ = transport.send(b"two", addr);

    let received = drain(&server);
    assert_eq!(received.len(), 2);
    let first = Envelope::decode_verified(&received[0]).unwrap();
    let second = Envelope::decode_verified(&received[1]).unwrap();
    assert_ne!(first.id, second.id);
}

// =============================================================================
// Message ID Tests
// =============================================================================

#[test]
fn test_wildcard_bound_client_puts_source_ip_in_id() {
    let server = fake_server();
    let transport = ClientTransport::bind(fast_config(0)).unwrap();
    assert!(transport.local_addr().unwrap().ip().is_unspecified());

    let result = transport.send(b"ping", server.local_addr().unwrap());
    assert!(matches!(result, Err(KvError::Timeout { attempts: 1 })));

    let mut buf = [0u8; MAX_DATAGRAM_SIZE];
    let (len, from) = server.recv_from(&mut buf).unwrap();
    let envelope = Envelope::decode_verified(&buf[..len]).unwrap();
    let id = envelope.id.as_bytes();

    let source_ip = match from.ip() {
        std::net::IpAddr::V4(v4) => v4.octets(),
        std::net::IpAddr::V6(v6) => panic!("Expected an IPv4 sender, got {}", v6),
    };
    assert_eq!(&id[0..4], &source_ip);
    assert_eq!(&id[4..6], &from.port().to_le_bytes());
}
