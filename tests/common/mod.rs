//! In-process UDP servers for the integration tests.

#![allow(dead_code)]

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ntptime::{NtpPacket, NtpTimestamp};

/// 2024-01-01T00:00:00.5Z
pub const TRANSMIT: NtpTimestamp = NtpTimestamp {
    seconds: 3_913_056_000,
    fraction: 0x8000_0000,
};

pub fn server_packet(transmit: NtpTimestamp) -> NtpPacket {
    NtpPacket {
        settings: NtpPacket::pack_settings(0, 3, NtpPacket::MODE_SERVER),
        stratum: 1,
        precision: -20,
        reference_id: u32::from_be_bytes(*b"GPS\0"),
        transmit_timestamp: transmit,
        ..NtpPacket::default()
    }
}

/// Answers `requests` datagrams with `reply` and returns what it received.
pub fn spawn_server(
    reply: Vec<u8>,
    requests: usize,
) -> (SocketAddr, JoinHandle<Vec<Vec<u8>>>) {
    let (addr, _held, handle) = spawn_held_server(reply, requests);
    (addr, handle)
}

/// Like [`spawn_server`], also returning a shared handle on the server
/// socket so its single descriptor stays open after the thread exits.
pub fn spawn_held_server(
    reply: Vec<u8>,
    requests: usize,
) -> (SocketAddr, Arc<UdpSocket>, JoinHandle<Vec<Vec<u8>>>) {
    let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").unwrap());
    socket
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    let addr = socket.local_addr().unwrap();
    let held = Arc::clone(&socket);

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..requests {
            let mut buf = [0u8; 128];
            let (len, peer) = match socket.recv_from(&mut buf) {
                Ok(r) => r,
                Err(_) => break,
            };
            seen.push(buf[..len].to_vec());
            socket.send_to(&reply, peer).unwrap();
        }
        seen
    });

    (addr, held, handle)
}

/// A bound socket that never answers.
pub fn silent_server() -> (SocketAddr, UdpSocket) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    (socket.local_addr().unwrap(), socket)
}
