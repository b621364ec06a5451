use std::fmt::Display;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{Error, Result};
use crate::ntppacket::{decode_response, encode_request, NtpPacket};
use crate::ntpresult::NtpResult;
use crate::{DEFAULT_TIMEOUT, PACKET_SIZE};

/// Queries a single NTP server.
///
/// The client only holds configuration. Every [`get_time`](NtpClient::get_time)
/// call opens its own socket and closes it before returning, so one client
/// can be shared between threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NtpClient {
    server: String,
    port: String,
    timeout: Duration,
}

impl NtpClient {
    /// Create new NTP client
    /// Args:
    /// * `server` - host name or IP address of the server
    /// * `port` - service port, resolved together with `server` on every call
    /// * `timeout` - deadline for a whole exchange, [`DEFAULT_TIMEOUT`] when zero
    pub fn new<S, P>(server: S, port: P, timeout: Duration) -> Self
    where
        S: Into<String>,
        P: Display,
    {
        let timeout = if timeout == Duration::from_secs(0) {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };

        NtpClient {
            server: server.into(),
            port: port.to_string(),
            timeout,
        }
    }

    /// Returns the configured server host
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Returns the configured port as given
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Returns the deadline applied to each exchange
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `host:port`, with IPv6 literals bracketed
    pub fn address(&self) -> String {
        if self.server.contains(':') && !self.server.starts_with('[') {
            format!("[{}]:{}", self.server, self.port)
        } else {
            format!("{}:{}", self.server, self.port)
        }
    }

    /// Performs one request/response exchange and returns the server's
    /// transmit time.
    pub fn get_time(&self) -> Result<NtpResult> {
        let response = self.send_request()?;
        debug!(
            "transmit timestamp: {}.{:08x} (stratum {}, mode {})",
            response.transmit_timestamp.seconds,
            response.transmit_timestamp.fraction,
            response.stratum,
            response.mode()
        );

        Ok(NtpResult::from(response.transmit_timestamp))
    }

    fn connect(&self) -> Result<UdpSocket> {
        let address = self.address();
        let remote = address
            .to_socket_addrs()
            .map_err(Error::Connection)?
            .next()
            .ok_or_else(|| {
                Error::Connection(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} resolved to no socket addresses", address),
                ))
            })?;
        debug!("{} resolved to {}", address, remote);

        let local: SocketAddr = if remote.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).map_err(Error::Connection)?;
        socket.connect(remote).map_err(Error::Connection)?;

        Ok(socket)
    }

    // The socket lives only inside this call and is closed on drop, on
    // every return path.
    fn send_request(&self) -> Result<NtpPacket> {
        let socket = self.connect()?;

        let deadline = Instant::now().checked_add(self.timeout).ok_or_else(|| {
            Error::Deadline(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("timeout {:?} is out of range", self.timeout),
            ))
        })?;
        socket
            .set_write_timeout(Some(self.timeout))
            .map_err(Error::Deadline)?;
        socket
            .set_read_timeout(Some(self.timeout))
            .map_err(Error::Deadline)?;

        let request = encode_request();
        let sent = socket.send(&request).map_err(Error::Send)?;
        if sent != PACKET_SIZE {
            return Err(Error::Send(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {} of {} bytes", sent, PACKET_SIZE),
            )));
        }
        debug!("sent {} byte request", sent);

        // whatever the send consumed is taken off the read budget
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining == Duration::from_secs(0) {
            return Err(Error::Receive(io::Error::new(
                io::ErrorKind::TimedOut,
                "deadline elapsed before the response arrived",
            )));
        }
        socket
            .set_read_timeout(Some(remaining))
            .map_err(Error::Deadline)?;

        let mut buf = [0u8; PACKET_SIZE];
        let received = socket.recv(&mut buf).map_err(Error::Receive)?;
        debug!("received {} byte response", received);
        if received < PACKET_SIZE {
            return Err(Error::Receive(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("received {} of {} bytes", received, PACKET_SIZE),
            )));
        }

        decode_response(&buf[..received])
    }
}
