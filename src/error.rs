use std::io;

use thiserror::Error;

/// Failure of a single time query, identified by the phase that failed.
#[derive(Error, Debug)]
pub enum Error {
    /// Address resolution or socket setup failed.
    #[error("connection error: {0}")]
    Connection(#[source] io::Error),
    /// The socket timeout could not be applied.
    #[error("failed to set deadline: {0}")]
    Deadline(#[source] io::Error),
    /// The request could not be written.
    #[error("failed to send request: {0}")]
    Send(#[source] io::Error),
    /// The response did not arrive in full before the deadline.
    #[error("failed to read response: {0}")]
    Receive(#[source] io::Error),
    /// The buffer is not a 48-byte NTP packet.
    #[error("malformed response: expected {expected} bytes, got {received}")]
    MalformedResponse { expected: usize, received: usize },
}

impl Error {
    /// Returns `true` if the error was caused by the deadline elapsing.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Send(e) | Error::Receive(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
