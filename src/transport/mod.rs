//! Transport abstraction for the daemon handshake
//!
//! This module defines the [`Connector`] and [`Transport`] traits that the
//! authentication client drives. Concrete implementations live in
//! submodules:
//!
//! - [`unix::UnixConnector`] -- connects to the daemon over a Unix domain
//!   stream socket.
//! - [`fake::FakeConnector`] -- in-process fake used in tests (cfg(test)
//!   only).
//!
//! # Design
//!
//! A transport carries exactly one request and one reply. There is no
//! framing beyond the reply itself: the reader stops once a complete JSON
//! value is buffered, when the peer closes, or when the byte bound is hit.
//! Deadlines are not the transport's concern; the client wraps every call
//! in the per-attempt deadline.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{AuthError, AuthResult};
use crate::protocol::{frame_status, FrameStatus};

pub mod unix;

#[cfg(test)]
pub mod fake;

/// Size of each individual read from the socket
const READ_CHUNK: usize = 256;

/// Opens a [`Transport`] to the daemon.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + std::fmt::Debug {
    /// Connect to the daemon listening at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TransportUnavailable`] if no channel can be
    /// created and [`AuthError::ConnectFailed`] if the daemon is not
    /// reachable.
    async fn open(&self, endpoint: &Path) -> AuthResult<Box<dyn Transport>>;
}

/// A single-attempt, ordered, reliable byte channel to the daemon.
#[async_trait::async_trait]
pub trait Transport: Send + std::fmt::Debug {
    /// Write the whole request payload.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WriteFailed`] on a short or failed write.
    async fn send(&mut self, payload: &[u8]) -> AuthResult<()>;

    /// Read one reply of at most `max_bytes` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ReadFailed`] if the peer closes before sending
    /// anything or the read fails, and [`AuthError::MalformedResponse`] if
    /// `max_bytes` are buffered without a complete reply.
    async fn receive(&mut self, max_bytes: usize) -> AuthResult<Vec<u8>>;

    /// Release the channel. Called once per attempt after a successful open.
    async fn close(&mut self);
}

/// Read a single reply from `reader`, bounded by `max_bytes`.
///
/// Reading stops when the buffer holds a complete JSON value, when the
/// buffered bytes can no longer become one, or when the peer closes. What
/// was read is returned for the decoder to judge.
///
/// # Errors
///
/// Returns [`AuthError::ReadFailed`] on I/O errors or if the peer closes
/// without sending anything, and [`AuthError::MalformedResponse`] if the
/// bound is reached while the reply is still incomplete.
pub async fn read_bounded<R>(reader: &mut R, max_bytes: usize) -> AuthResult<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = Vec::with_capacity(max_bytes.min(READ_CHUNK));
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let remaining = max_bytes.saturating_sub(buf.len());
        if remaining == 0 {
            return Err(AuthError::MalformedResponse(format!(
                "response exceeds {} bytes",
                max_bytes
            )));
        }

        let want = remaining.min(chunk.len());
        let n = reader
            .read(&mut chunk[..want])
            .await
            .map_err(|e| AuthError::ReadFailed(e.to_string()))?;

        if n == 0 {
            if buf.is_empty() {
                return Err(AuthError::ReadFailed(
                    "daemon closed the connection without answering".to_string(),
                ));
            }
            return Ok(buf);
        }

        buf.extend_from_slice(&chunk[..n]);

        match frame_status(&buf) {
            FrameStatus::Complete | FrameStatus::Invalid => return Ok(buf),
            FrameStatus::Incomplete => {}
        }
    }
}
