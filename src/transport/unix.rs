//! Unix domain socket transport
//!
//! [`UnixConnector`] opens a `SOCK_STREAM` connection to the daemon's
//! socket path. The resulting [`UnixTransport`] owns the stream for one
//! attempt; closing it shuts down the write side and drops the descriptor.

use std::io;
use std::path::Path;

use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

use crate::error::{AuthError, AuthResult};
use crate::transport::{read_bounded, Connector, Transport};

/// Connects to the daemon over a Unix domain stream socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixConnector;

#[async_trait::async_trait]
impl Connector for UnixConnector {
    async fn open(&self, endpoint: &Path) -> AuthResult<Box<dyn Transport>> {
        tracing::debug!(endpoint = %endpoint.display(), "connecting to daemon socket");

        let stream = UnixStream::connect(endpoint)
            .await
            .map_err(|e| classify_connect_error(endpoint, e))?;

        Ok(Box::new(UnixTransport {
            stream: Some(stream),
        }))
    }
}

/// Separate "could not create a socket at all" from "nobody answered".
///
/// `connect` creates and connects in one step, so descriptor and memory
/// exhaustion show up here too.
fn classify_connect_error(endpoint: &Path, err: io::Error) -> AuthError {
    match err.raw_os_error() {
        Some(code)
            if code == libc::EMFILE
                || code == libc::ENFILE
                || code == libc::ENOBUFS
                || code == libc::ENOMEM
                || code == libc::EAFNOSUPPORT =>
        {
            AuthError::TransportUnavailable(err.to_string())
        }
        _ => AuthError::ConnectFailed {
            endpoint: endpoint.to_path_buf(),
            source: err,
        },
    }
}

/// One connected stream to the daemon.
#[derive(Debug)]
pub struct UnixTransport {
    /// `None` once the transport has been closed.
    stream: Option<UnixStream>,
}

impl UnixTransport {
    fn stream(&mut self) -> io::Result<&mut UnixStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport closed"))
    }
}

#[async_trait::async_trait]
impl Transport for UnixTransport {
    async fn send(&mut self, payload: &[u8]) -> AuthResult<()> {
        let stream = self
            .stream()
            .map_err(|e| AuthError::WriteFailed(e.to_string()))?;
        stream
            .write_all(payload)
            .await
            .map_err(|e| AuthError::WriteFailed(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| AuthError::WriteFailed(e.to_string()))
    }

    async fn receive(&mut self, max_bytes: usize) -> AuthResult<Vec<u8>> {
        let stream = self
            .stream()
            .map_err(|e| AuthError::ReadFailed(e.to_string()))?;
        read_bounded(stream, max_bytes).await
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!(error = %e, "socket shutdown failed; dropping anyway");
            }
        }
    }
}
