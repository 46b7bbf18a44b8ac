//! In-process fake connector for client unit tests
//!
//! [`FakeConnector`] replaces the Unix socket with a scripted
//! [`FakeScript`] and records every call in a shared [`FakeLog`], so tests
//! can assert exactly how many times a transport was opened, written,
//! read and closed.
//!
//! # Example
//!
//! ```ignore
//! let (connector, log) = FakeConnector::new(FakeScript::Reply(br#"{"ok":true}"#.to_vec()));
//! // ... drive the client ...
//! assert_eq!(log.closes(), 1);
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{AuthError, AuthResult};
use crate::transport::{Connector, Transport};

/// What the fake daemon does for an attempt
#[derive(Debug, Clone)]
pub enum FakeScript {
    /// Connecting fails as if nothing listens on the socket
    Refuse,
    /// The local channel cannot be created
    Unavailable,
    /// Writing the request fails
    BrokenPipe,
    /// Reply with these bytes
    Reply(Vec<u8>),
    /// Accept the request and never answer
    Silent,
    /// Close the connection without answering
    HangUp,
}

/// Calls observed by a [`FakeConnector`]
#[derive(Debug, Default)]
pub struct FakeLog {
    opens: AtomicUsize,
    receives: AtomicUsize,
    closes: AtomicUsize,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl FakeLog {
    /// Number of `open` calls.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of `receive` calls.
    pub fn receives(&self) -> usize {
        self.receives.load(Ordering::SeqCst)
    }

    /// Number of `close` calls.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Payloads passed to `send`, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    /// Total number of transport calls of any kind.
    pub fn activity(&self) -> usize {
        self.opens() + self.receives() + self.closes() + self.sent().len()
    }
}

/// Connector that plays back a [`FakeScript`]
#[derive(Debug, Clone)]
pub struct FakeConnector {
    script: FakeScript,
    log: Arc<FakeLog>,
}

impl FakeConnector {
    /// Create a connector and the log it writes to.
    pub fn new(script: FakeScript) -> (Self, Arc<FakeLog>) {
        let log = Arc::new(FakeLog::default());
        (
            Self {
                script,
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

#[async_trait::async_trait]
impl Connector for FakeConnector {
    async fn open(&self, endpoint: &Path) -> AuthResult<Box<dyn Transport>> {
        self.log.opens.fetch_add(1, Ordering::SeqCst);
        match self.script {
            FakeScript::Refuse => Err(AuthError::ConnectFailed {
                endpoint: endpoint.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            }),
            FakeScript::Unavailable => Err(AuthError::TransportUnavailable(
                "too many open files".to_string(),
            )),
            _ => Ok(Box::new(FakeTransport {
                script: self.script.clone(),
                log: Arc::clone(&self.log),
            })),
        }
    }
}

/// Transport half of [`FakeConnector`]
#[derive(Debug)]
pub struct FakeTransport {
    script: FakeScript,
    log: Arc<FakeLog>,
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn send(&mut self, payload: &[u8]) -> AuthResult<()> {
        self.log.sent.lock().unwrap().push(payload.to_vec());
        match self.script {
            FakeScript::BrokenPipe => Err(AuthError::WriteFailed("broken pipe".to_string())),
            _ => Ok(()),
        }
    }

    async fn receive(&mut self, max_bytes: usize) -> AuthResult<Vec<u8>> {
        self.log.receives.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            FakeScript::Reply(bytes) if bytes.len() > max_bytes => Err(
                AuthError::MalformedResponse(format!("response exceeds {} bytes", max_bytes)),
            ),
            FakeScript::Reply(bytes) => Ok(bytes.clone()),
            FakeScript::Silent => std::future::pending().await,
            _ => Err(AuthError::ReadFailed(
                "daemon closed the connection without answering".to_string(),
            )),
        }
    }

    async fn close(&mut self) {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refuse_counts_open_only() {
        let (connector, log) = FakeConnector::new(FakeScript::Refuse);
        assert!(connector.open(Path::new("/tmp/x.sock")).await.is_err());
        assert_eq!(log.opens(), 1);
        assert_eq!(log.activity(), 1);
    }

    #[tokio::test]
    async fn test_reply_is_recorded() {
        let (connector, log) = FakeConnector::new(FakeScript::Reply(b"{}".to_vec()));
        let mut transport = connector.open(Path::new("/tmp/x.sock")).await.unwrap();
        transport.send(b"req").await.unwrap();
        assert_eq!(transport.receive(16).await.unwrap(), b"{}");
        transport.close().await;

        assert_eq!(log.sent(), vec![b"req".to_vec()]);
        assert_eq!(log.receives(), 1);
        assert_eq!(log.closes(), 1);
    }

    #[test]
    fn test_fake_transport_is_object_safe() {
        let (connector, _log) = FakeConnector::new(FakeScript::Silent);
        let _boxed: Box<dyn Connector> = Box::new(connector);
    }
}
