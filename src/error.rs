//! Error types for pam-faceunlock
//!
//! This module defines the failure taxonomy of a single authentication
//! attempt ([`AuthError`]) and the crate-level error used by configuration
//! and the diagnostic CLI ([`FaceUnlockError`]), using `thiserror` for
//! ergonomic error handling.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure modes of one authentication attempt
///
/// Every variant collapses to [`crate::client::PamOutcome::NotHandled`].
/// The variants exist so the logs say which stage failed, not to drive
/// different behavior toward the host framework.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The host framework had no username for this attempt
    #[error("no identity available for this attempt")]
    IdentityUnavailable,

    /// The local channel (or the I/O driver behind it) could not be created
    #[error("local transport unavailable: {0}")]
    TransportUnavailable(String),

    /// The daemon is not reachable at the configured endpoint
    #[error("failed to connect to daemon at {}: {source}", .endpoint.display())]
    ConnectFailed {
        /// Socket path the connection was attempted on
        endpoint: PathBuf,
        /// Underlying connect error
        #[source]
        source: std::io::Error,
    },

    /// The request could not be written in full
    #[error("failed to write request: {0}")]
    WriteFailed(String),

    /// Nothing was read, or the read itself failed
    #[error("failed to read response: {0}")]
    ReadFailed(String),

    /// The per-attempt deadline expired before the exchange completed
    #[error("attempt deadline of {}ms expired", .0.as_millis())]
    Timeout(Duration),

    /// The reply did not match the response schema
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The daemon answered with `ok: false`
    #[error("daemon returned a negative verdict ({})", .reason.as_deref().unwrap_or("no reason given"))]
    NegativeVerdict {
        /// Reason reported by the daemon, if any
        reason: Option<String>,
    },
}

impl AuthError {
    /// Name of the handshake stage this error belongs to.
    ///
    /// Used as a structured field in log events.
    pub fn stage(&self) -> &'static str {
        match self {
            AuthError::IdentityUnavailable => "identity",
            AuthError::TransportUnavailable(_) | AuthError::ConnectFailed { .. } => "connect",
            AuthError::WriteFailed(_) => "send",
            AuthError::ReadFailed(_) | AuthError::Timeout(_) => "receive",
            AuthError::MalformedResponse(_) => "decode",
            AuthError::NegativeVerdict { .. } => "verdict",
        }
    }
}

/// Result alias for the handshake stages
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Crate-level error for configuration and logging setup
#[derive(Error, Debug)]
pub enum FaceUnlockError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging setup errors
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for configuration and CLI operations
///
/// Uses `anyhow::Error` so callers can attach context while propagating.
pub type Result<T> = anyhow::Result<T>;
