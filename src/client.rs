//! Authentication client: one login attempt against the face unlock daemon
//!
//! [`FaceAuthClient::authenticate`] is the synchronous entry point the PAM
//! glue calls once per attempt. It resolves the user, runs the handshake on
//! a single-threaded runtime that lives only for the call, and collapses
//! every failure into [`PamOutcome::NotHandled`].
//!
//! # Handshake
//!
//! ```text
//! resolve identity ─┐
//!                   └─ open ─ send ─ receive ─ close ─ decode ─ verdict
//!                      └──────── one deadline ───────┘
//! ```
//!
//! Only a structurally valid reply with `ok: true` yields
//! [`PamOutcome::Success`]. Missing identity, unreachable daemon, write and
//! read failures, deadline expiry, malformed replies and explicit denials
//! all report `NotHandled`, so the surrounding stack falls through to its
//! next factor instead of locking the user out.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use crate::config::Config;
use crate::error::{AuthError, AuthResult};
use crate::identity::{Identity, IdentitySource};
use crate::protocol::{decode_response, encode_request, AuthResponse};
use crate::transport::unix::UnixConnector;
use crate::transport::{Connector, Transport};

/// Internal verdict of a completed exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The daemon confirmed the face
    Success,
    /// Anything else
    Deny,
}

impl Verdict {
    /// Derive the verdict from a decoded reply.
    pub fn from_response(response: &AuthResponse) -> Self {
        if response.ok {
            Verdict::Success
        } else {
            Verdict::Deny
        }
    }
}

/// Result reported to the host framework
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PamOutcome {
    /// The factor authenticated the user (`PAM_SUCCESS`)
    Success,
    /// The factor abstains (`PAM_IGNORE`)
    NotHandled,
}

impl From<Verdict> for PamOutcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Success => PamOutcome::Success,
            Verdict::Deny => PamOutcome::NotHandled,
        }
    }
}

/// Settings the client needs for one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Daemon socket path
    pub endpoint: PathBuf,
    /// Deadline spanning open, send and receive
    pub timeout: Duration,
    /// Upper bound on the reply size
    pub max_response_bytes: usize,
}

impl From<&Config> for ClientSettings {
    fn from(config: &Config) -> Self {
        Self {
            endpoint: config.socket_path.clone(),
            timeout: config.timeout(),
            max_response_bytes: config.max_response_bytes,
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Client for the face unlock daemon
///
/// Holds only read-only settings and a connector; every call builds and
/// tears down its own transport, so one client can serve concurrent
/// attempts from different threads.
///
/// # Examples
///
/// ```no_run
/// use pam_faceunlock::client::{ClientSettings, FaceAuthClient, PamOutcome};
/// use pam_faceunlock::identity::StaticIdentity;
///
/// let client = FaceAuthClient::new(ClientSettings::default());
/// let outcome = client.authenticate(&StaticIdentity::new("alice"));
/// assert!(matches!(outcome, PamOutcome::Success | PamOutcome::NotHandled));
/// ```
#[derive(Debug, Clone)]
pub struct FaceAuthClient<C = UnixConnector> {
    settings: ClientSettings,
    connector: C,
}

impl FaceAuthClient<UnixConnector> {
    /// Client that talks to the daemon over its Unix socket.
    pub fn new(settings: ClientSettings) -> Self {
        Self::with_connector(settings, UnixConnector)
    }
}

impl<C: Connector> FaceAuthClient<C> {
    /// Client using a custom connector.
    pub fn with_connector(settings: ClientSettings, connector: C) -> Self {
        Self {
            settings,
            connector,
        }
    }

    /// Settings this client was built with.
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Run one authentication attempt and report the PAM outcome.
    ///
    /// Never fails and never blocks longer than the configured deadline
    /// (plus identity resolution, which does no I/O of its own).
    pub fn authenticate(&self, source: &dyn IdentitySource) -> PamOutcome {
        tracing::info!("authentication attempt started");

        let result = self.attempt(source).and_then(|response| {
            match Verdict::from_response(&response) {
                Verdict::Success => Ok(response),
                Verdict::Deny => Err(AuthError::NegativeVerdict {
                    reason: response.explanation().map(str::to_string),
                }),
            }
        });

        match result {
            Ok(response) => {
                tracing::info!(
                    confidence = ?response.confidence,
                    "face match succeeded"
                );
                PamOutcome::Success
            }
            Err(err) => {
                tracing::error!(
                    stage = err.stage(),
                    endpoint = %self.settings.endpoint.display(),
                    error = %err,
                    "face authentication not handled"
                );
                PamOutcome::NotHandled
            }
        }
    }

    /// Run one attempt and return the daemon's decoded reply.
    ///
    /// A reply with `ok: false` is returned as `Ok`; mapping it to a
    /// verdict is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first stage that failed.
    pub fn attempt(&self, source: &dyn IdentitySource) -> AuthResult<AuthResponse> {
        let identity = source.resolve()?;
        tracing::info!(user = %identity, "resolved user");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AuthError::TransportUnavailable(format!("runtime: {}", e)))?;

        runtime.block_on(self.exchange(&identity))
    }

    /// Perform the handshake for `identity` under the attempt deadline.
    ///
    /// The transport is closed exactly once whenever `open` succeeded,
    /// whatever happens afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Timeout`] if the deadline expires, otherwise the
    /// error of the failing stage.
    pub async fn exchange(&self, identity: &Identity) -> AuthResult<AuthResponse> {
        let deadline = Instant::now() + self.settings.timeout;
        let endpoint = &self.settings.endpoint;

        let mut transport = timeout_at(deadline, self.connector.open(endpoint))
            .await
            .map_err(|_| AuthError::Timeout(self.settings.timeout))??;
        tracing::info!(endpoint = %endpoint.display(), "connected to daemon");

        let outcome = timeout_at(deadline, self.converse(transport.as_mut(), identity))
            .await
            .unwrap_or_else(|_| Err(AuthError::Timeout(self.settings.timeout)));

        transport.close().await;
        tracing::debug!("transport closed");

        outcome
    }

    async fn converse(
        &self,
        transport: &mut dyn Transport,
        identity: &Identity,
    ) -> AuthResult<AuthResponse> {
        let request = encode_request(identity)?;
        transport.send(&request).await?;
        tracing::info!(user = %identity, bytes = request.len(), "sent request");

        let reply = transport.receive(self.settings.max_response_bytes).await?;
        tracing::info!(bytes = reply.len(), "received response");

        decode_response(&reply)
    }

    /// Credential-setting hook; this factor owns no credentials.
    ///
    /// Performs no I/O and always succeeds.
    pub fn establish_credentials(&self) -> PamOutcome {
        tracing::info!("setcred called");
        PamOutcome::Success
    }
}
