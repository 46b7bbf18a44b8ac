//! pam-faceunlock - face authentication factor for PAM
//!
//! This library implements the client half of a face unlock setup: a PAM
//! module that hands the user being authenticated to a local face
//! recognition daemon over a Unix socket and turns the daemon's answer into
//! a PAM result.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `identity`: resolving the user for the current attempt
//! - `transport`: the Unix socket session and its bounded reader
//! - `protocol`: request encoding and strict response decoding
//! - `client`: one attempt end to end, deadline and verdict policy
//! - `config`: configuration file, environment and module arguments
//! - `logging`: syslog-backed tracing subscriber
//! - `service`: PAM hook bodies (module arguments, panic guard)
//! - `error`: error types and result aliases
//! - `cli`: command-line interface of `faceunlock-check`
//! - `pam`: exported PAM entry points (feature `pam`)
//!
//! Every failure collapses to `PAM_IGNORE`, so the factor abstains and
//! the stack moves on to the next module; only an explicit, well-formed
//! `{"ok": true}` yields `PAM_SUCCESS`.
//!
//! # Example
//!
//! ```no_run
//! use pam_faceunlock::{ClientSettings, Config, FaceAuthClient, PamOutcome, StaticIdentity};
//!
//! let config = Config::from_path("/etc/faceunlock/pam.yaml")?;
//! config.validate()?;
//!
//! let client = FaceAuthClient::new(ClientSettings::from(&config));
//! if client.authenticate(&StaticIdentity::new("alice")) == PamOutcome::Success {
//!     println!("welcome back");
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod protocol;
pub mod service;
pub mod transport;

#[cfg(feature = "pam")]
pub mod pam;

// Re-export commonly used types
pub use client::{ClientSettings, FaceAuthClient, PamOutcome, Verdict};
pub use config::Config;
pub use error::{AuthError, AuthResult, FaceUnlockError, Result};
pub use identity::{Identity, IdentitySource, StaticIdentity};
pub use protocol::{AuthRequest, AuthResponse};
