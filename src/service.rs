//! Bodies of the PAM service hooks
//!
//! Everything `pam_sm_authenticate` and `pam_sm_setcred` do apart from
//! talking to libpam lives here, so it builds and is tested without the
//! `pam` feature. The exported symbols in [`crate::pam`] only adapt the
//! PAM handle to an [`IdentitySource`] and the outcome to a return code.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::client::{ClientSettings, FaceAuthClient, PamOutcome};
use crate::config::{Config, LoggingConfig};
use crate::identity::IdentitySource;
use crate::logging;

/// Run one authentication attempt configured by the module arguments.
///
/// An invalid configuration or a panic anywhere in the attempt yields
/// [`PamOutcome::NotHandled`]; the client is never built in that case.
pub fn authenticate(source: &dyn IdentitySource, args: &[String]) -> PamOutcome {
    catch_unwind(AssertUnwindSafe(|| run_authenticate(source, args))).unwrap_or_else(|_| {
        tracing::error!("authentication attempt panicked");
        PamOutcome::NotHandled
    })
}

fn run_authenticate(source: &dyn IdentitySource, args: &[String]) -> PamOutcome {
    let config = match Config::from_module_args(args) {
        Ok(config) => config,
        Err(e) => {
            let _ = logging::init(&LoggingConfig::default());
            tracing::error!(error = %e, "invalid module configuration");
            return PamOutcome::NotHandled;
        }
    };
    let _ = logging::init(&config.logging);

    let client = FaceAuthClient::new(ClientSettings::from(&config));
    client.authenticate(source)
}

/// Credential-setting hook. Performs no I/O.
pub fn set_credentials() -> PamOutcome {
    FaceAuthClient::new(ClientSettings::default()).establish_credentials()
}
