//! PAM service module entry points
//!
//! Compiled with the `pam` feature. `pam_module!` exports
//! `pam_sm_authenticate` and `pam_sm_setcred` from the cdylib; the other
//! service hooks keep pamsm's default of `PAM_IGNORE`. The work itself is
//! done in [`crate::service`].
//!
//! ```text
//! auth  sufficient  pam_faceunlock.so  socket=/tmp/faceunlock.sock timeout=10000
//! ```

use pamsm::{pam_module, Pam, PamError, PamFlags, PamLibExt, PamServiceModule};

use crate::client::PamOutcome;
use crate::error::{AuthError, AuthResult};
use crate::identity::{Identity, IdentitySource};
use crate::service;

/// Reads the user from the PAM handle.
///
/// `pam_get_user` returns the user the application already set. Only when
/// none is set does libpam ask the conversation function for one, with its
/// default prompt, as stock modules do.
struct PamIdentity<'a> {
    pamh: &'a Pam,
}

impl IdentitySource for PamIdentity<'_> {
    fn resolve(&self) -> AuthResult<Identity> {
        match self.pamh.get_user(None) {
            Ok(Some(user)) => {
                let user = user.to_str().map_err(|_| AuthError::IdentityUnavailable)?;
                Identity::new(user)
            }
            Ok(None) | Err(_) => Err(AuthError::IdentityUnavailable),
        }
    }
}

/// The face unlock PAM module
pub struct FaceUnlockModule;

impl PamServiceModule for FaceUnlockModule {
    fn authenticate(pamh: Pam, _flags: PamFlags, args: Vec<String>) -> PamError {
        pam_code(service::authenticate(&PamIdentity { pamh: &pamh }, &args))
    }

    fn setcred(_pamh: Pam, _flags: PamFlags, _args: Vec<String>) -> PamError {
        pam_code(service::set_credentials())
    }
}

/// Map an outcome to the PAM return code.
pub fn pam_code(outcome: PamOutcome) -> PamError {
    match outcome {
        PamOutcome::Success => PamError::SUCCESS,
        PamOutcome::NotHandled => PamError::IGNORE,
    }
}

pam_module!(FaceUnlockModule);
