//! Identity resolution
//!
//! The host framework establishes the account being authenticated before
//! this module is consulted. [`IdentitySource`] reads it back without
//! prompting; a source that has nothing to offer yields
//! [`AuthError::IdentityUnavailable`].

use std::fmt;

use crate::error::{AuthError, AuthResult};

/// Username being authenticated in the current attempt.
///
/// Never empty. Immutable for the lifetime of the attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    /// Wrap a username, rejecting empty or whitespace-only names.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::IdentityUnavailable`] if `user` is blank.
    pub fn new(user: impl Into<String>) -> AuthResult<Self> {
        let user = user.into();
        if user.trim().is_empty() {
            return Err(AuthError::IdentityUnavailable);
        }
        Ok(Self(user))
    }

    /// The username, verbatim.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-attempt context that knows which account is being authenticated.
#[cfg_attr(test, mockall::automock)]
pub trait IdentitySource {
    /// Return the identity for this attempt.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::IdentityUnavailable`] if the context carries no
    /// usable username.
    fn resolve(&self) -> AuthResult<Identity>;
}

/// An identity fixed up front, used by the CLI and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    /// Identity source that always resolves to `user`.
    pub fn new(user: impl Into<String>) -> Self {
        Self(Some(user.into()))
    }

    /// Identity source with no user at all.
    pub fn missing() -> Self {
        Self(None)
    }
}

impl IdentitySource for StaticIdentity {
    fn resolve(&self) -> AuthResult<Identity> {
        match &self.0 {
            Some(user) => Identity::new(user.as_str()),
            None => Err(AuthError::IdentityUnavailable),
        }
    }
}
