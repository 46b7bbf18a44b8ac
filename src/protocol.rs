//! Wire protocol between the PAM client and the face unlock daemon
//!
//! One JSON object travels in each direction per attempt:
//!
//! ```text
//! client -> daemon   {"user":"alice"}
//! daemon -> client   {"ok":true,"confidence":0.912}
//!                    {"ok":false,"error":"No username"}
//! ```
//!
//! Responses are decoded structurally against [`AuthResponse`]. A reply is
//! a positive verdict only when the top-level `ok` key is present and is
//! the JSON literal `true`; the bytes are never searched for a success
//! token, so text such as `"ok": true` inside a `reason` string has no
//! effect.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::identity::Identity;

/// Request sent to the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    /// Username to verify
    pub user: String,
}

impl AuthRequest {
    /// Build the request for `identity`.
    pub fn new(identity: &Identity) -> Self {
        Self {
            user: identity.as_str().to_string(),
        }
    }
}

/// Response returned by the daemon
///
/// Only `ok` is required. The daemon also reports a match score and, on
/// failure, an `error` string; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Whether the face matched the enrolled user
    pub ok: bool,

    /// Human readable explanation for the verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Error string as emitted by the daemon on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Best match score observed by the daemon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl AuthResponse {
    /// The daemon's explanation, preferring `reason` over `error`.
    pub fn explanation(&self) -> Option<&str> {
        self.reason.as_deref().or(self.error.as_deref())
    }
}

/// Completeness of a partially received reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A whole JSON value is buffered
    Complete,
    /// More bytes are needed
    Incomplete,
    /// The buffered bytes can never become valid JSON
    Invalid,
}

/// Serialize the request for `identity`.
///
/// The identity is escaped by the JSON serializer, so quotes, backslashes
/// and control characters survive the trip.
///
/// # Errors
///
/// Returns [`AuthError::WriteFailed`] if serialization fails.
pub fn encode_request(identity: &Identity) -> AuthResult<Vec<u8>> {
    serde_json::to_vec(&AuthRequest::new(identity))
        .map_err(|e| AuthError::WriteFailed(format!("failed to encode request: {}", e)))
}

/// Decode and validate a daemon reply.
///
/// # Errors
///
/// Returns [`AuthError::MalformedResponse`] if the bytes are not a single
/// JSON object, if `ok` is missing or not a boolean, if any key appears
/// twice, or if anything but whitespace follows the object.
pub fn decode_response(bytes: &[u8]) -> AuthResult<AuthResponse> {
    // serde's derived visitor would also accept a JSON array positionally.
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => {}
        Some(_) => {
            return Err(AuthError::MalformedResponse(
                "top-level value is not an object".to_string(),
            ))
        }
        None => return Err(AuthError::MalformedResponse("empty response".to_string())),
    }

    serde_json::from_slice::<AuthResponse>(bytes)
        .map_err(|e| AuthError::MalformedResponse(e.to_string()))
}

/// Report whether `buf` holds a complete JSON value.
///
/// Lets the reader stop as soon as the daemon's single reply has arrived,
/// without waiting for the daemon to close its end.
pub fn frame_status(buf: &[u8]) -> FrameStatus {
    let mut values = serde_json::Deserializer::from_slice(buf).into_iter::<IgnoredAny>();
    match values.next() {
        Some(Ok(_)) => FrameStatus::Complete,
        Some(Err(e)) if e.is_eof() => FrameStatus::Incomplete,
        Some(Err(_)) => FrameStatus::Invalid,
        None => FrameStatus::Incomplete,
    }
}
