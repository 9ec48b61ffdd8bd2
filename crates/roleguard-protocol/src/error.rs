//! Error types for the protocol layer.
//!
//! Each roleguard crate defines its own error enum. A `ProtocolError`
//! always means "this value didn't have the shape we expected": a token
//! that isn't a decodable bearer token, or a role name we don't know.

/// Errors that can occur while decoding protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The token isn't `header.payload.signature`.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The payload segment isn't valid base64.
    #[error("token payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload decoded but isn't a JSON object with a numeric `exp`.
    #[error("token claims are invalid: {0}")]
    Claims(#[from] serde_json::Error),

    /// A role name outside the known set.
    #[error("unknown role: {0}")]
    InvalidRole(String),
}
