//! The JSON-RPC error object and the ACP-specific error code space.

use serde::{Deserialize, Serialize};

/// Result type used throughout the crate.
///
/// The error side is always a protocol-level [`Error`] so that failures can be
/// sent back to the peer without translation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A JSON-RPC 2.0 error code.
///
/// The reserved JSON-RPC codes and the ACP-specific codes are available as
/// associated constants. Any other integer is carried through unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    /// Invalid JSON was received by the peer.
    pub const PARSE_ERROR: ErrorCode = ErrorCode(-32700);
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: ErrorCode = ErrorCode(-32600);
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: ErrorCode = ErrorCode(-32601);
    /// Invalid method parameters.
    pub const INVALID_PARAMS: ErrorCode = ErrorCode(-32602);
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: ErrorCode = ErrorCode(-32603);
    /// The agent requires authentication before the operation can proceed.
    pub const AUTH_REQUIRED: ErrorCode = ErrorCode(-32000);
    /// A referenced resource (file, terminal, session) does not exist.
    pub const RESOURCE_NOT_FOUND: ErrorCode = ErrorCode(-32002);
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        ErrorCode(code)
    }
}

/// A JSON-RPC 2.0 error object.
///
/// Errors produced by handlers are emitted verbatim as the `error` member of
/// the response, so any code/message/data combination a peer should see can be
/// expressed directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct Error {
    /// The error code.
    pub code: ErrorCode,
    /// A short human-readable description of the error.
    pub message: String,
    /// Optional structured data attached to the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Error {
    /// Creates an error with an arbitrary code and message.
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Error {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error() -> Self {
        Error::new(ErrorCode::PARSE_ERROR, "Parse error")
    }

    pub fn invalid_request() -> Self {
        Error::new(ErrorCode::INVALID_REQUEST, "Invalid request")
    }

    pub fn method_not_found() -> Self {
        Error::new(ErrorCode::METHOD_NOT_FOUND, "Method not found")
    }

    pub fn invalid_params() -> Self {
        Error::new(ErrorCode::INVALID_PARAMS, "Invalid params")
    }

    pub fn internal_error() -> Self {
        Error::new(ErrorCode::INTERNAL_ERROR, "Internal error")
    }

    /// The agent requires the client to authenticate before proceeding.
    pub fn auth_required() -> Self {
        Error::new(ErrorCode::AUTH_REQUIRED, "Authentication required")
    }

    /// A referenced resource does not exist. The URI is carried in `data`.
    pub fn resource_not_found(uri: impl Into<String>) -> Self {
        Error::new(ErrorCode::RESOURCE_NOT_FOUND, "Resource not found")
            .data(serde_json::json!({ "uri": uri.into() }))
    }

    /// A locally issued request did not complete before its deadline.
    ///
    /// This error never crosses the wire; it is delivered to the caller of a
    /// timed request while the connection stays healthy.
    pub fn request_timeout() -> Self {
        Error::new(ErrorCode::INTERNAL_ERROR, "Request timed out")
    }

    /// The connection shut down while the request was still pending.
    pub fn connection_closed() -> Self {
        Error::new(ErrorCode::INTERNAL_ERROR, "Connection closed")
    }

    /// Attaches structured data to the error.
    ///
    /// Values that fail to serialize are dropped rather than masking the
    /// original error.
    pub fn data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }

    /// Wraps an arbitrary error as an internal error, preserving its message
    /// in `data`.
    pub fn into_internal_error(err: impl std::fmt::Display) -> Self {
        Error::internal_error().data(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::invalid_params().data(err.to_string())
    }
}
