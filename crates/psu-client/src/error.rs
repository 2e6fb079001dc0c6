//! Error taxonomy for remote calls.

use psu_common::types::GenericError;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a call to the remote API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured server URL, or a request path, does not parse.
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        /// The offending URL or path.
        url: String,
        /// Underlying parse error.
        source: url::ParseError,
    },

    /// DNS, connection, TLS or timeout failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a decodable error envelope.
    #[error("{0}")]
    Api(GenericError),

    /// The server answered with an error body that is not an envelope.
    #[error("{}", opaque_message(*status, body))]
    Opaque {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A before-request or after-response hook refused to continue.
    #[error("request aborted by hook: {message}")]
    Hook {
        /// Reason given by the hook.
        message: String,
    },

    /// A header value could not be built (e.g. a token with control bytes).
    #[error("invalid value for header {name}")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
    },

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body did not match the expected shape.
    #[error("failed to decode response from {path}: {source}")]
    Decode {
        /// Request path the response belongs to.
        path: String,
        /// Underlying decode error.
        source: serde_json::Error,
    },
}

impl ClientError {
    /// Builds a hook abort error.
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook {
            message: message.into(),
        }
    }

    /// HTTP status of an API error, structured or opaque.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(error) => Some(error.code),
            Self::Opaque { status, .. } => Some(*status),
            Self::Transport(error) => error.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for a structured error with status 409.
    ///
    /// Opaque errors never count: their status is not trusted to carry
    /// the server's meaning.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api(error) if error.code == StatusCode::CONFLICT.as_u16())
    }

    /// True for any API error with status 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Api(GenericError { code: 404, .. }) | Self::Opaque { status: 404, .. }
        )
    }

    /// True for any API error with status 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

/// Message for an opaque error: the body text, or the status line when the
/// body is blank.
fn opaque_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unknown status");
    format!("HTTP {status} {reason}")
}
