//! Ready-made tracing hooks.
//!
//! Neither hook ever aborts a call, and neither logs header values, so the
//! bearer token never reaches the log.

use reqwest::blocking::Request;

use crate::error::ClientError;
use crate::transport::{ApiResponse, Transport};

/// Logs method and URL of an outgoing request.
///
/// # Errors
///
/// Never fails.
#[allow(clippy::needless_pass_by_ref_mut, clippy::unnecessary_wraps)]
pub fn log_request(request: &mut Request) -> Result<(), ClientError> {
    tracing::debug!(method = %request.method(), url = %request.url(), "sending request");
    Ok(())
}

/// Logs status and body size of a response.
///
/// # Errors
///
/// Never fails.
#[allow(clippy::unnecessary_wraps)]
pub fn log_response(response: &ApiResponse) -> Result<(), ClientError> {
    tracing::debug!(
        status = response.status().as_u16(),
        bytes = response.body().len(),
        "received response"
    );
    Ok(())
}

/// Registers both logging hooks on a transport.
pub fn install_debug_hooks(transport: &mut Transport) {
    transport.before_request(log_request);
    transport.after_response(log_response);
}
