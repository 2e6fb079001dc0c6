//! `psu proxy` — Expose an endpoint's Docker API on a local address.
//!
//! Every request received locally is replayed, with the stored credentials,
//! against `endpoints/{id}/docker/<path>` and the upstream response is relayed
//! back unchanged, whatever its status.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::header::{
    AUTHORIZATION, CONNECTION, CONTENT_LENGTH, HOST, HeaderName, TRANSFER_ENCODING, USER_AGENT,
};
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use clap::Args;
use psu_client::PortainerClient;
use psu_client::transport::ApiResponse;
use psu_common::types::EndpointId;
use psu_deploy::resolver;

use super::GlobalArgs;

/// Default listen address, the conventional plain-text Docker port.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:2375";

/// Request headers the transport sets itself.
static REQUEST_HEADERS_DROPPED: [HeaderName; 6] = [
    HOST,
    CONTENT_LENGTH,
    AUTHORIZATION,
    USER_AGENT,
    CONNECTION,
    TRANSFER_ENCODING,
];

/// Response headers recomputed by the local server.
static RESPONSE_HEADERS_DROPPED: [HeaderName; 3] = [CONNECTION, TRANSFER_ENCODING, CONTENT_LENGTH];

/// Arguments for the `proxy` command.
#[derive(Args, Debug)]
#[command(after_help = "Point a Docker client at it with DOCKER_HOST=tcp://127.0.0.1:2375")]
pub struct ProxyArgs {
    /// Endpoint name (default: the only endpoint).
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Address to bind to.
    #[arg(long, default_value = DEFAULT_ADDRESS)]
    pub address: String,
}

struct ProxyState {
    client: PortainerClient,
    endpoint_id: EndpointId,
}

/// Executes the `proxy` command. Runs until interrupted.
///
/// # Errors
///
/// Returns an error if the endpoint cannot be resolved or the address cannot
/// be bound.
pub fn execute(global: &GlobalArgs, args: &ProxyArgs) -> anyhow::Result<()> {
    let client = global.client()?;
    let endpoint = resolver::endpoint_or_default(&client, args.endpoint.as_deref())?;
    // Declared before the runtime so the blocking client is dropped outside it.
    let state = Arc::new(ProxyState {
        client,
        endpoint_id: endpoint.id,
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(serve(Arc::clone(&state), &args.address, &endpoint.name))
}

async fn serve(state: Arc<ProxyState>, address: &str, endpoint: &str) -> anyhow::Result<()> {
    let app = Router::new().fallback(forward).with_state(state);
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to listen on {address}"))?;
    tracing::info!(address, endpoint, "proxying docker api");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("proxy server failed")?;
    tracing::info!("proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for ctrl-c, stop the proxy with a signal");
        std::future::pending::<()>().await;
    }
}

async fn forward(State(state): State<Arc<ProxyState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read request body");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let path = parts
        .uri
        .path_and_query()
        .map_or("/", PathAndQuery::as_str)
        .to_owned();
    let method = parts.method;
    let headers = without(parts.headers, &REQUEST_HEADERS_DROPPED);
    let body = (!body.is_empty()).then(|| body.to_vec());

    let call = tokio::task::spawn_blocking(move || {
        state
            .client
            .docker_proxy(state.endpoint_id, &path, method, headers, body)
    })
    .await;

    match call {
        Ok(Ok(response)) => relay(response),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "docker api call failed");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "docker api call aborted");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn relay(response: ApiResponse) -> Response {
    let (status, headers, body) = response.into_parts();
    let mut relayed = Response::new(Body::from(body));
    *relayed.status_mut() = status;
    *relayed.headers_mut() = without(headers, &RESPONSE_HEADERS_DROPPED);
    relayed
}

fn without(mut headers: HeaderMap, names: &[HeaderName]) -> HeaderMap {
    for name in names {
        let _ = headers.remove(name);
    }
    headers
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
    use clap::Parser;

    use super::*;
    use crate::commands::{Cli, Command};

    #[test]
    fn request_headers_lose_credentials_and_framing() {
        let headers = HeaderMap::from_iter([
            (HOST, HeaderValue::from_static("127.0.0.1:2375")),
            (AUTHORIZATION, HeaderValue::from_static("Bearer other")),
            (CONTENT_LENGTH, HeaderValue::from_static("7")),
            (USER_AGENT, HeaderValue::from_static("Docker-Client/24")),
            (CONTENT_TYPE, HeaderValue::from_static("application/x-tar")),
            (
                HeaderName::from_static("x-registry-auth"),
                HeaderValue::from_static("abc"),
            ),
        ]);

        let kept = without(headers, &REQUEST_HEADERS_DROPPED);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[CONTENT_TYPE], "application/x-tar");
        assert_eq!(kept["x-registry-auth"], "abc");
    }

    #[test]
    fn relay_keeps_status_and_repeated_headers() {
        let headers = HeaderMap::from_iter([
            (SET_COOKIE, HeaderValue::from_static("a=1")),
            (SET_COOKIE, HeaderValue::from_static("b=2")),
            (TRANSFER_ENCODING, HeaderValue::from_static("chunked")),
        ]);
        let upstream = ApiResponse::new(StatusCode::NOT_FOUND, headers, b"missing".to_vec());

        let relayed = relay(upstream);
        assert_eq!(relayed.status(), StatusCode::NOT_FOUND);
        assert_eq!(relayed.headers().get_all(SET_COOKIE).iter().count(), 2);
        assert!(relayed.headers().get(TRANSFER_ENCODING).is_none());
    }

    #[test]
    fn address_defaults_to_local_docker_port() {
        let cli = Cli::try_parse_from(["psu", "proxy", "--endpoint", "primary"]).expect("parse");
        assert!(matches!(
            cli.command,
            Command::Proxy(ProxyArgs { ref address, ref endpoint })
                if address == DEFAULT_ADDRESS && endpoint.as_deref() == Some("primary")
        ));
    }
}
