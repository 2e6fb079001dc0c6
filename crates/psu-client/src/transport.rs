//! Transport session: one HTTP round trip, hooks, error classification.
//!
//! The response body is read into memory exactly once. Hooks, the error
//! classifier and the final JSON decode all work off that buffer, so
//! classification never consumes the body a later step needs.

use std::fmt;

use psu_common::config::ClientConfig;
use psu_common::constants::API_PREFIX;
use psu_common::types::GenericError;
use reqwest::blocking::{Client, Request};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ClientError;

/// Hook run on every outgoing request, in registration order.
pub type BeforeRequestHook = Box<dyn Fn(&mut Request) -> Result<(), ClientError> + Send + Sync>;

/// Hook run on every received response, in registration order.
pub type AfterResponseHook = Box<dyn Fn(&ApiResponse) -> Result<(), ClientError> + Send + Sync>;

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response from its parts.
    #[must_use]
    pub const fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Splits the response into status, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }

    /// Body as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON. `path` only labels the error.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Decode` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::Decode {
            path: path.to_string(),
            source: e,
        })
    }
}

/// Owns the HTTP connection pool, TLS settings and the hook chains.
pub struct Transport {
    http: Client,
    base_url: Url,
    user_agent: HeaderValue,
    before_request: Vec<BeforeRequestHook>,
    after_response: Vec<AfterResponseHook>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("before_request", &self.before_request.len())
            .field("after_response", &self.after_response.len())
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Creates a transport with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the server URL is invalid or the HTTP client
    /// cannot be initialized (e.g. TLS backend failure).
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(config.timeout)
            .build()?;
        Self::with_http_client(http, config)
    }

    /// Creates a transport around an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the server URL or user agent is invalid.
    pub fn with_http_client(http: Client, config: &ClientConfig) -> Result<Self, ClientError> {
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| ClientError::InvalidHeader { name: "user-agent" })?;
        Ok(Self {
            http,
            base_url: api_base_url(&config.url)?,
            user_agent,
            before_request: Vec::new(),
            after_response: Vec::new(),
        })
    }

    /// Base URL every request path is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends a hook run before each request is sent.
    pub fn before_request<F>(&mut self, hook: F)
    where
        F: Fn(&mut Request) -> Result<(), ClientError> + Send + Sync + 'static,
    {
        self.before_request.push(Box::new(hook));
    }

    /// Appends a hook run after each response is received.
    pub fn after_response<F>(&mut self, hook: F)
    where
        F: Fn(&ApiResponse) -> Result<(), ClientError> + Send + Sync + 'static,
    {
        self.after_response.push(Box::new(hook));
    }

    /// Performs one round trip and classifies the response.
    ///
    /// `path` is resolved against the API base URL. A body is sent as
    /// `application/json` unless `headers` names another content type.
    /// Hooks run in order and the first failing hook aborts the call.
    ///
    /// # Errors
    ///
    /// Returns a transport error, a hook error, or the classified API error
    /// for statuses >= 300.
    pub fn send(
        &self,
        path: &str,
        method: Method,
        body: Option<Vec<u8>>,
        headers: HeaderMap,
    ) -> Result<ApiResponse, ClientError> {
        classify(self.round_trip(path, method, body, headers)?)
    }

    /// Performs one round trip and returns the response whatever its status.
    ///
    /// # Errors
    ///
    /// Returns a transport or hook error.
    pub fn round_trip(
        &self,
        path: &str,
        method: Method,
        body: Option<Vec<u8>>,
        mut headers: HeaderMap,
    ) -> Result<ApiResponse, ClientError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl {
                url: path.to_string(),
                source: e,
            })?;

        let _ = headers.insert(USER_AGENT, self.user_agent.clone());
        if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        let mut builder = self.http.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let mut request = builder.build()?;

        for hook in &self.before_request {
            hook(&mut request)?;
        }

        let response = self.http.execute(request)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?.to_vec();
        let response = ApiResponse::new(status, headers, body);

        for hook in &self.after_response {
            hook(&response)?;
        }
        Ok(response)
    }
}

/// Appends the API prefix to a server URL: `https://host/` → `https://host/api/`.
///
/// # Errors
///
/// Returns `ClientError::InvalidUrl` if the result does not parse.
pub fn api_base_url(server_url: &str) -> Result<Url, ClientError> {
    let joined = format!("{}/{API_PREFIX}", server_url.trim_end_matches('/'));
    Url::parse(&joined).map_err(|e| ClientError::InvalidUrl {
        url: server_url.to_string(),
        source: e,
    })
}

/// Sorts a response into success, structured error or opaque error.
///
/// # Errors
///
/// Returns `ClientError::Api` when the body decodes into a non-empty error
/// envelope, `ClientError::Opaque` with the raw body text otherwise.
pub fn classify(response: ApiResponse) -> Result<ApiResponse, ClientError> {
    let status = response.status().as_u16();
    if status < 300 {
        return Ok(response);
    }
    match serde_json::from_slice::<GenericError>(response.body()) {
        Ok(envelope) if !envelope.is_empty() => Err(ClientError::Api(GenericError {
            code: status,
            ..envelope
        })),
        _ => Err(ClientError::Opaque {
            status,
            body: response.text(),
        }),
    }
}
