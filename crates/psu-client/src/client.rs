//! Bearer-token session over the transport.
//!
//! The token is fetched lazily on the first protected call and reused for
//! the rest of the session. It is never refreshed: a 401 after the token was
//! cached is reported to the caller like any other API error.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use psu_common::config::ClientConfig;
use psu_common::constants::AUTH_PATH;
use psu_common::types::{
    Endpoint, EndpointGroup, EndpointId, Pair, ResourceControl, ResourceControlId, ResourceType,
    Stack, StackId, Status, TeamId, User, UserId,
};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::{
    PortainerApi, ResourceControlCreateOptions, ResourceControlUpdateOptions,
    StackCreateComposeOptions, StackCreateSwarmOptions, StackListFilter, StackUpdateOptions,
};
use crate::error::ClientError;
use crate::transport::{ApiResponse, Transport};

/// Authenticated API client.
pub struct PortainerClient {
    transport: Transport,
    username: String,
    password: String,
    token: Mutex<Option<String>>,
}

impl fmt::Debug for PortainerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortainerClient")
            .field("transport", &self.transport)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl PortainerClient {
    /// Creates a client from connection settings.
    ///
    /// A token present in `config` is used as-is and no authentication call
    /// is made until it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::with_transport(Transport::new(config)?, config))
    }

    /// Creates a client over an existing transport.
    #[must_use]
    pub fn with_transport(transport: Transport, config: &ClientConfig) -> Self {
        Self {
            transport,
            username: config.user.clone(),
            password: config.password.clone(),
            token: Mutex::new(config.token.clone()),
        }
    }

    /// Mutable access to the transport, for registering hooks.
    pub const fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    /// Exchanges the configured credentials for a fresh token.
    ///
    /// This call does not attach a bearer token and does not touch the
    /// cached one.
    ///
    /// # Errors
    ///
    /// Returns the transport or API error of the auth call.
    pub fn authenticate(&self) -> Result<String, ClientError> {
        tracing::debug!(user = %self.username, "authenticating");
        let body = json_body(&AuthenticateRequest {
            username: &self.username,
            password: &self.password,
        })?;
        let response = self
            .transport
            .send(AUTH_PATH, Method::POST, Some(body), HeaderMap::new())?;
        let response: AuthenticateResponse = response.json(AUTH_PATH)?;
        Ok(response.jwt)
    }

    /// Returns the session token, authenticating first if none is cached.
    ///
    /// The check and the authentication run under one lock, so concurrent
    /// callers trigger at most one auth call. A failed call caches nothing.
    ///
    /// # Errors
    ///
    /// Returns the error of the authentication call.
    pub fn token(&self) -> Result<String, ClientError> {
        let mut cached = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let token = self.authenticate()?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Performs an authenticated call and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns authentication, transport, API or decode errors.
    pub fn do_authenticated<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: Option<Vec<u8>>,
    ) -> Result<T, ClientError> {
        self.send_authenticated(path, method, body)?.json(path)
    }

    /// Performs an authenticated call whose response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns authentication, transport or API errors.
    pub fn do_authenticated_no_content(
        &self,
        path: &str,
        method: Method,
        body: Option<Vec<u8>>,
    ) -> Result<(), ClientError> {
        let _ = self.send_authenticated(path, method, body)?;
        Ok(())
    }

    /// Forwards a raw Docker API request to an endpoint.
    ///
    /// `path_and_query` is relative to the endpoint's Docker root, e.g.
    /// `/v1.41/containers/json?all=1`. The response is returned whatever its
    /// status so it can be relayed as-is; only transport, hook and
    /// authentication failures are errors.
    ///
    /// # Errors
    ///
    /// Returns authentication, transport or hook errors.
    pub fn docker_proxy(
        &self,
        endpoint_id: EndpointId,
        path_and_query: &str,
        method: Method,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse, ClientError> {
        let path = format!(
            "endpoints/{endpoint_id}/docker/{}",
            path_and_query.trim_start_matches('/')
        );
        let headers = self.authorize(headers)?;
        tracing::debug!(%method, path, "proxying docker call");
        self.transport.round_trip(&path, method, body, headers)
    }

    fn send_authenticated(
        &self,
        path: &str,
        method: Method,
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse, ClientError> {
        let headers = self.authorize(HeaderMap::new())?;
        tracing::debug!(%method, path, "calling api");
        self.transport.send(path, method, body, headers)
    }

    fn authorize(&self, mut headers: HeaderMap) -> Result<HeaderMap, ClientError> {
        let token = self.token()?;
        let mut bearer = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            ClientError::InvalidHeader {
                name: "authorization",
            }
        })?;
        bearer.set_sensitive(true);
        let _ = headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }
}

fn json_body<B: Serialize>(body: &B) -> Result<Vec<u8>, ClientError> {
    serde_json::to_vec(body).map_err(ClientError::Encode)
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

const fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticateRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthenticateResponse {
    #[serde(alias = "Jwt")]
    jwt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StackCreateRequest<'a> {
    name: &'a str,
    #[serde(rename = "SwarmID")]
    swarm_id: &'a str,
    stack_file_content: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    env: &'a [Pair],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StackUpdateRequest<'a> {
    stack_file_content: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    env: &'a [Pair],
    prune: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackFileInspectResponse {
    stack_file_content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResourceControlCreateRequest<'a> {
    #[serde(rename = "ResourceID")]
    resource_id: &'a str,
    #[serde(rename = "Type")]
    resource_type: ResourceType,
    #[serde(skip_serializing_if = "is_false")]
    public: bool,
    #[serde(skip_serializing_if = "is_empty")]
    users: &'a [UserId],
    #[serde(skip_serializing_if = "is_empty")]
    teams: &'a [TeamId],
    #[serde(rename = "SubResourceIDs", skip_serializing_if = "is_empty")]
    sub_resource_ids: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResourceControlUpdateRequest<'a> {
    #[serde(skip_serializing_if = "is_false")]
    public: bool,
    #[serde(skip_serializing_if = "is_empty")]
    users: &'a [UserId],
    #[serde(skip_serializing_if = "is_empty")]
    teams: &'a [TeamId],
}

fn create_stack_path(stack_type: u8, endpoint_id: EndpointId) -> String {
    format!("stacks?type={stack_type}&method=string&endpointId={endpoint_id}")
}

impl PortainerApi for PortainerClient {
    fn username(&self) -> &str {
        &self.username
    }

    fn endpoint_list(&self) -> Result<Vec<Endpoint>, ClientError> {
        self.do_authenticated("endpoints", Method::GET, None)
    }

    fn endpoint_group_list(&self) -> Result<Vec<EndpointGroup>, ClientError> {
        self.do_authenticated("endpoint_groups", Method::GET, None)
    }

    fn endpoint_docker_info(
        &self,
        endpoint_id: EndpointId,
    ) -> Result<Map<String, Value>, ClientError> {
        self.do_authenticated(
            &format!("endpoints/{endpoint_id}/docker/info"),
            Method::GET,
            None,
        )
    }

    fn endpoint_docker_get(
        &self,
        endpoint_id: EndpointId,
        path: &str,
    ) -> Result<Value, ClientError> {
        self.do_authenticated(
            &format!(
                "endpoints/{endpoint_id}/docker/{}",
                path.trim_start_matches('/')
            ),
            Method::GET,
            None,
        )
    }

    fn stack_list(&self, filter: &StackListFilter) -> Result<Vec<Stack>, ClientError> {
        let filter = serde_json::to_string(filter).map_err(ClientError::Encode)?;
        let encoded: String = url::form_urlencoded::byte_serialize(filter.as_bytes()).collect();
        self.do_authenticated(&format!("stacks?filters={encoded}"), Method::GET, None)
    }

    fn stack_create_swarm(&self, options: &StackCreateSwarmOptions) -> Result<Stack, ClientError> {
        let body = json_body(&StackCreateRequest {
            name: &options.name,
            swarm_id: &options.swarm_cluster_id,
            stack_file_content: &options.stack_file_content,
            env: &options.env,
        })?;
        self.do_authenticated(
            &create_stack_path(
                psu_common::constants::STACK_TYPE_SWARM,
                options.endpoint_id,
            ),
            Method::POST,
            Some(body),
        )
    }

    fn stack_create_compose(
        &self,
        options: &StackCreateComposeOptions,
    ) -> Result<Stack, ClientError> {
        let body = json_body(&StackCreateRequest {
            name: &options.name,
            swarm_id: "",
            stack_file_content: &options.stack_file_content,
            env: &options.env,
        })?;
        self.do_authenticated(
            &create_stack_path(
                psu_common::constants::STACK_TYPE_COMPOSE,
                options.endpoint_id,
            ),
            Method::POST,
            Some(body),
        )
    }

    fn stack_update(&self, options: &StackUpdateOptions) -> Result<(), ClientError> {
        let body = json_body(&StackUpdateRequest {
            stack_file_content: &options.stack_file_content,
            env: &options.env,
            prune: options.prune,
        })?;
        self.do_authenticated_no_content(
            &format!(
                "stacks/{}?endpointId={}",
                options.stack_id, options.endpoint_id
            ),
            Method::PUT,
            Some(body),
        )
    }

    fn stack_delete(&self, stack_id: StackId) -> Result<(), ClientError> {
        self.do_authenticated_no_content(&format!("stacks/{stack_id}"), Method::DELETE, None)
    }

    fn stack_file_inspect(&self, stack_id: StackId) -> Result<String, ClientError> {
        let response: StackFileInspectResponse =
            self.do_authenticated(&format!("stacks/{stack_id}/file"), Method::GET, None)?;
        Ok(response.stack_file_content)
    }

    fn status(&self) -> Result<Status, ClientError> {
        self.do_authenticated("status", Method::GET, None)
    }

    fn resource_control_create(
        &self,
        options: &ResourceControlCreateOptions,
    ) -> Result<ResourceControl, ClientError> {
        let body = json_body(&ResourceControlCreateRequest {
            resource_id: &options.resource_id,
            resource_type: options.resource_type,
            public: options.public,
            users: &options.users,
            teams: &options.teams,
            sub_resource_ids: &options.sub_resource_ids,
        })?;
        self.do_authenticated("resource_controls", Method::POST, Some(body))
    }

    fn resource_control_update(
        &self,
        options: &ResourceControlUpdateOptions,
    ) -> Result<ResourceControl, ClientError> {
        let body = json_body(&ResourceControlUpdateRequest {
            public: options.public,
            users: &options.users,
            teams: &options.teams,
        })?;
        self.do_authenticated(
            &format!("resource_controls/{}", options.id),
            Method::PUT,
            Some(body),
        )
    }

    fn resource_control_delete(&self, id: ResourceControlId) -> Result<(), ClientError> {
        self.do_authenticated_no_content(
            &format!("resource_controls/{id}"),
            Method::DELETE,
            None,
        )
    }

    fn user_list(&self) -> Result<Vec<User>, ClientError> {
        self.do_authenticated("users", Method::GET, None)
    }
}
