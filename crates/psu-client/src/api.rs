//! The remote API as a trait.
//!
//! Reconcilers are written against [`PortainerApi`] so they can be driven by
//! the real HTTP client or by an in-memory fake.

use psu_common::types::{
    Endpoint, EndpointGroup, EndpointId, Pair, ResourceControl, ResourceControlId, ResourceType,
    Stack, StackId, Status, TeamId, User, UserId,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ClientError;

/// Scope filter for listing stacks. `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StackListFilter {
    /// Only stacks bound to this swarm cluster.
    #[serde(rename = "SwarmId", skip_serializing_if = "Option::is_none")]
    pub swarm_id: Option<String>,
    /// Only stacks owned by this endpoint.
    #[serde(rename = "EndpointId", skip_serializing_if = "Option::is_none")]
    pub endpoint_id: Option<EndpointId>,
}

impl StackListFilter {
    /// Builds a filter for an endpoint and optional swarm cluster.
    ///
    /// Empty cluster ids and endpoint id 0 mean "no filter".
    #[must_use]
    pub fn scoped(swarm_id: Option<&str>, endpoint_id: EndpointId) -> Self {
        Self {
            swarm_id: swarm_id.filter(|id| !id.is_empty()).map(str::to_string),
            endpoint_id: (endpoint_id.get() != 0).then_some(endpoint_id),
        }
    }
}

/// Parameters for creating a swarm stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackCreateSwarmOptions {
    /// Stack name.
    pub name: String,
    /// Environment variables.
    pub env: Vec<Pair>,
    /// Stack file content.
    pub stack_file_content: String,
    /// Target swarm cluster.
    pub swarm_cluster_id: String,
    /// Endpoint the cluster is reached through.
    pub endpoint_id: EndpointId,
}

/// Parameters for creating a compose stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackCreateComposeOptions {
    /// Stack name.
    pub name: String,
    /// Environment variables.
    pub env: Vec<Pair>,
    /// Stack file content.
    pub stack_file_content: String,
    /// Target endpoint.
    pub endpoint_id: EndpointId,
}

/// Parameters for updating an existing stack in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackUpdateOptions {
    /// Stack to update.
    pub stack_id: StackId,
    /// Effective environment variables.
    pub env: Vec<Pair>,
    /// New stack file content.
    pub stack_file_content: String,
    /// Remove services no longer in the stack file.
    pub prune: bool,
    /// Owning endpoint.
    pub endpoint_id: EndpointId,
}

/// Parameters for creating a resource control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceControlCreateOptions {
    /// Controlled resource.
    pub resource_id: String,
    /// Kind of the controlled resource.
    pub resource_type: ResourceType,
    /// Visible to everyone.
    pub public: bool,
    /// Users granted access.
    pub users: Vec<UserId>,
    /// Teams granted access.
    pub teams: Vec<TeamId>,
    /// Resources covered alongside the main one.
    pub sub_resource_ids: Vec<String>,
}

/// Parameters for updating a resource control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceControlUpdateOptions {
    /// Control to update.
    pub id: ResourceControlId,
    /// Visible to everyone.
    pub public: bool,
    /// Users granted access.
    pub users: Vec<UserId>,
    /// Teams granted access.
    pub teams: Vec<TeamId>,
}

/// Typed operations exposed by the management server.
///
/// Every method except [`username`](Self::username) performs one
/// authenticated round trip.
pub trait PortainerApi: Send + Sync {
    /// Username the session authenticates as.
    fn username(&self) -> &str;

    /// Lists registered endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn endpoint_list(&self) -> Result<Vec<Endpoint>, ClientError>;

    /// Lists endpoint groups.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn endpoint_group_list(&self) -> Result<Vec<EndpointGroup>, ClientError>;

    /// Fetches the raw Docker `info` payload of an endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure, or if the payload is not
    /// a JSON object.
    fn endpoint_docker_info(&self, endpoint_id: EndpointId)
    -> Result<Map<String, Value>, ClientError>;

    /// Performs a `GET` through the endpoint's Docker API proxy.
    ///
    /// `path` is relative to the Docker API root, e.g. `volumes/data`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn endpoint_docker_get(&self, endpoint_id: EndpointId, path: &str)
    -> Result<Value, ClientError>;

    /// Lists stacks matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn stack_list(&self, filter: &StackListFilter) -> Result<Vec<Stack>, ClientError>;

    /// Creates a swarm stack and returns the server's record.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn stack_create_swarm(&self, options: &StackCreateSwarmOptions) -> Result<Stack, ClientError>;

    /// Creates a compose stack and returns the server's record.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn stack_create_compose(&self, options: &StackCreateComposeOptions)
    -> Result<Stack, ClientError>;

    /// Updates an existing stack.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn stack_update(&self, options: &StackUpdateOptions) -> Result<(), ClientError>;

    /// Deletes a stack.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn stack_delete(&self, stack_id: StackId) -> Result<(), ClientError>;

    /// Fetches the content of a stack's file.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn stack_file_inspect(&self, stack_id: StackId) -> Result<String, ClientError>;

    /// Fetches server status.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn status(&self) -> Result<Status, ClientError>;

    /// Creates a resource control.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure; a control that already
    /// exists yields a structured 409 error.
    fn resource_control_create(
        &self,
        options: &ResourceControlCreateOptions,
    ) -> Result<ResourceControl, ClientError>;

    /// Updates a resource control.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn resource_control_update(
        &self,
        options: &ResourceControlUpdateOptions,
    ) -> Result<ResourceControl, ClientError>;

    /// Deletes a resource control.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn resource_control_delete(&self, id: ResourceControlId) -> Result<(), ClientError>;

    /// Lists users.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure.
    fn user_list(&self) -> Result<Vec<User>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_omits_unset_fields() {
        let filter = StackListFilter::scoped(None, EndpointId::new(3));
        assert_eq!(
            serde_json::to_string(&filter).expect("json"),
            r#"{"EndpointId":3}"#
        );

        let filter = StackListFilter::scoped(Some("c1"), EndpointId::new(1));
        assert_eq!(
            serde_json::to_string(&filter).expect("json"),
            r#"{"SwarmId":"c1","EndpointId":1}"#
        );
    }

    #[test]
    fn zero_values_mean_no_filter() {
        let filter = StackListFilter::scoped(Some(""), EndpointId::new(0));
        assert_eq!(filter, StackListFilter::default());
        assert_eq!(serde_json::to_string(&filter).expect("json"), "{}");
    }
}
