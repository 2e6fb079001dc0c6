//! Reconciler error enums.
//!
//! Not-found conditions are variants of their own so callers can branch on
//! them exhaustively instead of inspecting error text.

use psu_client::ClientError;
use psu_common::types::{EndpointId, ResourceType};
use thiserror::Error;

/// Failure to locate a stack, endpoint or group.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No stack with this name exists in the scope.
    #[error("stack {name} not found")]
    StackNotFound {
        /// Name that was looked up.
        name: String,
    },

    /// The endpoint's Docker engine is not part of a swarm cluster.
    #[error("endpoint {endpoint} is not a swarm cluster")]
    NotSwarm {
        /// Endpoint whose Docker info was read.
        endpoint: EndpointId,
    },

    /// No endpoint with this name is registered.
    #[error("endpoint {name} not found")]
    EndpointNotFound {
        /// Name that was looked up.
        name: String,
    },

    /// No endpoint group with this name exists.
    #[error("endpoint group {name} not found")]
    EndpointGroupNotFound {
        /// Name that was looked up.
        name: String,
    },

    /// A default endpoint was needed but none is registered.
    #[error("no endpoints available")]
    NoEndpoints,

    /// A default endpoint was needed but several are registered.
    #[error("several endpoints available ({count}), select one with --endpoint")]
    AmbiguousEndpoint {
        /// Number of registered endpoints.
        count: usize,
    },

    /// The Docker info payload has a swarm cluster id that is not a string.
    #[error("unexpected swarm cluster id in docker info of endpoint {endpoint}")]
    InvalidDockerInfo {
        /// Endpoint whose Docker info was read.
        endpoint: EndpointId,
    },

    /// A remote call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Failure of a stack deployment or removal.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The stack does not exist yet and no stack file was given.
    #[error("stack {name} does not exist, a stack file is required to create it")]
    MissingStackFile {
        /// Stack name.
        name: String,
    },

    /// Resolution failed with something other than "stack not found".
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A remote call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Failure of an access-control change.
#[derive(Debug, Error)]
pub enum AccessError {
    /// More than one visibility flag was given.
    #[error("only one of --admins, --private or --public can be used")]
    ConflictingVisibility,

    /// No visibility flag was given.
    #[error("one of --admins, --private or --public is required")]
    MissingVisibility,

    /// The resource has no access control attached.
    #[error("no access control found for {resource_type} {resource_id}")]
    ControlNotFound {
        /// Kind of resource.
        resource_type: ResourceType,
        /// Resource identifier.
        resource_id: String,
    },

    /// The session's user is not in the user list.
    #[error("user {username} not found")]
    UserNotFound {
        /// Username that was looked up.
        username: String,
    },

    /// The resource could not be located.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A remote call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_messages_are_actionable() {
        assert_eq!(
            ResolveError::AmbiguousEndpoint { count: 3 }.to_string(),
            "several endpoints available (3), select one with --endpoint"
        );
        assert_eq!(
            ResolveError::NotSwarm {
                endpoint: EndpointId::new(2)
            }
            .to_string(),
            "endpoint 2 is not a swarm cluster"
        );
        assert_eq!(
            AccessError::ControlNotFound {
                resource_type: ResourceType::Volume,
                resource_id: "data".into()
            }
            .to_string(),
            "no access control found for volume data"
        );
    }

    #[test]
    fn client_errors_keep_their_message() {
        let error = DeployError::from(ResolveError::from(ClientError::hook("stop")));
        assert_eq!(error.to_string(), "request aborted by hook: stop");
    }
}
