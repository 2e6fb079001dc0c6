//! Domain types mirroring the remote API's resources.
//!
//! Field names follow the wire format of the management server (mostly
//! PascalCase). Everything here is a plain data record: the client never
//! assigns identifiers, it only echoes what the server returned.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Returns the raw identifier.
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a registered Docker endpoint.
    EndpointId
);
numeric_id!(
    /// Identifier of an endpoint group.
    EndpointGroupId
);
numeric_id!(
    /// Identifier of a deployed stack.
    StackId
);
numeric_id!(
    /// Identifier of a user account.
    UserId
);
numeric_id!(
    /// Identifier of a team.
    TeamId
);
numeric_id!(
    /// Identifier of a resource-control record.
    ResourceControlId
);

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Kind of Docker host behind an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum EndpointType {
    /// Plain Docker engine API.
    Docker,
    /// Portainer agent.
    Agent,
    /// Azure container instances.
    Azure,
    /// Edge agent.
    EdgeAgent,
    /// A discriminant this client does not know about.
    Other(u8),
}

impl From<u8> for EndpointType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Docker,
            2 => Self::Agent,
            3 => Self::Azure,
            4 => Self::EdgeAgent,
            other => Self::Other(other),
        }
    }
}

impl From<EndpointType> for u8 {
    fn from(value: EndpointType) -> Self {
        match value {
            EndpointType::Docker => 1,
            EndpointType::Agent => 2,
            EndpointType::Azure => 3,
            EndpointType::EdgeAgent => 4,
            EndpointType::Other(other) => other,
        }
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Agent => write!(f, "agent"),
            Self::Azure => write!(f, "azure"),
            Self::EdgeAgent => write!(f, "edge-agent"),
            Self::Other(_) => write!(f, "unknown"),
        }
    }
}

/// A remote Docker host registration. Read-only from the client's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Endpoint {
    /// Server-assigned identifier.
    pub id: EndpointId,
    /// Unique name, used as the human lookup key.
    pub name: String,
    /// Kind of host.
    #[serde(rename = "Type")]
    pub kind: EndpointType,
    /// Docker API URL.
    #[serde(rename = "URL", default)]
    pub url: String,
    /// URL under which published ports are reachable.
    #[serde(rename = "PublicURL", default)]
    pub public_url: String,
    /// Group this endpoint belongs to.
    #[serde(default)]
    pub group_id: EndpointGroupId,
}

/// A named group of endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointGroup {
    /// Server-assigned identifier.
    pub id: EndpointGroupId,
    /// Group name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Deployment mode of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum StackType {
    /// Docker Swarm stack, bound to a swarm cluster.
    Swarm,
    /// Docker Compose project on a single engine.
    Compose,
    /// A discriminant this client does not know about.
    Other(u8),
}

impl From<u8> for StackType {
    fn from(value: u8) -> Self {
        match value {
            crate::constants::STACK_TYPE_SWARM => Self::Swarm,
            crate::constants::STACK_TYPE_COMPOSE => Self::Compose,
            other => Self::Other(other),
        }
    }
}

impl From<StackType> for u8 {
    fn from(value: StackType) -> Self {
        match value {
            StackType::Swarm => crate::constants::STACK_TYPE_SWARM,
            StackType::Compose => crate::constants::STACK_TYPE_COMPOSE,
            StackType::Other(other) => other,
        }
    }
}

impl fmt::Display for StackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Swarm => write!(f, "swarm"),
            Self::Compose => write!(f, "compose"),
            Self::Other(_) => write!(f, "unknown"),
        }
    }
}

/// One environment variable of a stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    /// Variable name, unique within a stack's env set.
    pub name: String,
    /// Variable value.
    pub value: String,
}

impl Pair {
    /// Creates a pair from anything string-like.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// A deployed Compose or Swarm stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stack {
    /// Server-assigned identifier.
    pub id: StackId,
    /// Name, unique per endpoint/cluster scope.
    pub name: String,
    /// Deployment mode.
    #[serde(rename = "Type")]
    pub kind: StackType,
    /// Owning endpoint.
    #[serde(default)]
    pub endpoint_id: EndpointId,
    /// Swarm cluster id; empty for compose stacks.
    #[serde(default, deserialize_with = "null_as_default")]
    pub swarm_id: String,
    /// Entry-point file inside the project.
    #[serde(default, deserialize_with = "null_as_default")]
    pub entry_point: String,
    /// Project path on the server.
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_path: String,
    /// Environment variables, in server order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: Vec<Pair>,
    /// Access control attached to this stack, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_control: Option<ResourceControl>,
    /// Unix timestamp of creation.
    #[serde(default)]
    pub creation_date: i64,
    /// Name of the creating user.
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_by: String,
}

impl Stack {
    /// Returns the swarm cluster id for swarm stacks.
    #[must_use]
    pub fn swarm_cluster_id(&self) -> Option<&str> {
        (!self.swarm_id.is_empty()).then_some(self.swarm_id.as_str())
    }
}

/// Kind of resource a resource control applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Docker container.
    Container,
    /// Docker swarm service.
    Service,
    /// Docker volume.
    Volume,
    /// Docker network.
    Network,
    /// Docker swarm secret.
    Secret,
    /// Docker swarm config.
    Config,
    /// Stack managed by the server.
    Stack,
}

impl ResourceType {
    /// Returns the wire tag of this resource type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Service => "service",
            Self::Volume => "volume",
            Self::Network => "network",
            Self::Secret => "secret",
            Self::Config => "config",
            Self::Stack => "stack",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access granted to a single user by a resource control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserAccess {
    /// User the access applies to.
    pub user_id: UserId,
    /// Server-defined access level.
    #[serde(default)]
    pub access_level: u8,
}

/// Access granted to a team by a resource control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeamAccess {
    /// Team the access applies to.
    pub team_id: TeamId,
    /// Server-defined access level.
    #[serde(default)]
    pub access_level: u8,
}

/// Access-control record binding a resource to a visibility policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceControl {
    /// Server-assigned identifier.
    pub id: ResourceControlId,
    /// Identifier of the controlled resource.
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_id: String,
    /// Resources covered alongside the main one.
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_resource_ids: Vec<String>,
    /// Users with access.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_accesses: Vec<UserAccess>,
    /// Teams with access.
    #[serde(default, deserialize_with = "null_as_default")]
    pub team_accesses: Vec<TeamAccess>,
    /// Whether every user can see the resource.
    #[serde(default)]
    pub public: bool,
    /// Whether only administrators can see the resource.
    #[serde(default)]
    pub administrators_only: bool,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    /// Server-assigned identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Server-defined role (1 administrator, 2 standard user).
    #[serde(default)]
    pub role: u8,
}

/// Server status and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Status {
    /// Server version string.
    pub version: String,
    /// Instance identifier.
    #[serde(rename = "InstanceID", default)]
    pub instance_id: String,
    /// Whether authentication is enabled (older servers only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<bool>,
    /// Whether endpoint management is enabled (older servers only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_management: Option<bool>,
    /// Whether analytics are enabled (older servers only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<bool>,
}

/// Error envelope returned by the server on non-2xx responses.
///
/// Older servers send `{"Err", "Details"}`, newer ones
/// `{"message", "details"}`; both decode into this type. `code` is the
/// HTTP status and never comes from the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericError {
    /// HTTP status code of the response carrying this envelope.
    #[serde(skip)]
    pub code: u16,
    /// Short message.
    #[serde(rename = "Err", alias = "message", default)]
    pub err: String,
    /// Detail text.
    #[serde(rename = "Details", alias = "details", default)]
    pub details: String,
}

impl GenericError {
    /// Returns true when the envelope carries neither message nor detail.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.err.is_empty() && self.details.is_empty()
    }
}

impl fmt::Display for GenericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.err.is_empty(), self.details.is_empty()) {
            (_, true) => f.write_str(&self.err),
            (true, false) => f.write_str(&self.details),
            (false, false) => write!(f, "{}: {}", self.err, self.details),
        }
    }
}

impl std::error::Error for GenericError {}
