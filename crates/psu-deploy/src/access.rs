//! Resource-control reconciliation.
//!
//! Admins-only visibility is the absence of a control, so it maps to a
//! delete. Private and public visibility try a create first and fall back to
//! updating the existing control when the server answers with a conflict.

use psu_client::api::{ResourceControlCreateOptions, ResourceControlUpdateOptions};
use psu_client::{ClientError, PortainerApi};
use psu_common::types::{EndpointId, ResourceControl, ResourceControlId, ResourceType, UserId};
use serde_json::Value;

use crate::error::AccessError;
use crate::resolver;

/// Who can see a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Administrators only.
    AdminsOnly,
    /// The current user only.
    Private,
    /// Every user.
    Public,
}

impl Visibility {
    /// Builds the visibility from the three mutually exclusive flags.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::ConflictingVisibility` when more than one flag
    /// is set and `AccessError::MissingVisibility` when none is.
    pub fn from_flags(admins: bool, private: bool, public: bool) -> Result<Self, AccessError> {
        match (admins, private, public) {
            (true, false, false) => Ok(Self::AdminsOnly),
            (false, true, false) => Ok(Self::Private),
            (false, false, true) => Ok(Self::Public),
            (false, false, false) => Err(AccessError::MissingVisibility),
            _ => Err(AccessError::ConflictingVisibility),
        }
    }
}

/// Access change for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    /// Kind of resource.
    pub resource_type: ResourceType,
    /// Stack name, or Docker object id/name.
    pub resource_id: String,
    /// Endpoint the resource lives on.
    pub endpoint_id: EndpointId,
    /// Desired visibility.
    pub visibility: Visibility,
}

/// What the reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    /// A new control was created.
    Created(ResourceControl),
    /// The existing control was updated.
    Updated(ResourceControl),
    /// The existing control was deleted.
    Removed(ResourceControlId),
    /// No control existed, so the resource was already admins-only.
    Unchanged,
}

/// Docker API path that inspects a resource, relative to the Docker root.
///
/// Stacks are not Docker objects and have no such path.
#[must_use]
pub fn docker_inspect_path(resource_type: ResourceType, resource_id: &str) -> Option<String> {
    let path = match resource_type {
        ResourceType::Container => format!("containers/{resource_id}/json"),
        ResourceType::Service => format!("services/{resource_id}"),
        ResourceType::Volume => format!("volumes/{resource_id}"),
        ResourceType::Network => format!("networks/{resource_id}"),
        ResourceType::Secret => format!("secrets/{resource_id}"),
        ResourceType::Config => format!("configs/{resource_id}"),
        ResourceType::Stack => return None,
    };
    Some(path)
}

/// Finds the control attached to a resource.
///
/// Stacks carry it in their own record. Docker objects carry it under
/// `Portainer.ResourceControl` in the inspect payload returned by the
/// endpoint's Docker proxy.
///
/// # Errors
///
/// Returns `AccessError::ControlNotFound` if the resource has no control,
/// and resolver or client errors if the resource cannot be fetched.
pub fn find_access_control(
    api: &dyn PortainerApi,
    resource_type: ResourceType,
    resource_id: &str,
    endpoint_id: EndpointId,
) -> Result<ResourceControl, AccessError> {
    let not_found = || AccessError::ControlNotFound {
        resource_type,
        resource_id: resource_id.to_string(),
    };
    let Some(path) = docker_inspect_path(resource_type, resource_id) else {
        let scope = resolver::stack_scope(api, endpoint_id)?;
        let stack = resolver::stack_by_name(api, resource_id, &scope)?;
        return stack.resource_control.ok_or_else(not_found);
    };

    let object = api.endpoint_docker_get(endpoint_id, &path)?;
    match object.pointer("/Portainer/ResourceControl") {
        None | Some(Value::Null) => Err(not_found()),
        Some(control) => serde_json::from_value(control.clone()).map_err(|e| {
            ClientError::Decode {
                path,
                source: e,
            }
            .into()
        }),
    }
}

fn current_user_id(api: &dyn PortainerApi) -> Result<UserId, AccessError> {
    let username = api.username();
    api.user_list()?
        .into_iter()
        .find(|user| user.username == username)
        .map(|user| user.id)
        .ok_or_else(|| AccessError::UserNotFound {
            username: username.to_string(),
        })
}

/// Brings a resource's control in line with the requested visibility.
///
/// # Errors
///
/// Returns the first resolver or client error. A conflict on create is not
/// an error; any other create failure is.
pub fn set_access(
    api: &dyn PortainerApi,
    request: &AccessRequest,
) -> Result<AccessOutcome, AccessError> {
    tracing::debug!(
        resource = %request.resource_id,
        kind = %request.resource_type,
        endpoint = %request.endpoint_id,
        "getting access control info"
    );
    let outcome = match request.visibility {
        Visibility::AdminsOnly => remove_control(api, request)?,
        Visibility::Private | Visibility::Public => upsert_control(api, request)?,
    };
    tracing::info!(
        resource = %request.resource_id,
        kind = %request.resource_type,
        "access control set"
    );
    Ok(outcome)
}

fn remove_control(
    api: &dyn PortainerApi,
    request: &AccessRequest,
) -> Result<AccessOutcome, AccessError> {
    match find_access_control(
        api,
        request.resource_type,
        &request.resource_id,
        request.endpoint_id,
    ) {
        Ok(control) => {
            api.resource_control_delete(control.id)?;
            Ok(AccessOutcome::Removed(control.id))
        }
        Err(AccessError::ControlNotFound { .. }) => {
            tracing::debug!(resource = %request.resource_id, "no access control to remove");
            Ok(AccessOutcome::Unchanged)
        }
        Err(other) => Err(other),
    }
}

fn upsert_control(
    api: &dyn PortainerApi,
    request: &AccessRequest,
) -> Result<AccessOutcome, AccessError> {
    let public = request.visibility == Visibility::Public;
    let users = if request.visibility == Visibility::Private {
        vec![current_user_id(api)?]
    } else {
        Vec::new()
    };

    let create = ResourceControlCreateOptions {
        resource_id: request.resource_id.clone(),
        resource_type: request.resource_type,
        public,
        users: users.clone(),
        teams: Vec::new(),
        sub_resource_ids: Vec::new(),
    };
    match api.resource_control_create(&create) {
        Ok(control) => Ok(AccessOutcome::Created(control)),
        Err(error) if error.is_conflict() => {
            tracing::debug!(resource = %request.resource_id, "access control exists, updating");
            let existing = find_access_control(
                api,
                request.resource_type,
                &request.resource_id,
                request.endpoint_id,
            )?;
            let control = api.resource_control_update(&ResourceControlUpdateOptions {
                id: existing.id,
                public,
                users,
                teams: Vec::new(),
            })?;
            Ok(AccessOutcome::Updated(control))
        }
        Err(error) => Err(error.into()),
    }
}
