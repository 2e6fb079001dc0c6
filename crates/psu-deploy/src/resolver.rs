//! Name-based lookup of stacks, endpoints and endpoint groups.

use psu_client::PortainerApi;
use psu_client::api::StackListFilter;
use psu_common::constants::SWARM_CLUSTER_ID_PATH;
use psu_common::types::{Endpoint, EndpointGroup, EndpointId, Stack};
use serde_json::{Map, Value};

use crate::error::ResolveError;

/// Where a stack name is looked up: an endpoint, and the swarm cluster
/// behind it when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackScope {
    /// Owning endpoint.
    pub endpoint_id: EndpointId,
    /// Swarm cluster id, `None` for plain engines.
    pub swarm_cluster_id: Option<String>,
}

impl StackScope {
    /// The stack-list filter matching this scope.
    #[must_use]
    pub fn filter(&self) -> StackListFilter {
        StackListFilter::scoped(self.swarm_cluster_id.as_deref(), self.endpoint_id)
    }
}

/// Reads the swarm cluster id of an endpoint from its Docker info.
///
/// # Errors
///
/// Returns `ResolveError::NotSwarm` when `Swarm.Cluster.ID` is missing (or
/// null) at any level, `ResolveError::InvalidDockerInfo` when it is present
/// but not a string, and the client error for any failed call.
pub fn swarm_cluster_id(
    api: &dyn PortainerApi,
    endpoint_id: EndpointId,
) -> Result<String, ResolveError> {
    let info = api.endpoint_docker_info(endpoint_id)?;
    match select_value(&info, &SWARM_CLUSTER_ID_PATH) {
        Some(Value::String(id)) => {
            tracing::debug!(endpoint = %endpoint_id, cluster = %id, "swarm cluster found");
            Ok(id.clone())
        }
        Some(_) => Err(ResolveError::InvalidDockerInfo {
            endpoint: endpoint_id,
        }),
        None => {
            tracing::debug!(endpoint = %endpoint_id, "not a swarm cluster");
            Err(ResolveError::NotSwarm {
                endpoint: endpoint_id,
            })
        }
    }
}

/// Walks `path` through nested objects. Null counts as missing.
fn select_value<'a>(map: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut current = map;
    for key in parents {
        current = current.get(*key)?.as_object()?;
    }
    current.get(*last).filter(|value| !value.is_null())
}

/// Determines the scope of an endpoint, probing it for a swarm cluster.
///
/// # Errors
///
/// Returns any error of [`swarm_cluster_id`] except `NotSwarm`, which yields
/// a scope without cluster id.
pub fn stack_scope(
    api: &dyn PortainerApi,
    endpoint_id: EndpointId,
) -> Result<StackScope, ResolveError> {
    let swarm_cluster_id = match swarm_cluster_id(api, endpoint_id) {
        Ok(id) => Some(id),
        Err(ResolveError::NotSwarm { .. }) => None,
        Err(other) => return Err(other),
    };
    Ok(StackScope {
        endpoint_id,
        swarm_cluster_id,
    })
}

/// Finds a stack by exact name within `scope`. The first match wins.
///
/// # Errors
///
/// Returns `ResolveError::StackNotFound` if no stack matches.
pub fn stack_by_name(
    api: &dyn PortainerApi,
    name: &str,
    scope: &StackScope,
) -> Result<Stack, ResolveError> {
    tracing::debug!(stack = name, endpoint = %scope.endpoint_id, "looking up stack");
    api.stack_list(&scope.filter())?
        .into_iter()
        .find(|stack| stack.name == name)
        .ok_or_else(|| ResolveError::StackNotFound {
            name: name.to_string(),
        })
}

/// Returns the only registered endpoint.
///
/// # Errors
///
/// Returns `ResolveError::NoEndpoints` or `ResolveError::AmbiguousEndpoint`
/// unless exactly one endpoint exists.
pub fn default_endpoint(api: &dyn PortainerApi) -> Result<Endpoint, ResolveError> {
    let mut endpoints = api.endpoint_list()?;
    match endpoints.len() {
        0 => Err(ResolveError::NoEndpoints),
        1 => Ok(endpoints.remove(0)),
        count => Err(ResolveError::AmbiguousEndpoint { count }),
    }
}

/// Finds an endpoint by exact name.
///
/// # Errors
///
/// Returns `ResolveError::EndpointNotFound` if no endpoint matches.
pub fn endpoint_by_name(api: &dyn PortainerApi, name: &str) -> Result<Endpoint, ResolveError> {
    api.endpoint_list()?
        .into_iter()
        .find(|endpoint| endpoint.name == name)
        .ok_or_else(|| ResolveError::EndpointNotFound {
            name: name.to_string(),
        })
}

/// Resolves an optional endpoint name, falling back to the default
/// endpoint when none is given.
///
/// # Errors
///
/// See [`endpoint_by_name`] and [`default_endpoint`].
pub fn endpoint_or_default(
    api: &dyn PortainerApi,
    name: Option<&str>,
) -> Result<Endpoint, ResolveError> {
    if let Some(name) = name {
        return endpoint_by_name(api, name);
    }
    tracing::warn!("endpoint not set, the command fails unless exactly one endpoint exists");
    let endpoint = default_endpoint(api)?;
    tracing::debug!(endpoint = %endpoint.name, "using the only available endpoint");
    Ok(endpoint)
}

/// Finds an endpoint group by exact name.
///
/// # Errors
///
/// Returns `ResolveError::EndpointGroupNotFound` if no group matches.
pub fn endpoint_group_by_name(
    api: &dyn PortainerApi,
    name: &str,
) -> Result<EndpointGroup, ResolveError> {
    api.endpoint_group_list()?
        .into_iter()
        .find(|group| group.name == name)
        .ok_or_else(|| ResolveError::EndpointGroupNotFound {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{FakeApi, endpoint, stack};

    fn info(value: Value) -> Map<String, Value> {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn cluster_id_found_at_nested_path() {
        let api = FakeApi::default().with_docker_info(info(json!({
            "Swarm": {"Cluster": {"ID": "c1"}}
        })));
        assert_eq!(
            swarm_cluster_id(&api, EndpointId::new(1)).expect("swarm"),
            "c1"
        );
    }

    #[test]
    fn cluster_id_missing_at_any_level_is_not_swarm() {
        let payloads = [
            json!({}),
            json!({"Swarm": null}),
            json!({"Swarm": {}}),
            json!({"Swarm": {"NodeID": "", "LocalNodeState": "inactive"}}),
            json!({"Swarm": {"Cluster": {}}}),
            json!({"Swarm": {"Cluster": {"ID": null}}}),
            json!({"Swarm": "inactive"}),
        ];
        for payload in payloads {
            let api = FakeApi::default().with_docker_info(info(payload.clone()));
            let result = swarm_cluster_id(&api, EndpointId::new(1));
            assert!(
                matches!(result, Err(ResolveError::NotSwarm { .. })),
                "payload {payload} gave {result:?}"
            );
        }
    }

    #[test]
    fn non_string_cluster_id_is_invalid() {
        let api = FakeApi::default().with_docker_info(info(json!({
            "Swarm": {"Cluster": {"ID": 7}}
        })));
        assert!(matches!(
            swarm_cluster_id(&api, EndpointId::new(1)),
            Err(ResolveError::InvalidDockerInfo { .. })
        ));
    }

    #[test]
    fn docker_info_failure_propagates() {
        let api = FakeApi::default();
        api.fail_next("endpoint_docker_info");
        assert!(matches!(
            swarm_cluster_id(&api, EndpointId::new(1)),
            Err(ResolveError::Client(_))
        ));
    }

    #[test]
    fn scope_without_swarm_has_no_cluster_id() {
        let api = FakeApi::default();
        let scope = stack_scope(&api, EndpointId::new(4)).expect("scope");
        assert_eq!(scope.swarm_cluster_id, None);
        assert_eq!(scope.filter(), StackListFilter::scoped(None, EndpointId::new(4)));
    }

    #[test]
    fn stack_lookup_is_exact_and_first_match_wins() {
        let api = FakeApi::default().with_stacks(vec![
            stack(3, "web-2", &[]),
            stack(1, "web", &[]),
            stack(2, "web", &[]),
        ]);
        let scope = StackScope {
            endpoint_id: EndpointId::new(1),
            swarm_cluster_id: Some("c1".into()),
        };

        let found = stack_by_name(&api, "web", &scope).expect("stack");
        assert_eq!(found.id.get(), 1);
        assert!(matches!(
            stack_by_name(&api, "we", &scope),
            Err(ResolveError::StackNotFound { .. })
        ));
        assert_eq!(
            api.stack_list_filters(),
            vec![
                StackListFilter::scoped(Some("c1"), EndpointId::new(1)),
                StackListFilter::scoped(Some("c1"), EndpointId::new(1)),
            ]
        );
    }

    #[test]
    fn default_endpoint_needs_exactly_one() {
        let api = FakeApi::default().with_endpoints(vec![]);
        assert!(matches!(
            default_endpoint(&api),
            Err(ResolveError::NoEndpoints)
        ));

        let api = FakeApi::default().with_endpoints(vec![endpoint(1, "a"), endpoint(2, "b")]);
        assert!(matches!(
            default_endpoint(&api),
            Err(ResolveError::AmbiguousEndpoint { count: 2 })
        ));

        let api = FakeApi::default().with_endpoints(vec![endpoint(5, "only")]);
        assert_eq!(default_endpoint(&api).expect("endpoint").name, "only");
    }

    #[test]
    fn endpoint_resolution_by_name_or_default() {
        let api = FakeApi::default().with_endpoints(vec![endpoint(1, "a"), endpoint(2, "b")]);
        assert_eq!(
            endpoint_or_default(&api, Some("b")).expect("b").id,
            EndpointId::new(2)
        );
        assert!(matches!(
            endpoint_or_default(&api, Some("c")),
            Err(ResolveError::EndpointNotFound { .. })
        ));
        assert!(matches!(
            endpoint_or_default(&api, None),
            Err(ResolveError::AmbiguousEndpoint { .. })
        ));
    }

    #[test]
    fn endpoint_group_lookup() {
        let api = FakeApi::default();
        assert_eq!(
            endpoint_group_by_name(&api, "Unassigned")
                .expect("group")
                .id
                .get(),
            1
        );
        assert!(matches!(
            endpoint_group_by_name(&api, "prod"),
            Err(ResolveError::EndpointGroupNotFound { .. })
        ));
    }
}
