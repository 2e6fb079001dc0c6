//! Create-or-update stack deployment.
//!
//! A deployment resolves the stack name in the endpoint's scope first. A
//! found stack is updated in place; a missing one is created as a swarm or
//! compose stack depending on what the endpoint runs. Nothing is persisted
//! between invocations.

use psu_client::PortainerApi;
use psu_client::api::{StackCreateComposeOptions, StackCreateSwarmOptions, StackUpdateOptions};
use psu_common::types::{EndpointId, Pair, Stack, StackId};

use crate::env::EnvPolicy;
use crate::error::{DeployError, ResolveError};
use crate::resolver::{self, StackScope};

/// A named deployment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// Stack name.
    pub name: String,
    /// Target endpoint.
    pub endpoint_id: EndpointId,
    /// Replacement stack file content. Required to create a stack; when
    /// updating, `None` keeps the content stored on the server.
    pub stack_file_content: Option<String>,
    /// Caller-supplied environment variables.
    pub env: Vec<Pair>,
    /// How `env` combines with an existing stack's variables.
    pub env_policy: EnvPolicy,
    /// Prune services no longer referenced (swarm stacks only).
    pub prune: bool,
}

impl DeployRequest {
    /// A request with no env, default policy and no prune.
    #[must_use]
    pub fn new(name: impl Into<String>, endpoint_id: EndpointId) -> Self {
        Self {
            name: name.into(),
            endpoint_id,
            stack_file_content: None,
            env: Vec::new(),
            env_policy: EnvPolicy::default(),
            prune: false,
        }
    }
}

/// Result of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// A new stack was created; carries the server's record.
    Created(Stack),
    /// An existing stack was updated.
    Updated {
        /// Identifier of the updated stack.
        id: StackId,
    },
}

/// Result of a stack removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The stack existed and was deleted.
    Removed {
        /// Identifier of the deleted stack.
        id: StackId,
    },
    /// No stack with that name exists in the scope.
    Absent,
}

/// Drives stack reconciliation against a remote API.
pub struct Deployer<'a> {
    api: &'a dyn PortainerApi,
}

impl<'a> Deployer<'a> {
    /// Creates a deployer over `api`.
    #[must_use]
    pub const fn new(api: &'a dyn PortainerApi) -> Self {
        Self { api }
    }

    /// Deploys a stack, creating it or updating it in place.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::MissingStackFile` when the stack does not exist
    /// and no content was given, and the first resolver or client error
    /// otherwise. No call is retried.
    pub fn deploy(&self, request: &DeployRequest) -> Result<DeployOutcome, DeployError> {
        let scope = resolver::stack_scope(self.api, request.endpoint_id)?;
        match resolver::stack_by_name(self.api, &request.name, &scope) {
            Ok(stack) => {
                tracing::debug!(stack = %stack.name, id = %stack.id, "stack found, updating");
                self.update(&stack, request)
            }
            Err(ResolveError::StackNotFound { .. }) => {
                tracing::debug!(stack = %request.name, "stack not found, creating");
                self.create(&scope, request)
            }
            Err(other) => Err(other.into()),
        }
    }

    fn update(&self, stack: &Stack, request: &DeployRequest) -> Result<DeployOutcome, DeployError> {
        let stack_file_content = match &request.stack_file_content {
            Some(content) => content.clone(),
            None => self.api.stack_file_inspect(stack.id)?,
        };
        let options = StackUpdateOptions {
            stack_id: stack.id,
            env: request.env_policy.apply(&stack.env, &request.env),
            stack_file_content,
            prune: request.prune,
            endpoint_id: request.endpoint_id,
        };
        self.api.stack_update(&options)?;
        tracing::info!(stack = %stack.name, id = %stack.id, "stack updated");
        Ok(DeployOutcome::Updated { id: stack.id })
    }

    fn create(
        &self,
        scope: &StackScope,
        request: &DeployRequest,
    ) -> Result<DeployOutcome, DeployError> {
        let Some(stack_file_content) = request.stack_file_content.clone() else {
            return Err(DeployError::MissingStackFile {
                name: request.name.clone(),
            });
        };
        let stack = if let Some(cluster_id) = &scope.swarm_cluster_id {
            self.api.stack_create_swarm(&StackCreateSwarmOptions {
                name: request.name.clone(),
                env: request.env.clone(),
                stack_file_content,
                swarm_cluster_id: cluster_id.clone(),
                endpoint_id: request.endpoint_id,
            })?
        } else {
            self.api.stack_create_compose(&StackCreateComposeOptions {
                name: request.name.clone(),
                env: request.env.clone(),
                stack_file_content,
                endpoint_id: request.endpoint_id,
            })?
        };
        tracing::info!(stack = %stack.name, id = %stack.id, kind = %stack.kind, "stack created");
        Ok(DeployOutcome::Created(stack))
    }

    /// Looks a stack up by name in the endpoint's scope.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::StackNotFound` if it does not exist.
    pub fn find(&self, name: &str, endpoint_id: EndpointId) -> Result<Stack, ResolveError> {
        let scope = resolver::stack_scope(self.api, endpoint_id)?;
        resolver::stack_by_name(self.api, name, &scope)
    }

    /// Lists the stacks in the endpoint's scope.
    ///
    /// # Errors
    ///
    /// Returns the first resolver or client error.
    pub fn list(&self, endpoint_id: EndpointId) -> Result<Vec<Stack>, ResolveError> {
        let scope = resolver::stack_scope(self.api, endpoint_id)?;
        Ok(self.api.stack_list(&scope.filter())?)
    }

    /// Removes a stack by name.
    ///
    /// A missing stack is [`RemoveOutcome::Absent`], or an error when
    /// `strict` is set.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::StackNotFound` (strict only) or the first
    /// resolver or client error.
    pub fn remove(
        &self,
        name: &str,
        endpoint_id: EndpointId,
        strict: bool,
    ) -> Result<RemoveOutcome, DeployError> {
        match self.find(name, endpoint_id) {
            Ok(stack) => {
                self.api.stack_delete(stack.id)?;
                tracing::info!(stack = %stack.name, id = %stack.id, "stack removed");
                Ok(RemoveOutcome::Removed { id: stack.id })
            }
            Err(ResolveError::StackNotFound { .. }) if !strict => {
                tracing::info!(stack = name, "stack does not exist, nothing to remove");
                Ok(RemoveOutcome::Absent)
            }
            Err(other) => Err(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use psu_client::api::StackListFilter;
    use psu_common::types::StackType;

    use super::*;
    use crate::testing::{Call, FakeApi, stack};

    fn request(name: &str) -> DeployRequest {
        DeployRequest::new(name, EndpointId::new(1))
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<Pair> {
        items.iter().map(|(k, v)| Pair::new(*k, *v)).collect()
    }

    #[test]
    fn missing_stack_on_swarm_creates_swarm_stack() {
        let api = FakeApi::default().with_swarm("c1");
        let mut req = request("web");
        req.stack_file_content = Some("<app.yml content>".into());

        let outcome = Deployer::new(&api).deploy(&req).expect("deploy");

        let DeployOutcome::Created(created) = outcome else {
            panic!("expected create, got {outcome:?}");
        };
        assert_eq!(created.name, "web");
        assert_eq!(created.kind, StackType::Swarm);
        assert_eq!(
            api.mutations(),
            vec![Call::CreateSwarm(StackCreateSwarmOptions {
                name: "web".into(),
                env: vec![],
                stack_file_content: "<app.yml content>".into(),
                swarm_cluster_id: "c1".into(),
                endpoint_id: EndpointId::new(1),
            })]
        );
        assert_eq!(
            api.stack_list_filters(),
            vec![StackListFilter::scoped(Some("c1"), EndpointId::new(1))]
        );
    }

    #[test]
    fn missing_stack_on_plain_engine_creates_compose_stack() {
        let api = FakeApi::default();
        let mut req = request("db");
        req.stack_file_content = Some("services: {}".into());
        req.env = pairs(&[("FOO", "1")]);

        let outcome = Deployer::new(&api).deploy(&req).expect("deploy");

        assert!(matches!(outcome, DeployOutcome::Created(ref s) if s.kind == StackType::Compose));
        assert_eq!(
            api.mutations(),
            vec![Call::CreateCompose(StackCreateComposeOptions {
                name: "db".into(),
                env: pairs(&[("FOO", "1")]),
                stack_file_content: "services: {}".into(),
                endpoint_id: EndpointId::new(1),
            })]
        );
    }

    #[test]
    fn docker_info_is_fetched_once_per_deployment() {
        let api = FakeApi::default().with_swarm("c1");
        let mut req = request("web");
        req.stack_file_content = Some("x".into());
        let _ = Deployer::new(&api).deploy(&req).expect("deploy");

        let info_calls = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::DockerInfo(_)))
            .count();
        assert_eq!(info_calls, 1);
    }

    #[test]
    fn missing_stack_without_file_fails_before_any_mutation() {
        let api = FakeApi::default();
        let err = Deployer::new(&api)
            .deploy(&request("web"))
            .expect_err("no stack file");
        assert!(matches!(err, DeployError::MissingStackFile { ref name } if name == "web"));
        assert!(api.mutations().is_empty());
    }

    #[test]
    fn existing_stack_is_updated_with_merged_env() {
        let api = FakeApi::default().with_stacks(vec![stack(7, "web", &[("FOO", "1")])]);
        let mut req = request("web");
        req.env = pairs(&[("FOO", "2"), ("BAR", "3")]);

        let outcome = Deployer::new(&api).deploy(&req).expect("deploy");

        assert_eq!(outcome, DeployOutcome::Updated { id: StackId::new(7) });
        assert_eq!(
            api.mutations(),
            vec![Call::Update(StackUpdateOptions {
                stack_id: StackId::new(7),
                env: pairs(&[("FOO", "2"), ("BAR", "3")]),
                stack_file_content: "version: '3'\n".into(),
                prune: false,
                endpoint_id: EndpointId::new(1),
            })]
        );
    }

    #[test]
    fn update_with_replace_policy_and_new_file() {
        let api = FakeApi::default()
            .with_stacks(vec![stack(7, "web", &[("FOO", "1"), ("KEEP", "x")])]);
        let mut req = request("web");
        req.env = pairs(&[("BAR", "3")]);
        req.env_policy = EnvPolicy::Replace;
        req.stack_file_content = Some("new content".into());
        req.prune = true;

        let _ = Deployer::new(&api).deploy(&req).expect("deploy");

        assert!(!api.calls().contains(&Call::StackFile(StackId::new(7))));
        let Some(Call::Update(options)) = api.mutations().pop() else {
            panic!("expected update");
        };
        assert_eq!(options.env, pairs(&[("BAR", "3")]));
        assert_eq!(options.stack_file_content, "new content");
        assert!(options.prune);
    }

    #[test]
    fn update_without_file_reuses_server_content() {
        let api = FakeApi::default()
            .with_stack_file("from server")
            .with_stacks(vec![stack(7, "web", &[])]);
        let _ = Deployer::new(&api).deploy(&request("web")).expect("deploy");

        assert!(api.calls().contains(&Call::StackFile(StackId::new(7))));
        let Some(Call::Update(options)) = api.mutations().pop() else {
            panic!("expected update");
        };
        assert_eq!(options.stack_file_content, "from server");
    }

    #[test]
    fn lookup_failure_aborts_without_creating() {
        let api = FakeApi::default();
        api.fail_next("stack_list");
        let mut req = request("web");
        req.stack_file_content = Some("x".into());

        let err = Deployer::new(&api).deploy(&req).expect_err("list fails");
        assert!(matches!(err, DeployError::Resolve(ResolveError::Client(_))));
        assert!(api.mutations().is_empty());
    }

    #[test]
    fn update_failure_is_surfaced() {
        let api = FakeApi::default().with_stacks(vec![stack(7, "web", &[])]);
        api.fail_next("stack_update");
        let err = Deployer::new(&api)
            .deploy(&request("web"))
            .expect_err("update fails");
        assert!(matches!(err, DeployError::Client(_)));
    }

    #[test]
    fn remove_existing_stack() {
        let api = FakeApi::default().with_stacks(vec![stack(3, "web", &[])]);
        let outcome = Deployer::new(&api)
            .remove("web", EndpointId::new(1), false)
            .expect("remove");
        assert_eq!(outcome, RemoveOutcome::Removed { id: StackId::new(3) });
        assert_eq!(api.mutations(), vec![Call::Delete(StackId::new(3))]);
    }

    #[test]
    fn remove_absent_stack_depends_on_strict() {
        let api = FakeApi::default();
        let deployer = Deployer::new(&api);
        assert_eq!(
            deployer
                .remove("ghost", EndpointId::new(1), false)
                .expect("lenient"),
            RemoveOutcome::Absent
        );
        assert!(matches!(
            deployer.remove("ghost", EndpointId::new(1), true),
            Err(DeployError::Resolve(ResolveError::StackNotFound { .. }))
        ));
        assert!(api.mutations().is_empty());
    }
}
