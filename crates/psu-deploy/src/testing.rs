//! In-memory `PortainerApi` that records every call.

use std::collections::HashMap;
use std::sync::Mutex;

use psu_client::api::{
    ResourceControlCreateOptions, ResourceControlUpdateOptions, StackCreateComposeOptions,
    StackCreateSwarmOptions, StackListFilter, StackUpdateOptions,
};
use psu_client::{ClientError, PortainerApi};
use psu_common::types::{
    Endpoint, EndpointGroup, EndpointGroupId, EndpointId, EndpointType, GenericError, Pair,
    ResourceControl, ResourceControlId, Stack, StackId, StackType, Status, User, UserId,
};
use serde_json::{Map, Value};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    EndpointList,
    EndpointGroupList,
    DockerInfo(EndpointId),
    DockerGet(EndpointId, String),
    StackList(StackListFilter),
    CreateSwarm(StackCreateSwarmOptions),
    CreateCompose(StackCreateComposeOptions),
    Update(StackUpdateOptions),
    Delete(StackId),
    StackFile(StackId),
    Status,
    ControlCreate(ResourceControlCreateOptions),
    ControlUpdate(ResourceControlUpdateOptions),
    ControlDelete(ResourceControlId),
    UserList,
}

impl Call {
    const fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateSwarm(_)
                | Self::CreateCompose(_)
                | Self::Update(_)
                | Self::Delete(_)
                | Self::ControlCreate(_)
                | Self::ControlUpdate(_)
                | Self::ControlDelete(_)
        )
    }
}

pub fn endpoint(id: u32, name: &str) -> Endpoint {
    Endpoint {
        id: EndpointId::new(id),
        name: name.to_string(),
        kind: EndpointType::Docker,
        url: format!("tcp://{name}:2375"),
        public_url: String::new(),
        group_id: EndpointGroupId::new(1),
    }
}

pub fn stack(id: u32, name: &str, env: &[(&str, &str)]) -> Stack {
    Stack {
        id: StackId::new(id),
        name: name.to_string(),
        kind: StackType::Compose,
        endpoint_id: EndpointId::new(1),
        swarm_id: String::new(),
        entry_point: "docker-compose.yml".into(),
        project_path: format!("/data/compose/{id}"),
        env: env.iter().map(|(k, v)| Pair::new(*k, *v)).collect(),
        resource_control: None,
        creation_date: 0,
        created_by: "admin".into(),
    }
}

pub fn control(id: u32, resource_id: &str) -> ResourceControl {
    ResourceControl {
        id: ResourceControlId::new(id),
        resource_id: resource_id.to_string(),
        sub_resource_ids: Vec::new(),
        user_accesses: Vec::new(),
        team_accesses: Vec::new(),
        public: false,
        administrators_only: true,
    }
}

pub struct FakeApi {
    username: String,
    endpoints: Vec<Endpoint>,
    groups: Vec<EndpointGroup>,
    docker_info: Map<String, Value>,
    docker_objects: HashMap<String, Value>,
    stacks: Vec<Stack>,
    stack_file: String,
    users: Vec<User>,
    conflict_on_create: bool,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<&'static str>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            username: "admin".into(),
            endpoints: vec![endpoint(1, "primary")],
            groups: vec![EndpointGroup {
                id: EndpointGroupId::new(1),
                name: "Unassigned".into(),
                description: String::new(),
            }],
            docker_info: Map::new(),
            docker_objects: HashMap::new(),
            stacks: Vec::new(),
            stack_file: "version: '3'\n".into(),
            users: vec![
                User {
                    id: UserId::new(1),
                    username: "admin".into(),
                    role: 1,
                },
                User {
                    id: UserId::new(2),
                    username: "ops".into(),
                    role: 2,
                },
            ],
            conflict_on_create: false,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn with_username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    pub fn with_endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_docker_info(mut self, info: Map<String, Value>) -> Self {
        self.docker_info = info;
        self
    }

    pub fn with_swarm(self, cluster_id: &str) -> Self {
        let info = serde_json::json!({"Swarm": {"Cluster": {"ID": cluster_id}}});
        self.with_docker_info(info.as_object().cloned().unwrap_or_default())
    }

    pub fn with_docker_object(mut self, path: &str, object: Value) -> Self {
        let _ = self.docker_objects.insert(path.to_string(), object);
        self
    }

    pub fn with_stacks(mut self, stacks: Vec<Stack>) -> Self {
        self.stacks = stacks;
        self
    }

    pub fn with_stack_file(mut self, content: &str) -> Self {
        self.stack_file = content.to_string();
        self
    }

    pub fn with_conflict_on_create(mut self) -> Self {
        self.conflict_on_create = true;
        self
    }

    /// Makes the next call of `operation` fail with a server error.
    pub fn fail_next(&self, operation: &'static str) {
        self.failures.lock().unwrap().push(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn stack_list_filters(&self) -> Vec<StackListFilter> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::StackList(filter) => Some(filter),
                _ => None,
            })
            .collect()
    }

    fn record(&self, operation: &'static str, call: Call) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(call);
        let mut failures = self.failures.lock().unwrap();
        if let Some(pos) = failures.iter().position(|f| *f == operation) {
            let _ = failures.remove(pos);
            return Err(ClientError::Opaque {
                status: 500,
                body: format!("{operation} failed"),
            });
        }
        Ok(())
    }

    fn created(
        &self,
        name: &str,
        kind: StackType,
        endpoint_id: EndpointId,
        swarm_id: &str,
        env: &[Pair],
    ) -> Stack {
        Stack {
            kind,
            endpoint_id,
            swarm_id: swarm_id.to_string(),
            env: env.to_vec(),
            ..stack(100 + u32::try_from(self.stacks.len()).unwrap(), name, &[])
        }
    }
}

impl PortainerApi for FakeApi {
    fn username(&self) -> &str {
        &self.username
    }

    fn endpoint_list(&self) -> Result<Vec<Endpoint>, ClientError> {
        self.record("endpoint_list", Call::EndpointList)?;
        Ok(self.endpoints.clone())
    }

    fn endpoint_group_list(&self) -> Result<Vec<EndpointGroup>, ClientError> {
        self.record("endpoint_group_list", Call::EndpointGroupList)?;
        Ok(self.groups.clone())
    }

    fn endpoint_docker_info(
        &self,
        endpoint_id: EndpointId,
    ) -> Result<Map<String, Value>, ClientError> {
        self.record("endpoint_docker_info", Call::DockerInfo(endpoint_id))?;
        Ok(self.docker_info.clone())
    }

    fn endpoint_docker_get(
        &self,
        endpoint_id: EndpointId,
        path: &str,
    ) -> Result<Value, ClientError> {
        self.record(
            "endpoint_docker_get",
            Call::DockerGet(endpoint_id, path.to_string()),
        )?;
        self.docker_objects
            .get(path)
            .cloned()
            .ok_or_else(|| ClientError::Opaque {
                status: 404,
                body: format!("no such object: {path}"),
            })
    }

    fn stack_list(&self, filter: &StackListFilter) -> Result<Vec<Stack>, ClientError> {
        self.record("stack_list", Call::StackList(filter.clone()))?;
        Ok(self.stacks.clone())
    }

    fn stack_create_swarm(&self, options: &StackCreateSwarmOptions) -> Result<Stack, ClientError> {
        self.record("stack_create_swarm", Call::CreateSwarm(options.clone()))?;
        Ok(self.created(
            &options.name,
            StackType::Swarm,
            options.endpoint_id,
            &options.swarm_cluster_id,
            &options.env,
        ))
    }

    fn stack_create_compose(
        &self,
        options: &StackCreateComposeOptions,
    ) -> Result<Stack, ClientError> {
        self.record("stack_create_compose", Call::CreateCompose(options.clone()))?;
        Ok(self.created(
            &options.name,
            StackType::Compose,
            options.endpoint_id,
            "",
            &options.env,
        ))
    }

    fn stack_update(&self, options: &StackUpdateOptions) -> Result<(), ClientError> {
        self.record("stack_update", Call::Update(options.clone()))
    }

    fn stack_delete(&self, stack_id: StackId) -> Result<(), ClientError> {
        self.record("stack_delete", Call::Delete(stack_id))
    }

    fn stack_file_inspect(&self, stack_id: StackId) -> Result<String, ClientError> {
        self.record("stack_file_inspect", Call::StackFile(stack_id))?;
        Ok(self.stack_file.clone())
    }

    fn status(&self) -> Result<Status, ClientError> {
        self.record("status", Call::Status)?;
        Ok(Status {
            version: "2.19.0".into(),
            instance_id: "test".into(),
            authentication: None,
            endpoint_management: None,
            analytics: None,
        })
    }

    fn resource_control_create(
        &self,
        options: &ResourceControlCreateOptions,
    ) -> Result<ResourceControl, ClientError> {
        self.record("resource_control_create", Call::ControlCreate(options.clone()))?;
        if self.conflict_on_create {
            return Err(ClientError::Api(GenericError {
                code: 409,
                err: "A resource control is already associated to this resource".into(),
                details: String::new(),
            }));
        }
        Ok(ResourceControl {
            public: options.public,
            administrators_only: false,
            ..control(50, &options.resource_id)
        })
    }

    fn resource_control_update(
        &self,
        options: &ResourceControlUpdateOptions,
    ) -> Result<ResourceControl, ClientError> {
        self.record("resource_control_update", Call::ControlUpdate(options.clone()))?;
        Ok(ResourceControl {
            id: options.id,
            public: options.public,
            administrators_only: false,
            ..control(0, "")
        })
    }

    fn resource_control_delete(&self, id: ResourceControlId) -> Result<(), ClientError> {
        self.record("resource_control_delete", Call::ControlDelete(id))
    }

    fn user_list(&self) -> Result<Vec<User>, ClientError> {
        self.record("user_list", Call::UserList)?;
        Ok(self.users.clone())
    }
}
