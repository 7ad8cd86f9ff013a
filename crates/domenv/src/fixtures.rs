// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-in for the environments service, for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::environment::Environment;
use crate::revision::{Revision, RevisionContent};
use crate::transport::{Operation, Request, Response, Transport, TransportError};

/// Build an environment snapshot the way the service would report it.
pub fn environment(id: &str, name: &str, active: Option<&str>, latest: Option<&str>) -> Environment {
    serde_json::from_value(environment_json(id, name, active, latest))
        .expect("fixture environment should deserialize")
}

fn environment_json(id: &str, name: &str, active: Option<&str>, latest: Option<&str>) -> Value {
    json!({
        "id": id,
        "name": name,
        "visibility": "Private",
        "archived": false,
        "selectedRevision": active.map(|rev| json!({"id": rev, "status": "Succeeded"})),
        "latestRevision": latest.map(|rev| json!({"id": rev, "status": "Building"})),
    })
}

#[derive(Default)]
struct State {
    version: String,
    environments: BTreeMap<String, Value>,
    default_environment: Option<String>,
    contents: HashMap<(String, String), RevisionContent>,
    next_id: u32,
    fail_next: Option<String>,
    creates_without_body: bool,
}

/// Records every request and answers from in-memory state.
pub struct FakeTransport {
    state: Mutex<State>,
    requests: Mutex<Vec<Request>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new("5.10.0")
    }
}

impl FakeTransport {
    pub fn new(version: &str) -> Self {
        Self {
            state: Mutex::new(State {
                version: version.to_string(),
                next_id: 1,
                ..Default::default()
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_environment(
        self,
        id: &str,
        name: &str,
        active: Option<&str>,
        latest: Option<&str>,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .environments
            .insert(id.to_string(), environment_json(id, name, active, latest));
        self
    }

    pub fn with_default(self, id: &str) -> Self {
        self.state.lock().unwrap().default_environment = Some(id.to_string());
        self
    }

    pub fn with_content(self, environment_id: &str, revision_id: &str, content: RevisionContent) -> Self {
        self.state
            .lock()
            .unwrap()
            .contents
            .insert((environment_id.to_string(), revision_id.to_string()), content);
        self
    }

    /// Answer successful creates with [`Response::Accepted`] only.
    pub fn creates_without_body(self) -> Self {
        self.state.lock().unwrap().creates_without_body = true;
        self
    }

    /// Make the next request fail with an opaque transport error.
    pub fn fail_next(&self, message: &str) {
        self.state.lock().unwrap().fail_next = Some(message.to_string());
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.operation() == operation)
            .count()
    }

    pub fn is_archived(&self, id: &str) -> bool {
        self.state.lock().unwrap().environments[id]["archived"] == json!(true)
    }

    fn not_found(what: &str) -> TransportError {
        TransportError::Status {
            url: format!("fake://{what}"),
            status: 404,
            message: "not found".to_string(),
        }
    }
}

impl Transport for FakeTransport {
    fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut state = self.state.lock().unwrap();

        if let Some(message) = state.fail_next.take() {
            return Err(TransportError::Other(message));
        }

        let decode = |value: &Value| -> Environment {
            serde_json::from_value(value.clone()).expect("fake state should deserialize")
        };

        match request {
            Request::DeploymentVersion => Ok(Response::Version(state.version.clone())),
            Request::GetEnvironment { environment_id } => state
                .environments
                .get(&environment_id)
                .map(|value| Response::Environment(decode(value)))
                .ok_or_else(|| Self::not_found(&environment_id)),
            Request::ListEnvironments => Ok(Response::Environments(
                state.environments.values().map(decode).collect(),
            )),
            Request::GetDefaultEnvironment => Ok(Response::DefaultEnvironment(
                state
                    .default_environment
                    .as_ref()
                    .and_then(|id| state.environments.get(id))
                    .map(decode),
            )),
            Request::CreateEnvironment { environment, .. } => {
                let id = format!("env-{}", state.next_id);
                let revision = format!("rev-{}", state.next_id);
                state.next_id += 1;
                let mut value = environment_json(&id, &environment.name, None, Some(&revision));
                value["visibility"] = json!(environment.visibility);
                value["description"] = json!(environment.description.to_string());
                let created = decode(&value);
                state.environments.insert(id, value);
                if state.creates_without_body {
                    return Ok(Response::Accepted);
                }
                Ok(Response::Environment(created))
            }
            Request::ArchiveEnvironment { environment_id } => {
                let env = state
                    .environments
                    .get_mut(&environment_id)
                    .ok_or_else(|| Self::not_found(&environment_id))?;
                env["archived"] = json!(true);
                Ok(Response::Archived)
            }
            Request::CreateRevision { environment_id, .. } => {
                let revision_id = format!("rev-{}", state.next_id);
                state.next_id += 1;
                let env = state
                    .environments
                    .get_mut(&environment_id)
                    .ok_or_else(|| Self::not_found(&environment_id))?;
                let revision = json!({
                    "id": revision_id,
                    "status": "Queued",
                    "environmentId": environment_id,
                });
                env["latestRevision"] = revision.clone();
                if state.creates_without_body {
                    return Ok(Response::Accepted);
                }
                let revision: Revision =
                    serde_json::from_value(revision).expect("fake revision should deserialize");
                Ok(Response::Revision(revision))
            }
            Request::GetRevision {
                environment_id,
                revision_id,
            } => state
                .contents
                .get(&(environment_id, revision_id.clone()))
                .cloned()
                .map(Response::RevisionContent)
                .ok_or_else(|| Self::not_found(&revision_id)),
        }
    }
}
