// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Blocking HTTP implementation of [`Transport`].

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::archive::parse_revision_archive;
use crate::auth::{Auth, Credentials};
use crate::environment::{Environment, NewEnvironment, OwnerId, Visibility};
use crate::normalize::LINE_SEPARATOR;
use crate::spec::RevisionSpec;
use crate::transport::{Request, Response, RevisionSubmission, Transport, TransportError};

#[cfg(test)]
#[path = "./http_test.rs"]
mod http_test;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest error body echoed back in a [`TransportError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// URL layout of the environments service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    host: String,
}

impl Routes {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn deployment_version(&self) -> String {
        format!("{}/version", self.host)
    }

    fn environments(&self) -> String {
        format!("{}/v4/environments", self.host)
    }

    pub fn environment_list(&self) -> String {
        self.environments()
    }

    pub fn environment_default(&self) -> String {
        format!("{}/defaultEnvironment", self.environments())
    }

    pub fn environment_create(&self) -> String {
        format!("{}/environments", self.host)
    }

    pub fn environment_get(&self, environment_id: &str) -> String {
        format!("{}/{environment_id}", self.environments())
    }

    pub fn environment_archive(&self, environment_id: &str) -> String {
        format!("{}/{environment_id}/archive", self.environments())
    }

    pub fn revision_create(&self, environment_id: &str) -> String {
        format!("{}/environments/{environment_id}/revisions", self.host)
    }

    pub fn revision_download(&self, environment_id: &str, revision_id: &str) -> String {
        format!(
            "{}/v1/environments/{environment_id}/revisions/{revision_id}/dockerImageSourceProjectWeb",
            self.host
        )
    }
}

/// Talks to the environments service over HTTP with blocking requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    routes: Routes,
    auth: Auth,
}

impl HttpTransport {
    pub fn new(credentials: Credentials) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| TransportError::Request {
                url: credentials.host.clone(),
                source,
            })?;
        Ok(Self::with_client(credentials, client))
    }

    /// Use a preconfigured client, e.g. one with custom TLS roots.
    pub fn with_client(credentials: Credentials, client: Client) -> Self {
        Self {
            client,
            routes: Routes::new(credentials.host),
            auth: credentials.auth,
        }
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, TransportError> {
        let (name, value) = self.auth.header()?;
        Ok(builder
            .header(name, value)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    fn send(
        &self,
        builder: RequestBuilder,
        url: &str,
    ) -> Result<reqwest::blocking::Response, TransportError> {
        self.authorized(builder)?
            .send()
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, TransportError> {
        let response = check_status(self.send(self.client.get(url), url)?, url)?;
        decode_json(response, url)
    }

    /// Submit a form to one of the create endpoints.
    ///
    /// These endpoints may answer a successful create with something other
    /// than JSON. That is still a success, reported as `None`.
    fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<Option<T>, TransportError> {
        let response = check_status(self.send(self.client.post(url).form(form), url)?, url)?;
        match decode_json(response, url) {
            Ok(created) => Ok(Some(created)),
            Err(TransportError::Decode { source, .. }) => {
                tracing::warn!(%url, error = %source, "create succeeded without a readable body");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let operation = request.operation();
        tracing::debug!(%operation, "sending request");

        match request {
            Request::DeploymentVersion => {
                #[derive(serde::Deserialize)]
                struct VersionInfo {
                    version: String,
                }
                let info: VersionInfo = self.get_json(&self.routes.deployment_version())?;
                Ok(Response::Version(info.version))
            }
            Request::GetEnvironment { environment_id } => self
                .get_json(&self.routes.environment_get(&environment_id))
                .map(Response::Environment),
            Request::ListEnvironments => self
                .get_json(&self.routes.environment_list())
                .map(Response::Environments),
            Request::GetDefaultEnvironment => {
                let url = self.routes.environment_default();
                let response = self.send(self.client.get(&url), &url)?;
                if response.status() == StatusCode::NOT_FOUND {
                    return Ok(Response::DefaultEnvironment(None));
                }
                let environment: Option<Environment> =
                    decode_json(check_status(response, &url)?, &url)?;
                Ok(Response::DefaultEnvironment(environment))
            }
            Request::CreateEnvironment {
                environment,
                default_environment_image,
                default_environment_revision_id,
            } => {
                let form = environment_form(
                    &environment,
                    default_environment_image.as_deref(),
                    default_environment_revision_id.as_deref(),
                );
                let created = self.post_form(&self.routes.environment_create(), &form)?;
                Ok(created.map_or(Response::Accepted, Response::Environment))
            }
            Request::ArchiveEnvironment { environment_id } => {
                let url = self.routes.environment_archive(&environment_id);
                let response = self.send(self.client.post(&url), &url)?;
                if response.status() == StatusCode::CONFLICT {
                    tracing::debug!(%environment_id, "environment was already archived");
                    return Ok(Response::Archived);
                }
                check_status(response, &url)?;
                Ok(Response::Archived)
            }
            Request::CreateRevision {
                environment_id,
                submission,
            } => {
                let form = revision_form(&submission);
                let created = self.post_form(&self.routes.revision_create(&environment_id), &form)?;
                Ok(created.map_or(Response::Accepted, Response::Revision))
            }
            Request::GetRevision {
                environment_id,
                revision_id,
            } => {
                let url = self.routes.revision_download(&environment_id, &revision_id);
                let response = check_status(self.send(self.client.get(&url), &url)?, &url)?;
                let bytes = response.bytes().map_err(|source| TransportError::Request {
                    url: url.clone(),
                    source,
                })?;
                parse_revision_archive(&bytes)
                    .map(Response::RevisionContent)
                    .map_err(|source| TransportError::Archive { url, source })
            }
        }
    }
}

fn check_status(
    response: reqwest::blocking::Response,
    url: &str,
) -> Result<reqwest::blocking::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut message = response.text().unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    Err(TransportError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        message,
    })
}

fn decode_json<T: DeserializeOwned>(
    response: reqwest::blocking::Response,
    url: &str,
) -> Result<T, TransportError> {
    let bytes = response.bytes().map_err(|source| TransportError::Request {
        url: url.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| TransportError::Decode {
        url: url.to_string(),
        source,
    })
}

fn push(form: &mut Vec<(String, String)>, key: &str, value: impl Into<String>) {
    form.push((key.to_string(), value.into()));
}

/// Image fields shared by environment and revision creation.
///
/// Without an explicit base revision, the default environment's active
/// revision is sent in its place.
fn base_fields(
    form: &mut Vec<(String, String)>,
    spec: &RevisionSpec,
    default_environment_image: Option<&str>,
    default_environment_revision_id: Option<&str>,
) {
    let image = spec.image();
    push(form, "base.imageType", image.image_type().to_string());
    push(form, "base.dockerImage", image.docker_image().unwrap_or_default());
    push(
        form,
        "base.baseEnvironmentRevisionId",
        image
            .base_environment_revision_id()
            .or(default_environment_revision_id)
            .unwrap_or_default(),
    );
    push(
        form,
        "base.defaultEnvironmentImage",
        default_environment_image.unwrap_or_default(),
    );
}

fn cluster_fields(form: &mut Vec<(String, String)>, spec: &RevisionSpec) {
    for cluster in spec.cluster_types() {
        push(form, "clusterTypes[]", cluster.to_string());
    }
}

/// Form fields for creating an environment.
pub fn environment_form(
    environment: &NewEnvironment,
    default_environment_image: Option<&str>,
    default_environment_revision_id: Option<&str>,
) -> Vec<(String, String)> {
    let mut form = Vec::new();
    push(&mut form, "name", environment.name.clone());
    push(&mut form, "description", environment.description.to_string());
    push(&mut form, "visibility", environment.visibility.to_string());
    base_fields(
        &mut form,
        &environment.revision,
        default_environment_image,
        default_environment_revision_id,
    );

    match &environment.owner {
        Some(OwnerId::Organization(id)) if environment.visibility == Visibility::Organization => {
            push(&mut form, "organizationOwnerId", id.clone());
        }
        Some(OwnerId::Organization(id)) => {
            tracing::warn!(
                organization = %id,
                visibility = %environment.visibility,
                "organization owner only applies to Organization visibility, ignoring"
            );
        }
        Some(OwnerId::User(id)) => push(&mut form, "userOwnerId", id.clone()),
        None => {}
    }

    cluster_fields(&mut form, &environment.revision);
    form
}

/// Form fields for creating a revision.
pub fn revision_form(submission: &RevisionSubmission) -> Vec<(String, String)> {
    let spec = &submission.spec;
    let scripts = spec.scripts();

    let mut form = Vec::new();
    base_fields(
        &mut form,
        spec,
        submission.default_environment_image.as_deref(),
        submission.default_environment_revision_id.as_deref(),
    );
    push(
        &mut form,
        "dockerfileInstructions",
        spec.dockerfile_instructions().join(LINE_SEPARATOR),
    );
    push(
        &mut form,
        "properties",
        spec.workspace_tools().join(LINE_SEPARATOR),
    );
    push(&mut form, "preRunScript", scripts.pre_run.clone());
    push(&mut form, "postRunScript", scripts.post_run.clone());
    push(&mut form, "preSetupScript", scripts.pre_setup.clone());
    push(&mut form, "postSetupScript", scripts.post_setup.clone());
    push(&mut form, "dockerArguments", spec.docker_arguments());
    push(&mut form, "summary", spec.summary().unwrap_or_default());

    for (idx, (name, value)) in spec.environment_variables().iter().enumerate() {
        push(
            &mut form,
            &format!("buildEnvironmentVariables[{idx}].name"),
            name,
        );
        push(
            &mut form,
            &format!("buildEnvironmentVariables[{idx}].value"),
            value,
        );
    }

    if spec.force_rebuild() {
        push(&mut form, "noCache", "true");
    }
    if spec.should_use_vpn() {
        push(&mut form, "shouldUseVPN", "on");
    }
    cluster_fields(&mut form, spec);
    form
}
