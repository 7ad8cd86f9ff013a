// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Environment and revision lifecycle on top of a [`Transport`].

use std::borrow::Cow;
use std::sync::Arc;

use crate::auth::ClientConfig;
use crate::cache::Cached;
use crate::environment::{Environment, NewEnvironment};
use crate::http::HttpTransport;
use crate::revision::{Revision, RevisionDetails};
use crate::spec::{ImageType, RevisionSpec};
use crate::transport::{Operation, Request, Response, RevisionSubmission, Transport};
use crate::version::check_compatible;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./manager_test.rs"]
mod manager_test;

/// An environment given either as a loaded snapshot or by id.
#[derive(Debug, Clone, Copy)]
pub enum EnvironmentRef<'a> {
    Loaded(&'a Environment),
    Id(&'a str),
}

impl EnvironmentRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            Self::Loaded(environment) => environment.id(),
            Self::Id(id) => id,
        }
    }
}

impl<'a> From<&'a Environment> for EnvironmentRef<'a> {
    fn from(environment: &'a Environment) -> Self {
        Self::Loaded(environment)
    }
}

impl<'a> From<&'a str> for EnvironmentRef<'a> {
    fn from(id: &'a str) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a String> for EnvironmentRef<'a> {
    fn from(id: &'a String) -> Self {
        Self::Id(id.as_str())
    }
}

/// The deployment's default environment and the image it builds on.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub environment: Environment,
    /// Base image of the default environment's active revision, if it has one.
    pub base_image: Option<String>,
}

/// Entry point for all environment and revision operations.
///
/// Each operation is one logical request through the transport. Nothing
/// here retries; transport failures are returned as [`Error::Transport`].
pub struct EnvironmentManager<T = HttpTransport> {
    transport: T,
    defaults: Cached<Defaults>,
}

impl EnvironmentManager<HttpTransport> {
    /// Resolve credentials, check the deployment version and load defaults.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let credentials = config.resolve()?;
        tracing::info!(
            host = %credentials.host,
            auth = credentials.auth.kind(),
            "connecting to environments service"
        );
        Self::initialize(HttpTransport::new(credentials)?)
    }
}

impl<T: Transport> EnvironmentManager<T> {
    /// Wrap a transport without contacting the service.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            defaults: Cached::empty(),
        }
    }

    /// Check the deployment version and load defaults through `transport`.
    ///
    /// A deployment without a default environment is accepted; one older
    /// than the supported minimum is not.
    pub fn initialize(transport: T) -> Result<Self> {
        let manager = Self::new(transport);

        let version = manager.deployment_version()?;
        if let Err(err) = check_compatible(&version) {
            tracing::error!(%version, "deployment version is not supported");
            return Err(err);
        }
        tracing::debug!(%version, "deployment version is supported");

        match manager.refresh_defaults() {
            Ok(_) => {}
            Err(Error::NoDefaultEnvironment) => {
                tracing::warn!("deployment has no default environment");
            }
            Err(err) => return Err(err),
        }
        Ok(manager)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn execute(&self, request: Request) -> Result<Response> {
        Ok(self.transport.execute(request)?)
    }

    pub fn deployment_version(&self) -> Result<String> {
        match self.execute(Request::DeploymentVersion)? {
            Response::Version(version) => Ok(version),
            _ => Err(unexpected(Operation::DeploymentVersion)),
        }
    }

    /// Cached defaults from the last [`Self::refresh_defaults`].
    pub fn defaults(&self) -> Option<Arc<Defaults>> {
        self.defaults.get()
    }

    /// Base image sent along with `DefaultImage` revisions.
    pub fn default_environment_image(&self) -> Option<String> {
        self.defaults().and_then(|d| d.base_image.clone())
    }

    /// Active revision of the default environment, sent along with
    /// `DefaultImage` revisions.
    pub fn default_environment_revision_id(&self) -> Option<String> {
        self.defaults()
            .and_then(|d| d.environment.active_revision().map(|r| r.id.clone()))
    }

    /// Fetch the default environment and its base image again.
    pub fn refresh_defaults(&self) -> Result<Arc<Defaults>> {
        self.defaults.refresh(|| -> Result<Defaults> {
            let environment = self.get_default_environment()?;
            let base_image = match environment.active_revision() {
                Some(_) => self
                    .get_revision_details(&environment, None)?
                    .content
                    .base_image
                    .clone(),
                None => None,
            };
            tracing::debug!(
                environment = environment.id(),
                base_image = base_image.as_deref().unwrap_or("<none>"),
                "refreshed defaults"
            );
            Ok(Defaults {
                environment,
                base_image,
            })
        })
    }

    pub fn get_environment(&self, environment_id: &str) -> Result<Environment> {
        let request = Request::GetEnvironment {
            environment_id: environment_id.to_string(),
        };
        match self.execute(request)? {
            Response::Environment(environment) => Ok(environment),
            _ => Err(unexpected(Operation::GetEnvironment)),
        }
    }

    pub fn list_environments(&self) -> Result<Vec<Environment>> {
        match self.execute(Request::ListEnvironments)? {
            Response::Environments(environments) => Ok(environments),
            _ => Err(unexpected(Operation::ListEnvironments)),
        }
    }

    /// The deployment's default environment for this caller.
    pub fn get_default_environment(&self) -> Result<Environment> {
        match self.execute(Request::GetDefaultEnvironment)? {
            Response::DefaultEnvironment(Some(environment)) => Ok(environment),
            Response::DefaultEnvironment(None) => Err(Error::NoDefaultEnvironment),
            _ => Err(unexpected(Operation::GetDefaultEnvironment)),
        }
    }

    /// Create an environment along with its first revision.
    ///
    /// The returned snapshot has no active revision until the first build
    /// succeeds on the service.
    pub fn create_environment(&self, environment: NewEnvironment) -> Result<Environment> {
        let base = self.default_base(&environment.revision);
        let name = environment.name.clone();
        tracing::info!(
            %name,
            visibility = %environment.visibility,
            image_type = %environment.revision.image_type(),
            "creating environment"
        );
        let request = Request::CreateEnvironment {
            environment,
            default_environment_image: base.image,
            default_environment_revision_id: base.revision_id,
        };
        let created = match self.execute(request)? {
            Response::Environment(created) => created,
            Response::Accepted => self.find_created_environment(&name)?,
            _ => return Err(unexpected(Operation::CreateEnvironment)),
        };
        tracing::info!(id = created.id(), "created environment");
        Ok(created)
    }

    /// Archive an environment.
    ///
    /// A loaded snapshot that is already archived is left alone without a
    /// request. Archiving by id always asks the service, which treats a
    /// repeated archive as success.
    pub fn archive_environment<'a>(&self, environment: impl Into<EnvironmentRef<'a>>) -> Result<()> {
        let environment = environment.into();
        if let EnvironmentRef::Loaded(loaded) = environment {
            if loaded.archived() {
                tracing::warn!(id = loaded.id(), "environment is already archived");
                return Ok(());
            }
        }

        let environment_id = environment.id().to_string();
        tracing::info!(id = %environment_id, "archiving environment");
        match self.execute(Request::ArchiveEnvironment { environment_id })? {
            Response::Archived => Ok(()),
            _ => Err(unexpected(Operation::ArchiveEnvironment)),
        }
    }

    /// Submit a new revision of an environment.
    ///
    /// The returned revision becomes the environment's latest revision; it
    /// only becomes active once its build succeeds.
    pub fn create_revision<'a>(
        &self,
        environment: impl Into<EnvironmentRef<'a>>,
        spec: RevisionSpec,
    ) -> Result<Revision> {
        let environment_id = environment.into().id().to_string();
        let base = self.default_base(&spec);
        tracing::info!(
            environment = %environment_id,
            image_type = %spec.image_type(),
            "creating revision"
        );
        let request = Request::CreateRevision {
            environment_id: environment_id.clone(),
            submission: RevisionSubmission {
                spec,
                default_environment_image: base.image,
                default_environment_revision_id: base.revision_id,
            },
        };
        let revision = match self.execute(request)? {
            Response::Revision(revision) => revision,
            Response::Accepted => {
                tracing::debug!(environment = %environment_id, "reading back the new revision");
                self.get_environment(&environment_id)?
                    .latest_revision()
                    .cloned()
                    .ok_or_else(|| unexpected(Operation::CreateRevision))?
            }
            _ => return Err(unexpected(Operation::CreateRevision)),
        };
        tracing::info!(id = %revision.id, status = %revision.status, "created revision");
        Ok(revision)
    }

    /// Build sources of a revision, defaulting to the active one.
    ///
    /// Details of the active and latest revisions are cached on a loaded
    /// snapshot and only fetched the first time. Other revisions, and
    /// environments given by id, are fetched on every call. An environment
    /// given by id is only read when the active revision must be looked up.
    pub fn get_revision_details<'a>(
        &self,
        environment: impl Into<EnvironmentRef<'a>>,
        revision_id: Option<&str>,
    ) -> Result<Arc<RevisionDetails>> {
        let environment = match (environment.into(), revision_id) {
            (EnvironmentRef::Id(id), Some(revision_id)) => {
                return self
                    .fetch_details(id, Revision::reference(revision_id))
                    .map(Arc::new);
            }
            (environment, _) => self.load(environment)?,
        };
        let revision_id = resolve_revision_id(&environment, revision_id)?;
        let fetch = || self.fetch_details(environment.id(), revision_of(&environment, &revision_id));
        match environment.details_slot(&revision_id) {
            Some(slot) => slot.get_or_refresh(fetch),
            None => fetch().map(Arc::new),
        }
    }

    /// Fetch build sources again, replacing any cached copy.
    pub fn refresh_revision_details(
        &self,
        environment: &Environment,
        revision_id: Option<&str>,
    ) -> Result<Arc<RevisionDetails>> {
        let revision_id = resolve_revision_id(environment, revision_id)?;
        let fetch = || self.fetch_details(environment.id(), revision_of(environment, &revision_id));
        match environment.details_slot(&revision_id) {
            Some(slot) => slot.refresh(fetch),
            None => fetch().map(Arc::new),
        }
    }

    fn load<'a>(&self, environment: EnvironmentRef<'a>) -> Result<Cow<'a, Environment>> {
        match environment {
            EnvironmentRef::Loaded(loaded) => Ok(Cow::Borrowed(loaded)),
            EnvironmentRef::Id(id) => self.get_environment(id).map(Cow::Owned),
        }
    }

    fn fetch_details(&self, environment_id: &str, revision: Revision) -> Result<RevisionDetails> {
        tracing::debug!(
            environment = environment_id,
            revision = %revision.id,
            "fetching revision details"
        );
        let request = Request::GetRevision {
            environment_id: environment_id.to_string(),
            revision_id: revision.id.clone(),
        };
        let content = match self.execute(request)? {
            Response::RevisionContent(content) => content,
            _ => return Err(unexpected(Operation::GetRevision)),
        };
        Ok(RevisionDetails {
            environment_id: environment_id.to_string(),
            revision,
            content,
        })
    }

    /// Read back an environment whose create was accepted without a body.
    ///
    /// Picks the live environment of that name with the newest latest
    /// revision.
    fn find_created_environment(&self, name: &str) -> Result<Environment> {
        tracing::debug!(%name, "reading back the new environment");
        self.list_environments()?
            .into_iter()
            .filter(|env| env.name() == name && !env.archived())
            .max_by_key(|env| env.latest_revision().and_then(|r| r.created_at))
            .ok_or_else(|| unexpected(Operation::CreateEnvironment))
    }

    /// Default image and base revision sent along with `DefaultImage` specs.
    fn default_base(&self, spec: &RevisionSpec) -> DefaultBase {
        if spec.image_type() != ImageType::Default {
            return DefaultBase::default();
        }
        let base = DefaultBase {
            image: self.default_environment_image(),
            revision_id: self.default_environment_revision_id(),
        };
        if base.image.is_none() {
            tracing::debug!("no default environment image cached, submitting without one");
        }
        base
    }
}

#[derive(Debug, Default)]
struct DefaultBase {
    image: Option<String>,
    revision_id: Option<String>,
}

fn revision_of(environment: &Environment, revision_id: &str) -> Revision {
    environment
        .revision(revision_id)
        .cloned()
        .unwrap_or_else(|| Revision::reference(revision_id))
}

fn resolve_revision_id(environment: &Environment, revision_id: Option<&str>) -> Result<String> {
    match revision_id {
        Some(id) => Ok(id.to_string()),
        None => environment
            .active_revision()
            .map(|revision| revision.id.clone())
            .ok_or_else(|| Error::NoActiveRevision {
                environment_id: environment.id().to_string(),
            }),
    }
}

fn unexpected(operation: Operation) -> Error {
    Error::UnexpectedResponse { operation }
}
