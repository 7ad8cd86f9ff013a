// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! The request/response seam between the lifecycle core and the service.
//!
//! The core only speaks in [`Request`] and [`Response`] values; how they are
//! carried over the wire is up to the [`Transport`] implementation.

use std::path::PathBuf;

use thiserror::Error;

use crate::environment::{Environment, NewEnvironment};
use crate::revision::{Revision, RevisionContent};
use crate::spec::RevisionSpec;

/// The logical operations the service offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Operation {
    DeploymentVersion,
    GetEnvironment,
    ListEnvironments,
    GetDefaultEnvironment,
    CreateEnvironment,
    ArchiveEnvironment,
    CreateRevision,
    GetRevision,
}

/// A new revision as submitted to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionSubmission {
    pub spec: RevisionSpec,
    /// Base image of the deployment default, sent along with DefaultImage specs.
    pub default_environment_image: Option<String>,
    /// Active revision of the deployment default, sent along with DefaultImage specs.
    pub default_environment_revision_id: Option<String>,
}

/// One logical request, carrying its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    DeploymentVersion,
    GetEnvironment {
        environment_id: String,
    },
    ListEnvironments,
    GetDefaultEnvironment,
    CreateEnvironment {
        environment: NewEnvironment,
        default_environment_image: Option<String>,
        default_environment_revision_id: Option<String>,
    },
    ArchiveEnvironment {
        environment_id: String,
    },
    CreateRevision {
        environment_id: String,
        submission: RevisionSubmission,
    },
    GetRevision {
        environment_id: String,
        revision_id: String,
    },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Self::DeploymentVersion => Operation::DeploymentVersion,
            Self::GetEnvironment { .. } => Operation::GetEnvironment,
            Self::ListEnvironments => Operation::ListEnvironments,
            Self::GetDefaultEnvironment => Operation::GetDefaultEnvironment,
            Self::CreateEnvironment { .. } => Operation::CreateEnvironment,
            Self::ArchiveEnvironment { .. } => Operation::ArchiveEnvironment,
            Self::CreateRevision { .. } => Operation::CreateRevision,
            Self::GetRevision { .. } => Operation::GetRevision,
        }
    }
}

/// One logical response.
#[derive(Debug, Clone)]
pub enum Response {
    Version(String),
    Environment(Environment),
    Environments(Vec<Environment>),
    /// The default environment, or none when the deployment has none.
    DefaultEnvironment(Option<Environment>),
    Archived,
    Revision(Revision),
    RevisionContent(RevisionContent),
    /// A create was accepted but the service did not describe the result.
    Accepted,
}

/// Failures of the transport itself, passed through the core untouched.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid revision archive from {url}")]
    Archive {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read token file {path:?}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// The capability the lifecycle core needs from the outside world.
///
/// Every call is one blocking request/response exchange. Implementations
/// own timeouts and cancellation; the core never retries.
pub trait Transport: Send + Sync {
    fn execute(&self, request: Request) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: Request) -> Result<Response, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: Request) -> Result<Response, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: Request) -> Result<Response, TransportError> {
        (**self).execute(request)
    }
}
