// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! domenv - Environment and Revision Lifecycle Client
//!
//! This crate provides a client for a remote execution-environment service:
//! enumerate, create, archive and revise docker-backed environments.
//!
//! # Overview
//!
//! An [`Environment`] is a named, versioned execution context. Each change
//! to its configuration is submitted as a [`RevisionSpec`] and becomes a new
//! server-side [`Revision`]. The environment tracks two revision pointers:
//! the *active* one (last successful build) and the *latest* one (last
//! attempt, whatever its outcome).
//!
//! Specs are validated when they are built, so nothing malformed ever
//! reaches the [`Transport`]. [`EnvironmentManager`] drives the lifecycle.
//!
//! # Example
//!
//! ```yaml
//! # revision.yaml
//! api: domenv/v0
//! image_type: environment
//! base_environment_revision_id: 64f0c3f2a9e1
//!
//! dockerfile_instructions:
//!   - RUN apt-get update
//!   - RUN apt-get install -y wget
//!
//! environment_variables:
//!   Key1: Val1
//! ```

pub mod archive;
pub mod auth;
pub mod cache;
pub mod environment;
pub mod error;
pub mod http;
pub mod manager;
pub mod manifest;
pub mod normalize;
pub mod revision;
pub mod spec;
pub mod transport;
pub mod version;

#[cfg(test)]
mod fixtures;

pub use auth::{Auth, ClientConfig, Credentials};
pub use cache::Cached;
pub use environment::{
    Description, Environment, NewEnvironment, NewEnvironmentBuilder, Owner, OwnerId, Visibility,
};
pub use error::{Error, Result};
pub use http::HttpTransport;
pub use manager::{Defaults, EnvironmentManager, EnvironmentRef};
pub use manifest::{RevisionManifest, REVISION_MANIFEST_FILENAME};
pub use normalize::{normalize_cluster_types, normalize_env_vars, normalize_lines, EnvironmentVariables};
pub use revision::{BuildStatus, Revision, RevisionContent, RevisionDetails, WorkspaceTool};
pub use spec::{ClusterType, ImageSource, ImageType, LifecycleScripts, RevisionSpec, RevisionSpecBuilder};
pub use transport::{Operation, Request, Response, RevisionSubmission, Transport, TransportError};
pub use version::{check_compatible, MINIMUM_SUPPORTED_VERSION};
