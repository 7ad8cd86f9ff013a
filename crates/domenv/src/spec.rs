// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! The validated description of one requested environment revision.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::normalize::{
    normalize_cluster_types, normalize_env_vars, normalize_lines, normalize_text,
    ClusterTypesInput, EnvVarsInput, EnvironmentVariables, TextInput,
};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./spec_test.rs"]
mod spec_test;

/// Where the image of a revision comes from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ImageType {
    /// The deployment's default base image.
    #[serde(rename = "DefaultImage")]
    #[strum(to_string = "DefaultImage", serialize = "default")]
    Default,
    /// An arbitrary docker image reference.
    #[serde(rename = "CustomImage")]
    #[strum(to_string = "CustomImage", serialize = "custom")]
    Custom,
    /// A revision of another environment.
    #[serde(rename = "Environment")]
    #[strum(to_string = "Environment")]
    Environment,
}

/// Cluster frameworks an environment can serve as a worker image for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ClusterType {
    Spark,
    Ray,
    Dask,
    #[serde(rename = "MPI")]
    #[strum(to_string = "MPI")]
    Mpi,
}

/// The image a revision builds on, carrying only the reference its type needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "image_type")]
pub enum ImageSource {
    #[serde(rename = "DefaultImage")]
    Default,
    #[serde(rename = "CustomImage")]
    Custom { docker_image: String },
    #[serde(rename = "Environment")]
    Environment { base_environment_revision_id: String },
}

impl ImageSource {
    /// Validate an image type against its companion references.
    ///
    /// Empty or whitespace-only references count as absent.
    pub fn from_parts(
        image_type: ImageType,
        docker_image: Option<String>,
        base_environment_revision_id: Option<String>,
    ) -> Result<Self> {
        let docker_image = docker_image.filter(|s| !s.trim().is_empty());
        let base = base_environment_revision_id.filter(|s| !s.trim().is_empty());

        match (image_type, docker_image, base) {
            (ImageType::Default, None, None) => Ok(Self::Default),
            (ImageType::Default, Some(image), _) => Err(Error::InvalidRevisionSpec(format!(
                "DefaultImage does not take a docker image, got {image:?}"
            ))),
            (ImageType::Default, None, Some(base)) => Err(Error::InvalidRevisionSpec(format!(
                "DefaultImage does not take a base environment revision, got {base:?}"
            ))),
            (ImageType::Custom, Some(docker_image), None) => Ok(Self::Custom { docker_image }),
            (ImageType::Custom, None, _) => Err(Error::InvalidRevisionSpec(
                "CustomImage requires a docker image".to_string(),
            )),
            (ImageType::Custom, Some(_), Some(base)) => Err(Error::InvalidRevisionSpec(format!(
                "CustomImage does not take a base environment revision, got {base:?}"
            ))),
            (ImageType::Environment, None, Some(base_environment_revision_id)) => {
                Ok(Self::Environment {
                    base_environment_revision_id,
                })
            }
            (ImageType::Environment, _, None) => Err(Error::InvalidRevisionSpec(
                "Environment requires a base environment revision id".to_string(),
            )),
            (ImageType::Environment, Some(image), Some(_)) => {
                Err(Error::InvalidRevisionSpec(format!(
                    "Environment does not take a docker image, got {image:?}"
                )))
            }
        }
    }

    pub fn image_type(&self) -> ImageType {
        match self {
            Self::Default => ImageType::Default,
            Self::Custom { .. } => ImageType::Custom,
            Self::Environment { .. } => ImageType::Environment,
        }
    }

    pub fn docker_image(&self) -> Option<&str> {
        match self {
            Self::Custom { docker_image } => Some(docker_image),
            _ => None,
        }
    }

    pub fn base_environment_revision_id(&self) -> Option<&str> {
        match self {
            Self::Environment {
                base_environment_revision_id,
            } => Some(base_environment_revision_id),
            _ => None,
        }
    }
}

/// The four lifecycle scripts of a revision, each one multi-line blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleScripts {
    pub pre_setup: String,
    pub post_setup: String,
    pub pre_run: String,
    pub post_run: String,
}

/// Validated, immutable request for one environment revision.
///
/// Only obtainable through [`RevisionSpecBuilder`], so every value held here
/// has already been normalized and cross-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionSpec {
    #[serde(flatten)]
    image: ImageSource,
    dockerfile_instructions: Vec<String>,
    workspace_tools: Vec<String>,
    scripts: LifecycleScripts,
    docker_arguments: String,
    environment_variables: EnvironmentVariables,
    cluster_types: BTreeSet<ClusterType>,
    force_rebuild: bool,
    should_use_vpn: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

impl RevisionSpec {
    /// Start building a spec for the given image type.
    pub fn builder(image_type: ImageType) -> RevisionSpecBuilder {
        RevisionSpecBuilder::new(image_type)
    }

    pub fn image(&self) -> &ImageSource {
        &self.image
    }

    pub fn image_type(&self) -> ImageType {
        self.image.image_type()
    }

    /// Dockerfile lines, in order and verbatim.
    pub fn dockerfile_instructions(&self) -> &[String] {
        &self.dockerfile_instructions
    }

    /// Raw workspace tool declaration blocks, in order.
    pub fn workspace_tools(&self) -> &[String] {
        &self.workspace_tools
    }

    pub fn scripts(&self) -> &LifecycleScripts {
        &self.scripts
    }

    pub fn docker_arguments(&self) -> &str {
        &self.docker_arguments
    }

    pub fn environment_variables(&self) -> &EnvironmentVariables {
        &self.environment_variables
    }

    /// Cluster affinities; empty means the general pool.
    pub fn cluster_types(&self) -> &BTreeSet<ClusterType> {
        &self.cluster_types
    }

    /// Hint to the remote builder to skip its build cache.
    pub fn force_rebuild(&self) -> bool {
        self.force_rebuild
    }

    pub fn should_use_vpn(&self) -> bool {
        self.should_use_vpn
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

/// Collects revision settings, normalizing each one as it is given.
///
/// Validation of the image reference happens in [`RevisionSpecBuilder::build`].
#[derive(Debug, Clone)]
pub struct RevisionSpecBuilder {
    image_type: ImageType,
    docker_image: Option<String>,
    base_environment_revision_id: Option<String>,
    dockerfile_instructions: Vec<String>,
    workspace_tools: Vec<String>,
    scripts: LifecycleScripts,
    docker_arguments: String,
    environment_variables: EnvironmentVariables,
    cluster_types: BTreeSet<ClusterType>,
    force_rebuild: bool,
    should_use_vpn: bool,
    summary: Option<String>,
}

impl RevisionSpecBuilder {
    pub fn new(image_type: ImageType) -> Self {
        Self {
            image_type,
            docker_image: None,
            base_environment_revision_id: None,
            dockerfile_instructions: Vec::new(),
            workspace_tools: Vec::new(),
            scripts: LifecycleScripts::default(),
            docker_arguments: String::new(),
            environment_variables: EnvironmentVariables::new(),
            cluster_types: BTreeSet::new(),
            force_rebuild: false,
            should_use_vpn: false,
            summary: None,
        }
    }

    #[must_use]
    pub fn docker_image(mut self, docker_image: impl Into<String>) -> Self {
        self.docker_image = Some(docker_image.into());
        self
    }

    #[must_use]
    pub fn base_environment_revision_id(mut self, revision_id: impl Into<String>) -> Self {
        self.base_environment_revision_id = Some(revision_id.into());
        self
    }

    #[must_use]
    pub fn dockerfile_instructions(mut self, instructions: impl Into<TextInput>) -> Self {
        self.dockerfile_instructions = normalize_lines(instructions);
        self
    }

    #[must_use]
    pub fn workspace_tools(mut self, tools: impl Into<TextInput>) -> Self {
        self.workspace_tools = normalize_lines(tools);
        self
    }

    #[must_use]
    pub fn pre_setup_script(mut self, script: impl Into<TextInput>) -> Self {
        self.scripts.pre_setup = normalize_text(script);
        self
    }

    #[must_use]
    pub fn post_setup_script(mut self, script: impl Into<TextInput>) -> Self {
        self.scripts.post_setup = normalize_text(script);
        self
    }

    #[must_use]
    pub fn pre_run_script(mut self, script: impl Into<TextInput>) -> Self {
        self.scripts.pre_run = normalize_text(script);
        self
    }

    #[must_use]
    pub fn post_run_script(mut self, script: impl Into<TextInput>) -> Self {
        self.scripts.post_run = normalize_text(script);
        self
    }

    #[must_use]
    pub fn docker_arguments(mut self, arguments: impl Into<TextInput>) -> Self {
        self.docker_arguments = normalize_text(arguments);
        self
    }

    #[must_use]
    pub fn environment_variables(mut self, variables: impl Into<EnvVarsInput>) -> Self {
        self.environment_variables = normalize_env_vars(variables);
        self
    }

    /// Set already normalized environment variables.
    #[must_use]
    pub fn normalized_environment_variables(mut self, variables: EnvironmentVariables) -> Self {
        self.environment_variables = variables;
        self
    }

    #[must_use]
    pub fn cluster_types(mut self, cluster_types: impl Into<ClusterTypesInput>) -> Self {
        self.cluster_types = normalize_cluster_types(cluster_types);
        self
    }

    #[must_use]
    pub fn force_rebuild(mut self, force_rebuild: bool) -> Self {
        self.force_rebuild = force_rebuild;
        self
    }

    #[must_use]
    pub fn should_use_vpn(mut self, should_use_vpn: bool) -> Self {
        self.should_use_vpn = should_use_vpn;
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        self.summary = (!summary.is_empty()).then_some(summary);
        self
    }

    /// Validate and freeze the collected settings.
    pub fn build(self) -> Result<RevisionSpec> {
        let image = ImageSource::from_parts(
            self.image_type,
            self.docker_image,
            self.base_environment_revision_id,
        )?;

        Ok(RevisionSpec {
            image,
            dockerfile_instructions: self.dockerfile_instructions,
            workspace_tools: self.workspace_tools,
            scripts: self.scripts,
            docker_arguments: self.docker_arguments,
            environment_variables: self.environment_variables,
            cluster_types: self.cluster_types,
            force_rebuild: self.force_rebuild,
            should_use_vpn: self.should_use_vpn,
            summary: self.summary,
        })
    }
}
