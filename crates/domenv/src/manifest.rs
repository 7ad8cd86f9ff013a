// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Revision manifests: a [`RevisionSpec`] written down as YAML.
//!
//! ```yaml
//! api: domenv/v0
//! image_type: custom
//! docker_image: ubuntu:22.04
//! dockerfile_instructions:
//!   - RUN apt-get update
//!   - RUN apt-get install -y wget
//! pre_run_script: |
//!   echo starting
//! environment_variables:
//!   PIP_INDEX_URL: https://pypi.example.com/simple
//! cluster_types: [Spark]
//! summary: add wget
//! ```
//!
//! Text fields take a string or a list of strings, environment variables a
//! mapping or a list of pairs; both are normalized on the way in.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::normalize::{
    cluster_types_from_value, env_vars_from_value, lines_from_value, text_from_value,
};
use crate::spec::{ImageType, RevisionSpec, RevisionSpecBuilder};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./manifest_test.rs"]
mod manifest_test;

/// Conventional file name of a revision manifest.
pub const REVISION_MANIFEST_FILENAME: &str = "revision.yaml";

/// API version for manifest files.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "domenv/v0")]
    V0,
}

#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ApiVersion,
}

/// A revision as written in a manifest file, before normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RevisionManifest {
    #[serde(default)]
    pub api: ApiVersion,

    /// `default`, `custom` or `environment` (the service names work too).
    #[serde(default = "default_image_type")]
    pub image_type: String,

    #[serde(default)]
    pub docker_image: Option<String>,

    #[serde(default)]
    pub base_environment_revision_id: Option<String>,

    #[serde(default)]
    pub dockerfile_instructions: Value,

    #[serde(default)]
    pub workspace_tools: Value,

    #[serde(default)]
    pub pre_setup_script: Value,

    #[serde(default)]
    pub post_setup_script: Value,

    #[serde(default)]
    pub pre_run_script: Value,

    #[serde(default)]
    pub post_run_script: Value,

    #[serde(default)]
    pub docker_arguments: Value,

    #[serde(default)]
    pub environment_variables: Value,

    #[serde(default)]
    pub cluster_types: Value,

    #[serde(default)]
    pub force_rebuild: bool,

    #[serde(default)]
    pub should_use_vpn: bool,

    #[serde(default)]
    pub summary: Option<String>,
}

fn default_image_type() -> String {
    ImageType::Default.to_string()
}

impl RevisionManifest {
    /// Parse a manifest from YAML.
    pub fn from_yaml<S: Into<String>>(yaml: S) -> Result<Self> {
        let yaml = yaml.into();
        let invalid = |error| Error::InvalidManifest { error };

        let value: Value = serde_yaml::from_str(&yaml).map_err(invalid)?;
        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(invalid)?;

        match with_version.api {
            ApiVersion::V0 => serde_yaml::from_value(value).map_err(invalid),
        }
    }

    /// Load a manifest from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|error| Error::ReadFailed {
            path: path.to_path_buf(),
            error,
        })?;
        Self::from_yaml(yaml)
    }

    /// Normalize every field into a builder, leaving validation to
    /// [`RevisionSpecBuilder::build`] so callers can still adjust it.
    pub fn into_builder(self) -> Result<RevisionSpecBuilder> {
        let image_type: ImageType =
            self.image_type
                .parse()
                .map_err(|_| Error::InvalidInputKind {
                    field: "image_type".to_string(),
                    found: format!("unknown image type {:?}", self.image_type),
                })?;

        let mut builder = RevisionSpec::builder(image_type)
            .dockerfile_instructions(lines_from_value(
                "dockerfile_instructions",
                &self.dockerfile_instructions,
            )?)
            .workspace_tools(lines_from_value("workspace_tools", &self.workspace_tools)?)
            .pre_setup_script(text_from_value("pre_setup_script", &self.pre_setup_script)?)
            .post_setup_script(text_from_value("post_setup_script", &self.post_setup_script)?)
            .pre_run_script(text_from_value("pre_run_script", &self.pre_run_script)?)
            .post_run_script(text_from_value("post_run_script", &self.post_run_script)?)
            .docker_arguments(text_from_value("docker_arguments", &self.docker_arguments)?)
            .normalized_environment_variables(env_vars_from_value(
                "environment_variables",
                &self.environment_variables,
            )?)
            .cluster_types(cluster_types_from_value("cluster_types", &self.cluster_types)?)
            .force_rebuild(self.force_rebuild)
            .should_use_vpn(self.should_use_vpn);

        if let Some(image) = self.docker_image {
            builder = builder.docker_image(image);
        }
        if let Some(revision_id) = self.base_environment_revision_id {
            builder = builder.base_environment_revision_id(revision_id);
        }
        if let Some(summary) = self.summary {
            builder = builder.summary(summary);
        }
        Ok(builder)
    }

    /// Normalize and validate into a [`RevisionSpec`].
    pub fn into_spec(self) -> Result<RevisionSpec> {
        self.into_builder()?.build()
    }
}
