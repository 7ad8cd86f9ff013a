// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Server-assigned revisions and their materialized build sources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::LINE_SEPARATOR;
use crate::spec::{ImageType, RevisionSpec};
use crate::Result;

#[cfg(test)]
#[path = "./revision_test.rs"]
mod revision_test;

/// Build state of a revision as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, strum::Display)]
pub enum BuildStatus {
    Queued,
    Building,
    Succeeded,
    Failed,
    Stopped,
    #[serde(other)]
    Unknown,
}

impl BuildStatus {
    /// Whether the build will not change state any more.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Stopped)
    }
}

/// A workspace tool made available by a built revision.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceTool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub start: Vec<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub proxy_config: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_file_extensions: Vec<String>,
}

/// One build attempt of an environment, as known to the service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(default = "unknown_status")]
    pub status: BuildStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, alias = "created", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_tools: Vec<WorkspaceTool>,
}

fn unknown_status() -> BuildStatus {
    BuildStatus::Unknown
}

impl Revision {
    /// A reference to a revision known only by id.
    pub fn reference(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: None,
            status: BuildStatus::Unknown,
            url: None,
            created_at: None,
            environment_id: None,
            available_tools: Vec::new(),
        }
    }
}

/// The build sources of a revision, as it was built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevisionContent {
    /// Image named on the `FROM` line of the generated Dockerfile.
    pub base_image: Option<String>,
    /// User Dockerfile lines, without the service-generated preamble.
    pub dockerfile_instructions: Vec<String>,
    pub pre_setup_script: Vec<String>,
    pub post_setup_script: Vec<String>,
    pub pre_run_script: Vec<String>,
    pub post_run_script: Vec<String>,
}

/// Revision metadata together with the materialized build sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionDetails {
    pub environment_id: String,
    pub revision: Revision,
    #[serde(flatten)]
    pub content: RevisionContent,
}

impl RevisionDetails {
    /// Rebuild a spec that reproduces this revision on its concrete base image.
    pub fn to_revision_spec(&self) -> Result<RevisionSpec> {
        let mut builder = RevisionSpec::builder(ImageType::Custom)
            .dockerfile_instructions(self.content.dockerfile_instructions.clone())
            .pre_setup_script(self.content.pre_setup_script.join(LINE_SEPARATOR))
            .post_setup_script(self.content.post_setup_script.join(LINE_SEPARATOR))
            .pre_run_script(self.content.pre_run_script.join(LINE_SEPARATOR))
            .post_run_script(self.content.post_run_script.join(LINE_SEPARATOR));
        if let Some(image) = &self.content.base_image {
            builder = builder.docker_image(image.clone());
        }
        builder.build()
    }
}
