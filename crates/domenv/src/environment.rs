// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! The environment aggregate and the request used to create one.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cache::Cached;
use crate::normalize::{normalize_lines, ClusterTypesInput, TextInput, LINE_SEPARATOR};
use crate::revision::{Revision, RevisionDetails};
use crate::spec::{ImageType, RevisionSpec, RevisionSpecBuilder};
use crate::Result;

#[cfg(test)]
#[path = "./environment_test.rs"]
mod environment_test;

/// Who may use an environment.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum Visibility {
    #[default]
    Private,
    Organization,
    Global,
}

/// Owner of an environment: a user or an organization, never both.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "OwnerRecord", into = "OwnerRecord")]
pub enum Owner {
    User { id: String, username: Option<String> },
    Organization { id: String, name: Option<String> },
}

impl Owner {
    pub fn id(&self) -> &str {
        match self {
            Self::User { id, .. } | Self::Organization { id, .. } => id,
        }
    }

    /// Display name, falling back to the id.
    pub fn name(&self) -> &str {
        match self {
            Self::User { id, username } => username.as_deref().unwrap_or(id),
            Self::Organization { id, name } => name.as_deref().unwrap_or(id),
        }
    }
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct OwnerRecord {
    id: String,
    #[serde(default, alias = "username", alias = "userName", skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    is_organization: bool,
}

impl From<OwnerRecord> for Owner {
    fn from(record: OwnerRecord) -> Self {
        if record.is_organization {
            Self::Organization {
                id: record.id,
                name: record.name,
            }
        } else {
            Self::User {
                id: record.id,
                username: record.name,
            }
        }
    }
}

impl From<Owner> for OwnerRecord {
    fn from(owner: Owner) -> Self {
        match owner {
            Owner::User { id, username } => Self {
                id,
                name: username,
                is_organization: false,
            },
            Owner::Organization { id, name } => Self {
                id,
                name,
                is_organization: true,
            },
        }
    }
}

/// Owner requested for a new environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerId {
    User(String),
    Organization(String),
}

/// Environment description, kept as ordered lines and rendered joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Description(Vec<String>);

impl Description {
    pub fn new(text: impl Into<TextInput>) -> Self {
        Self(normalize_lines(text))
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|line| line.is_empty())
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(LINE_SEPARATOR))
    }
}

impl Serialize for Description {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Description {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Lines(Vec<String>),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            None => Self::default(),
            Some(Raw::Text(text)) => Self(text.split(LINE_SEPARATOR).map(String::from).collect()),
            Some(Raw::Lines(lines)) => Self(lines),
        })
    }
}

/// A named, versioned execution context as reported by the service.
///
/// This is a snapshot: the revision pointers only change by fetching the
/// environment again. Build sources of the active and latest revisions are
/// cached separately and only filled on an explicit fetch.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    id: String,
    name: String,
    #[serde(default)]
    description: Description,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<Owner>,
    #[serde(default)]
    archived: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    supported_clusters: Vec<String>,
    #[serde(
        default,
        rename = "selectedRevision",
        alias = "activeRevision",
        skip_serializing_if = "Option::is_none"
    )]
    active_revision: Option<Revision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latest_revision: Option<Revision>,
    #[serde(skip)]
    active_details: Cached<RevisionDetails>,
    #[serde(skip)]
    latest_details: Cached<RevisionDetails>,
}

impl Environment {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    pub fn archived(&self) -> bool {
        self.archived
    }

    pub fn supported_clusters(&self) -> &[String] {
        &self.supported_clusters
    }

    /// Most recent revision that built successfully.
    pub fn active_revision(&self) -> Option<&Revision> {
        self.active_revision.as_ref()
    }

    /// Most recent revision attempted, whatever its outcome.
    pub fn latest_revision(&self) -> Option<&Revision> {
        self.latest_revision.as_ref()
    }

    /// Revision metadata for an id, if it is one this snapshot points at.
    pub fn revision(&self, revision_id: &str) -> Option<&Revision> {
        self.active_revision
            .iter()
            .chain(self.latest_revision.iter())
            .find(|revision| revision.id == revision_id)
    }

    /// Cached build sources of the active revision.
    pub fn active_details(&self) -> &Cached<RevisionDetails> {
        &self.active_details
    }

    /// Cached build sources of the latest revision.
    pub fn latest_details(&self) -> &Cached<RevisionDetails> {
        &self.latest_details
    }

    /// The cache slot that holds details for `revision_id`, if any.
    pub(crate) fn details_slot(&self, revision_id: &str) -> Option<&Cached<RevisionDetails>> {
        if self.active_revision.as_ref().is_some_and(|r| r.id == revision_id) {
            Some(&self.active_details)
        } else if self.latest_revision.as_ref().is_some_and(|r| r.id == revision_id) {
            Some(&self.latest_details)
        } else {
            None
        }
    }

    /// Cached details for `revision_id`, without fetching.
    pub fn cached_details(&self, revision_id: &str) -> Option<Arc<RevisionDetails>> {
        self.details_slot(revision_id).and_then(Cached::get)
    }
}

/// A validated request to create an environment and its first revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEnvironment {
    pub name: String,
    pub visibility: Visibility,
    pub description: Description,
    pub owner: Option<OwnerId>,
    pub revision: RevisionSpec,
}

impl NewEnvironment {
    pub fn builder(
        name: impl Into<String>,
        image_type: ImageType,
        visibility: Visibility,
    ) -> NewEnvironmentBuilder {
        NewEnvironmentBuilder {
            name: name.into(),
            visibility,
            description: Description::default(),
            owner: None,
            revision: RevisionSpec::builder(image_type),
        }
    }
}

/// Collects settings for [`NewEnvironment`].
#[derive(Debug, Clone)]
pub struct NewEnvironmentBuilder {
    name: String,
    visibility: Visibility,
    description: Description,
    owner: Option<OwnerId>,
    revision: RevisionSpecBuilder,
}

impl NewEnvironmentBuilder {
    #[must_use]
    pub fn description(mut self, description: impl Into<TextInput>) -> Self {
        self.description = Description::new(description);
        self
    }

    #[must_use]
    pub fn owner(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }

    #[must_use]
    pub fn docker_image(mut self, docker_image: impl Into<String>) -> Self {
        self.revision = self.revision.docker_image(docker_image);
        self
    }

    #[must_use]
    pub fn base_environment_revision_id(mut self, revision_id: impl Into<String>) -> Self {
        self.revision = self.revision.base_environment_revision_id(revision_id);
        self
    }

    #[must_use]
    pub fn cluster_types(mut self, cluster_types: impl Into<ClusterTypesInput>) -> Self {
        self.revision = self.revision.cluster_types(cluster_types);
        self
    }

    /// Validate the implicit first revision and freeze the request.
    pub fn build(self) -> Result<NewEnvironment> {
        Ok(NewEnvironment {
            name: self.name,
            visibility: self.visibility,
            description: self.description,
            owner: self.owner,
            revision: self.revision.build()?,
        })
    }
}
