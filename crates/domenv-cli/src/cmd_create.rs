// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `domenv create` command.

use clap::Args;
use colored::Colorize;
use domenv::{ClusterType, ImageType, NewEnvironment, OwnerId, Visibility};
use miette::Result;

use crate::output::{serialized, Format};
use crate::Connection;

/// Create a new environment and its first revision
#[derive(Debug, Args)]
pub struct CmdCreate {
    /// Name of the new environment
    name: String,

    /// Image to build on: default, custom or environment
    #[clap(long, default_value = "default")]
    image_type: ImageType,

    /// Docker image reference, for --image-type custom
    #[clap(long)]
    docker_image: Option<String>,

    /// Revision to build on, for --image-type environment
    #[clap(long)]
    base_revision: Option<String>,

    /// Who may use the environment: private, organization or global
    #[clap(long, default_value = "private")]
    visibility: Visibility,

    /// Description line (repeatable)
    #[clap(short, long = "description")]
    description: Vec<String>,

    /// Organization owning the environment (organization visibility only)
    #[clap(long, conflicts_with = "user_owner")]
    org_owner: Option<String>,

    /// User owning the environment
    #[clap(long)]
    user_owner: Option<String>,

    /// Cluster framework the environment serves (repeatable)
    #[clap(long = "cluster")]
    clusters: Vec<ClusterType>,

    /// Output format
    #[clap(long, value_enum, default_value_t)]
    format: Format,
}

impl CmdCreate {
    fn request(&self) -> domenv::Result<NewEnvironment> {
        let mut builder = NewEnvironment::builder(&self.name, self.image_type, self.visibility)
            .description(self.description.clone())
            .cluster_types(self.clusters.clone());
        if let Some(image) = &self.docker_image {
            builder = builder.docker_image(image);
        }
        if let Some(revision) = &self.base_revision {
            builder = builder.base_environment_revision_id(revision);
        }
        if let Some(org) = &self.org_owner {
            builder = builder.owner(OwnerId::Organization(org.clone()));
        } else if let Some(user) = &self.user_owner {
            builder = builder.owner(OwnerId::User(user.clone()));
        }
        builder.build()
    }

    pub fn run(&mut self, connection: &Connection) -> Result<i32> {
        // validate before connecting
        let request = self.request()?;
        let manager = connection.connect()?;
        let created = manager.create_environment(request)?;

        if let Some(text) = serialized(self.format, &created)? {
            print!("{text}");
            return Ok(0);
        }

        println!(
            "{} {} {}",
            "Created".green(),
            created.name().bold(),
            format!("({})", created.id()).dimmed()
        );
        if let Some(latest) = created.latest_revision() {
            println!("  first revision {} is {}", latest.id.cyan(), latest.status);
        }
        Ok(0)
    }
}
