// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `domenv revision` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

use crate::output::{print_block, revision_label, serialized, status, Format};
use crate::Connection;

/// Display the build sources of a revision
#[derive(Debug, Args)]
pub struct CmdRevision {
    /// Id of the environment
    environment: String,

    /// Revision to show, defaults to the active one
    #[clap(long, conflicts_with = "latest")]
    revision: Option<String>,

    /// Show the latest revision instead of the active one
    #[clap(long)]
    latest: bool,

    /// Output format
    #[clap(long, value_enum, default_value_t)]
    format: Format,
}

impl CmdRevision {
    pub fn run(&mut self, connection: &Connection) -> Result<i32> {
        let manager = connection.connect()?;
        let env = manager.get_environment(&self.environment)?;

        let revision_id = match (&self.revision, self.latest) {
            (Some(id), _) => Some(id.as_str()),
            (None, true) => match env.latest_revision() {
                Some(latest) => Some(latest.id.as_str()),
                None => {
                    tracing::error!(environment = env.id(), "environment has no revisions");
                    return Ok(1);
                }
            },
            (None, false) => None,
        };
        let details = manager.get_revision_details(&env, revision_id)?;

        if let Some(text) = serialized(self.format, details.as_ref())? {
            print!("{text}");
            return Ok(0);
        }

        let revision = &details.revision;
        println!(
            "{} {} {} {}",
            env.name().bold(),
            revision_label(Some(revision)).cyan(),
            status(Some(revision)),
            format!("({})", revision.id).dimmed()
        );
        if let Some(created) = revision.created_at {
            println!("  created: {}", created.to_rfc3339());
        }
        println!(
            "  base image: {}",
            details
                .content
                .base_image
                .as_deref()
                .unwrap_or("-")
                .green()
        );
        println!();

        let content = &details.content;
        print_block("Dockerfile Instructions:", &content.dockerfile_instructions);
        print_block("Pre-Setup Script:", &content.pre_setup_script);
        print_block("Post-Setup Script:", &content.post_setup_script);
        print_block("Pre-Run Script:", &content.pre_run_script);
        print_block("Post-Run Script:", &content.post_run_script);

        Ok(0)
    }
}
