// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `domenv revise` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use domenv::{RevisionManifest, RevisionSpec};
use miette::Result;

use crate::output::{serialized, Format};
use crate::Connection;

/// Submit a new revision from a revision manifest
#[derive(Debug, Args)]
pub struct CmdRevise {
    /// Id of the environment to revise
    environment: String,

    /// Revision manifest to submit
    #[clap(short = 'f', long, default_value = domenv::REVISION_MANIFEST_FILENAME)]
    file: PathBuf,

    /// Ignore the build cache
    #[clap(long)]
    force_rebuild: bool,

    /// Build with VPN access
    #[clap(long)]
    vpn: bool,

    /// Summary of the change, overriding the manifest
    #[clap(short, long)]
    summary: Option<String>,

    /// Validate and print the revision without submitting it
    #[clap(long)]
    dry_run: bool,

    /// Output format
    #[clap(long, value_enum, default_value_t)]
    format: Format,
}

impl CmdRevise {
    fn spec(&self) -> domenv::Result<RevisionSpec> {
        let mut builder = RevisionManifest::load(&self.file)?.into_builder()?;
        if self.force_rebuild {
            builder = builder.force_rebuild(true);
        }
        if self.vpn {
            builder = builder.should_use_vpn(true);
        }
        if let Some(summary) = &self.summary {
            builder = builder.summary(summary);
        }
        builder.build()
    }

    pub fn run(&mut self, connection: &Connection) -> Result<i32> {
        let spec = self.spec()?;
        tracing::debug!(file = %self.file.display(), "loaded revision manifest");

        if self.dry_run {
            let text = serialized(self.format, &spec)?;
            match text {
                Some(text) => print!("{text}"),
                None => println!(
                    "{} {} revision for {}",
                    "Valid".green(),
                    spec.image_type(),
                    self.environment.cyan()
                ),
            }
            return Ok(0);
        }

        let manager = connection.connect()?;
        let revision = manager.create_revision(&self.environment, spec)?;

        if let Some(text) = serialized(self.format, &revision)? {
            print!("{text}");
            return Ok(0);
        }

        println!(
            "{} revision {} of {} ({})",
            "Submitted".green(),
            revision.id.cyan(),
            self.environment.bold(),
            revision.status
        );
        if let Some(url) = &revision.url {
            println!("  {}", url.dimmed());
        }
        Ok(0)
    }
}
