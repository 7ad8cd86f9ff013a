// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `domenv show` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

use crate::output::{revision_label, serialized, status, Format};
use crate::Connection;

/// Display one environment, or the deployment default
#[derive(Debug, Args)]
pub struct CmdShow {
    /// Id of the environment to show
    #[clap(required_unless_present = "default", conflicts_with = "default")]
    environment: Option<String>,

    /// Show the deployment's default environment instead
    #[clap(long)]
    default: bool,

    /// Output format
    #[clap(long, value_enum, default_value_t)]
    format: Format,
}

impl CmdShow {
    pub fn run(&mut self, connection: &Connection) -> Result<i32> {
        let manager = connection.connect()?;
        let env = match &self.environment {
            Some(id) => manager.get_environment(id)?,
            None => manager.get_default_environment()?,
        };

        if let Some(text) = serialized(self.format, &env)? {
            print!("{text}");
            return Ok(0);
        }

        println!("{} {}", env.name().bold(), format!("({})", env.id()).dimmed());
        if env.archived() {
            println!("  {}", "archived".red());
        }
        println!("  visibility: {}", env.visibility());
        if let Some(owner) = env.owner() {
            println!("  owner:      {}", owner.name().cyan());
        }
        if !env.supported_clusters().is_empty() {
            println!("  clusters:   {}", env.supported_clusters().join(", "));
        }
        println!(
            "  active:     {} {}",
            revision_label(env.active_revision()),
            status(env.active_revision())
        );
        println!(
            "  latest:     {} {}",
            revision_label(env.latest_revision()),
            status(env.latest_revision())
        );

        if !env.description().is_empty() {
            println!();
            for line in env.description().lines() {
                println!("  {}", line.dimmed());
            }
        }

        if let Some(active) = env.active_revision() {
            if !active.available_tools.is_empty() {
                println!();
                println!("{}", "Workspace Tools:".bold());
                for tool in &active.available_tools {
                    println!("  - {} {}", tool.name.green(), tool.title.dimmed());
                }
            }
        }

        Ok(0)
    }
}
