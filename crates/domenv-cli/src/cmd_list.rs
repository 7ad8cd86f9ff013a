// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `domenv list` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

use crate::output::{revision_label, serialized, status, Format};
use crate::Connection;

/// List environments visible to the caller
#[derive(Debug, Args)]
pub struct CmdList {
    /// Include archived environments
    #[clap(short, long)]
    all: bool,

    /// Output format
    #[clap(long, value_enum, default_value_t)]
    format: Format,
}

impl CmdList {
    pub fn run(&mut self, connection: &Connection) -> Result<i32> {
        let manager = connection.connect()?;
        let environments: Vec<_> = manager
            .list_environments()?
            .into_iter()
            .filter(|env| self.all || !env.archived())
            .collect();

        if let Some(text) = serialized(self.format, &environments)? {
            print!("{text}");
            return Ok(0);
        }

        if environments.is_empty() {
            println!("{}", "(no environments)".dimmed());
            return Ok(0);
        }

        for env in &environments {
            let archived = if env.archived() { " [archived]" } else { "" };
            println!(
                "{}  {}{}",
                env.id().cyan(),
                env.name().bold(),
                archived.red()
            );
            println!(
                "    visibility: {}  active: {} {}  latest: {} {}",
                env.visibility(),
                revision_label(env.active_revision()),
                status(env.active_revision()),
                revision_label(env.latest_revision()),
                status(env.latest_revision()),
            );
        }
        println!();
        println!("Total: {} environment(s)", environments.len());

        Ok(0)
    }
}
