// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `domenv archive` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

use crate::Connection;

/// Archive environments
#[derive(Debug, Args)]
pub struct CmdArchive {
    /// Ids of the environments to archive
    #[clap(required = true)]
    environments: Vec<String>,
}

impl CmdArchive {
    pub fn run(&mut self, connection: &Connection) -> Result<i32> {
        let manager = connection.connect()?;
        let mut failed = 0;
        for id in &self.environments {
            match manager.archive_environment(id) {
                Ok(()) => println!("{} {}", "Archived".green(), id.cyan()),
                Err(err) => {
                    tracing::error!("{:?}", miette::Report::new(err));
                    failed += 1;
                }
            }
        }
        Ok(if failed == 0 { 0 } else { 1 })
    }
}
