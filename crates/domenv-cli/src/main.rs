// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! domenv - Environment and Revision Lifecycle CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_archive;
mod cmd_create;
mod cmd_list;
mod cmd_revise;
mod cmd_revision;
mod cmd_show;
mod output;

use cmd_archive::CmdArchive;
use cmd_create::CmdCreate;
use cmd_list::CmdList;
use cmd_revise::CmdRevise;
use cmd_revision::CmdRevision;
use cmd_show::CmdShow;

#[cfg(test)]
#[path = "./main_test.rs"]
mod main_test;

#[derive(Parser)]
#[clap(
    name = "domenv",
    about = "Environment and Revision Lifecycle Client",
    version,
    long_about = "Create, revise, inspect and archive execution environments"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(flatten)]
    connection: Connection,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

impl Logging {
    /// Flags win; without any, fall back to the log level variable.
    fn level(&self, from_env: Option<&str>) -> tracing::Level {
        match (self.quiet, self.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => from_env
                .and_then(parse_level)
                .unwrap_or(tracing::Level::INFO),
            (false, 1) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        }
    }
}

/// Parse a level name, also accepting the `WARNING` and `CRITICAL` spellings.
fn parse_level(text: &str) -> Option<tracing::Level> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("warning") {
        return Some(tracing::Level::WARN);
    }
    if text.eq_ignore_ascii_case("critical") || text.eq_ignore_ascii_case("fatal") {
        return Some(tracing::Level::ERROR);
    }
    text.parse().ok()
}

/// Where the service lives and how to authenticate against it.
///
/// Anything not given here falls back to the DOMINO_* environment variables.
#[derive(Parser, Clone, Debug, Default)]
pub struct Connection {
    /// Base URL of the deployment
    #[clap(long, global = true)]
    pub host: Option<String>,

    /// API key, takes precedence over --token-file
    #[clap(long, global = true)]
    pub api_key: Option<String>,

    /// File holding a bearer token, read on every request
    #[clap(long, global = true)]
    pub token_file: Option<PathBuf>,
}

impl Connection {
    pub fn config(&self) -> domenv::ClientConfig {
        let mut config = domenv::ClientConfig::new();
        if let Some(host) = &self.host {
            config = config.with_host(host);
        }
        if let Some(api_key) = &self.api_key {
            config = config.with_api_key(api_key);
        }
        if let Some(path) = &self.token_file {
            config = config.with_token_file(path);
        }
        config
    }

    pub fn connect(&self) -> Result<domenv::EnvironmentManager> {
        Ok(domenv::EnvironmentManager::connect(&self.config())?)
    }
}

#[derive(Subcommand)]
enum Command {
    /// List environments visible to the caller
    List(CmdList),

    /// Display one environment, or the deployment default
    Show(CmdShow),

    /// Create a new environment and its first revision
    Create(CmdCreate),

    /// Archive environments
    Archive(CmdArchive),

    /// Submit a new revision from a revision manifest
    Revise(CmdRevise),

    /// Display the build sources of a revision
    Revision(CmdRevision),
}

impl Opt {
    fn run(self) -> Result<i32> {
        let from_env = std::env::var(domenv::auth::LOG_LEVEL_ENV_VAR).ok();
        let log_level = self.logging.level(from_env.as_deref());

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        let connection = self.connection;
        match self.cmd {
            Command::List(mut cmd) => cmd.run(&connection),
            Command::Show(mut cmd) => cmd.run(&connection),
            Command::Create(mut cmd) => cmd.run(&connection),
            Command::Archive(mut cmd) => cmd.run(&connection),
            Command::Revise(mut cmd) => cmd.run(&connection),
            Command::Revision(mut cmd) => cmd.run(&connection),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
