// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Shared rendering helpers for command output.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use miette::Result;
use serde::Serialize;

#[cfg(test)]
#[path = "./output_test.rs"]
mod output_test;

/// How a command prints its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Table,
    Yaml,
    Json,
}

/// Render `value` as YAML or JSON, or `None` for the table format.
pub fn serialized<T: Serialize>(format: Format, value: &T) -> Result<Option<String>> {
    match format {
        Format::Table => Ok(None),
        Format::Yaml => serde_yaml::to_string(value)
            .map(Some)
            .map_err(|e| miette::miette!("Failed to render YAML: {e}")),
        Format::Json => serde_json::to_string_pretty(value)
            .map(Some)
            .map_err(|e| miette::miette!("Failed to render JSON: {e}")),
    }
}

/// Colored build status.
pub fn status(revision: Option<&domenv::Revision>) -> ColoredString {
    let Some(revision) = revision else {
        return "-".dimmed();
    };
    let text = revision.status.to_string();
    match revision.status {
        domenv::BuildStatus::Succeeded => text.green(),
        domenv::BuildStatus::Failed | domenv::BuildStatus::Stopped => text.red(),
        domenv::BuildStatus::Queued | domenv::BuildStatus::Building => text.yellow(),
        domenv::BuildStatus::Unknown => text.dimmed(),
    }
}

/// Short label for a revision pointer: its number when known, else its id.
pub fn revision_label(revision: Option<&domenv::Revision>) -> String {
    match revision {
        None => "-".to_string(),
        Some(revision) => match revision.number {
            Some(number) => format!("#{number}"),
            None => revision.id.clone(),
        },
    }
}

/// Print a titled block of lines, or a placeholder when empty.
pub fn print_block(title: &str, lines: &[String]) {
    println!("{}", title.bold());
    if lines.iter().all(|line| line.is_empty()) {
        println!("  {}", "(none)".dimmed());
    } else {
        for line in lines {
            println!("  {line}");
        }
    }
}
