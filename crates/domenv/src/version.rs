// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Deployment version compatibility.

use semver::Version;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./version_test.rs"]
mod version_test;

/// Oldest deployment version this client talks to.
pub const MINIMUM_SUPPORTED_VERSION: &str = "4.1.0";

/// Parse a deployment version, tolerating a leading `v` and missing
/// minor/patch components.
pub fn parse_deployment_version(version: &str) -> Option<Version> {
    let trimmed = version.trim().trim_start_matches('v');
    if let Ok(parsed) = Version::parse(trimmed) {
        return Some(parsed);
    }

    let core = trimmed.split(['-', '+']).next().unwrap_or(trimmed);
    let mut parts = core.split('.').map(str::parse::<u64>);
    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// Fail unless `version` is at least [`MINIMUM_SUPPORTED_VERSION`].
pub fn check_compatible(version: &str) -> Result<()> {
    let minimum = Version::new(4, 1, 0);
    let incompatible = || Error::IncompatibleVersion {
        version: version.to_string(),
        minimum: MINIMUM_SUPPORTED_VERSION.to_string(),
    };

    let parsed = parse_deployment_version(version).ok_or_else(incompatible)?;
    // Pre-release tags on the deployment version do not make it older.
    let release = Version::new(parsed.major, parsed.minor, parsed.patch);
    if release < minimum {
        return Err(incompatible());
    }
    Ok(())
}
