// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Decoding of the revision source archive served by the build service.

use std::io::Read;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::revision::RevisionContent;

#[cfg(test)]
#[path = "./archive_test.rs"]
mod archive_test;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Lines generated by the service before the user's Dockerfile instructions.
const DOCKERFILE_PREAMBLE_LINES: usize = 2;

/// Lines generated by the service after the user's Dockerfile instructions.
const DOCKERFILE_EPILOGUE_LINES: usize = 2;

/// Parse a (possibly gzipped) tar archive of revision sources.
///
/// Members are matched by file name regardless of directory; unknown
/// members are skipped.
pub fn parse_revision_archive(bytes: &[u8]) -> std::io::Result<RevisionContent> {
    if bytes.starts_with(&GZIP_MAGIC) {
        read_entries(Archive::new(GzDecoder::new(bytes)))
    } else {
        read_entries(Archive::new(bytes))
    }
}

fn read_entries<R: Read>(mut archive: Archive<R>) -> std::io::Result<RevisionContent> {
    let mut content = RevisionContent::default();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let file_name = {
            let path = entry.path()?;
            path.file_name().and_then(|n| n.to_str()).map(String::from)
        };
        let Some(file_name) = file_name else {
            continue;
        };

        let slot = match file_name.as_str() {
            "Dockerfile" => None,
            "preSetupScript.sh" => Some(&mut content.pre_setup_script),
            "postSetupScript.sh" => Some(&mut content.post_setup_script),
            "preRunScript.sh" => Some(&mut content.pre_run_script),
            "postRunScript.sh" => Some(&mut content.post_run_script),
            _ => {
                tracing::trace!(member = %file_name, "skipping archive member");
                continue;
            }
        };

        let mut text = String::new();
        entry.read_to_string(&mut text)?;
        let lines: Vec<String> = text.lines().map(String::from).collect();

        match slot {
            Some(slot) => *slot = lines,
            None => {
                let (base_image, instructions) = split_dockerfile(lines);
                content.base_image = base_image;
                content.dockerfile_instructions = instructions;
            }
        }
    }

    Ok(content)
}

/// Split a generated Dockerfile into its base image and user instructions.
pub fn split_dockerfile(lines: Vec<String>) -> (Option<String>, Vec<String>) {
    let base_image = lines.first().and_then(|first| {
        let image = first.trim().strip_prefix("FROM ").unwrap_or(first).trim();
        (!image.is_empty()).then(|| image.to_string())
    });

    let end = lines.len().saturating_sub(DOCKERFILE_EPILOGUE_LINES);
    let instructions = if end > DOCKERFILE_PREAMBLE_LINES {
        lines[DOCKERFILE_PREAMBLE_LINES..end].to_vec()
    } else {
        Vec::new()
    };

    (base_image, instructions)
}
