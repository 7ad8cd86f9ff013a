// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for domenv operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::transport::{Operation, TransportError};

/// Convenience Result type with domenv Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during domenv operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Caller input has a shape that cannot be normalized
    #[error("Invalid input for '{field}': expected text or a list of text, found {found}")]
    #[diagnostic(
        code(domenv::invalid_input_kind),
        help("Scripts and instructions accept a string or a list of strings")
    )]
    InvalidInputKind { field: String, found: String },

    /// Image type and image reference do not agree
    #[error("Invalid revision spec: {0}")]
    #[diagnostic(
        code(domenv::invalid_revision_spec),
        help(
            "CustomImage requires a docker image, Environment requires a base revision id, \
             DefaultImage accepts neither"
        )
    )]
    InvalidRevisionSpec(String),

    /// No revision of the environment has ever built successfully
    #[error("Environment {environment_id} has no active revision")]
    #[diagnostic(
        code(domenv::no_active_revision),
        help("Pass an explicit revision id, or wait for a build to succeed")
    )]
    NoActiveRevision { environment_id: String },

    /// The service has no default environment for this caller
    #[error("No default environment is configured for this deployment")]
    #[diagnostic(code(domenv::no_default_environment))]
    NoDefaultEnvironment,

    /// No host given and none found in the environment
    #[error("No API host configured")]
    #[diagnostic(
        code(domenv::missing_host),
        help("Pass --host or set DOMINO_API_HOST")
    )]
    MissingHost,

    /// Host is not a valid URL
    #[error("Invalid API host {host:?}")]
    #[diagnostic(code(domenv::invalid_host))]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },

    /// Neither an API key nor a token file could be resolved
    #[error("No credentials configured")]
    #[diagnostic(
        code(domenv::missing_credentials),
        help(
            "Either an API key or a token file must be provided, \
             explicitly or via DOMINO_USER_API_KEY / DOMINO_TOKEN_FILE"
        )
    )]
    MissingCredentials,

    /// Remote deployment is older than what this client supports
    #[error("Deployment version {version} is not compatible (minimum supported is {minimum})")]
    #[diagnostic(code(domenv::incompatible_version))]
    IncompatibleVersion { version: String, minimum: String },

    /// Invalid YAML in a revision manifest
    #[error("Invalid revision manifest: {error}")]
    #[diagnostic(
        code(domenv::invalid_manifest),
        help("Check YAML syntax and ensure 'api: domenv/v0' is present")
    )]
    InvalidManifest {
        #[source]
        error: serde_yaml::Error,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(domenv::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Transport answered with a response that does not belong to the request
    #[error("Unexpected response to {operation}")]
    #[diagnostic(code(domenv::unexpected_response))]
    UnexpectedResponse { operation: Operation },

    /// Transport error passthrough
    #[error(transparent)]
    #[diagnostic(code(domenv::transport_error))]
    Transport(#[from] TransportError),
}
