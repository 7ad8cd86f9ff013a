// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Host and credential resolution.
//!
//! Explicit values win over the environment. An explicit API key wins over an
//! explicit token file, and both win over their `DOMINO_*` fallbacks.

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

use crate::transport::TransportError;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./auth_test.rs"]
mod auth_test;

/// Environment variable naming the API host.
pub const HOST_ENV_VAR: &str = "DOMINO_API_HOST";

/// Environment variable holding a user API key.
pub const API_KEY_ENV_VAR: &str = "DOMINO_USER_API_KEY";

/// Environment variable naming a file that holds a bearer token.
pub const TOKEN_FILE_ENV_VAR: &str = "DOMINO_TOKEN_FILE";

/// Environment variable selecting the log level of the CLI.
pub const LOG_LEVEL_ENV_VAR: &str = "DOMINO_LOG_LEVEL";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-Domino-Api-Key";

/// Explicitly supplied connection settings; anything unset falls back to the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub host: Option<String>,
    pub api_key: Option<SecretString>,
    pub token_file: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    #[must_use]
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<Credentials> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve using `lookup` in place of the process environment.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let host = self
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .or_else(|| env(HOST_ENV_VAR))
            .ok_or(Error::MissingHost)?;
        let host = clean_host_url(&host)?;

        let auth = if let Some(key) = &self.api_key {
            Auth::ApiKey(key.clone())
        } else if let Some(path) = &self.token_file {
            Auth::TokenFile(path.clone())
        } else if let Some(key) = env(API_KEY_ENV_VAR) {
            Auth::ApiKey(SecretString::from(key))
        } else if let Some(path) = env(TOKEN_FILE_ENV_VAR) {
            Auth::TokenFile(PathBuf::from(path))
        } else {
            return Err(Error::MissingCredentials);
        };

        tracing::debug!(%host, auth = auth.kind(), "resolved client credentials");
        Ok(Credentials { host, auth })
    }
}

/// Validate a host URL and strip trailing slashes.
pub fn clean_host_url(host: &str) -> Result<String> {
    let trimmed = host.trim().trim_end_matches('/');
    url::Url::parse(trimmed).map_err(|source| Error::InvalidHost {
        host: host.to_string(),
        source,
    })?;
    Ok(trimmed.to_string())
}

/// How requests are authenticated.
#[derive(Debug, Clone)]
pub enum Auth {
    /// Static API key, sent as [`API_KEY_HEADER`].
    ApiKey(SecretString),
    /// Bearer token read from this file on every request.
    TokenFile(PathBuf),
}

impl Auth {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiKey(_) => "api-key",
            Self::TokenFile(_) => "bearer-token",
        }
    }

    /// The header to attach to a request.
    pub fn header(&self) -> std::result::Result<(&'static str, String), TransportError> {
        match self {
            Self::ApiKey(key) => Ok((API_KEY_HEADER, key.expose_secret().to_string())),
            Self::TokenFile(path) => {
                let token = std::fs::read_to_string(path).map_err(|source| {
                    TransportError::TokenFile {
                        path: path.clone(),
                        source,
                    }
                })?;
                Ok(("Authorization", format!("Bearer {}", token.trim())))
            }
        }
    }
}

/// Resolved, immutable connection settings.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub host: String,
    pub auth: Auth,
}
