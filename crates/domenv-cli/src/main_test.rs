// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use rstest::rstest;

use super::*;

#[rstest]
#[case(&["domenv", "list"], None, tracing::Level::INFO)]
#[case(&["domenv", "list"], Some("debug"), tracing::Level::DEBUG)]
#[case(&["domenv", "list"], Some("WARNING"), tracing::Level::WARN)]
#[case(&["domenv", "list"], Some("warn"), tracing::Level::WARN)]
#[case(&["domenv", "list"], Some("CRITICAL"), tracing::Level::ERROR)]
#[case(&["domenv", "list"], Some("nonsense"), tracing::Level::INFO)]
#[case(&["domenv", "-v", "list"], Some("error"), tracing::Level::DEBUG)]
#[case(&["domenv", "list", "-vv"], None, tracing::Level::TRACE)]
#[case(&["domenv", "-q", "list"], Some("trace"), tracing::Level::ERROR)]
fn test_log_level(
    #[case] args: &[&str],
    #[case] from_env: Option<&str>,
    #[case] expected: tracing::Level,
) {
    let opt = Opt::try_parse_from(args).unwrap();
    assert_eq!(opt.logging.level(from_env), expected);
}

#[rstest]
fn test_connection_flags_are_global() {
    let opt = Opt::try_parse_from([
        "domenv",
        "show",
        "env-1",
        "--host",
        "https://domino.example.com/",
        "--api-key",
        "secret",
    ])
    .unwrap();
    let credentials = opt.connection.config().resolve_with(|_| None).unwrap();
    assert_eq!(credentials.host, "https://domino.example.com");
    assert_eq!(credentials.auth.kind(), "api-key");
}

#[rstest]
fn test_missing_connection_falls_back_to_env() {
    let opt = Opt::try_parse_from(["domenv", "list"]).unwrap();
    let credentials = opt
        .connection
        .config()
        .resolve_with(|name| match name {
            domenv::auth::HOST_ENV_VAR => Some("https://env.example.com".to_string()),
            domenv::auth::TOKEN_FILE_ENV_VAR => Some("/run/secrets/token".to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(credentials.host, "https://env.example.com");
    assert_eq!(credentials.auth.kind(), "bearer-token");
}

#[rstest]
#[case(&["domenv", "show"])]
#[case(&["domenv", "show", "env-1", "--default"])]
#[case(&["domenv", "revision", "env-1", "--revision", "rev-1", "--latest"])]
#[case(&["domenv", "create", "My Env", "--image-type", "docker"])]
fn test_rejected_arguments(#[case] args: &[&str]) {
    assert!(Opt::try_parse_from(args).is_err());
}
