// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use rstest::rstest;

use super::*;

fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

#[rstest]
fn test_explicit_values_win() {
    let config = ClientConfig::new()
        .with_host("https://explicit.example.com/")
        .with_api_key("explicit-key");
    let creds = config
        .resolve_with(env_of(&[
            (HOST_ENV_VAR, "https://env.example.com"),
            (API_KEY_ENV_VAR, "env-key"),
        ]))
        .unwrap();

    assert_eq!(creds.host, "https://explicit.example.com");
    match creds.auth {
        Auth::ApiKey(key) => assert_eq!(key.expose_secret(), "explicit-key"),
        other => panic!("expected api key auth, got {other:?}"),
    }
}

#[rstest]
fn test_environment_fallback() {
    let creds = ClientConfig::new()
        .resolve_with(env_of(&[
            (HOST_ENV_VAR, "https://env.example.com"),
            (API_KEY_ENV_VAR, "env-key"),
            (TOKEN_FILE_ENV_VAR, "/var/run/token"),
        ]))
        .unwrap();

    assert_eq!(creds.host, "https://env.example.com");
    assert_eq!(creds.auth.kind(), "api-key");
}

#[rstest]
fn test_explicit_token_file_beats_environment_key() {
    let creds = ClientConfig::new()
        .with_host("https://example.com")
        .with_token_file("/tmp/token")
        .resolve_with(env_of(&[(API_KEY_ENV_VAR, "env-key")]))
        .unwrap();
    assert!(matches!(creds.auth, Auth::TokenFile(ref p) if p == &PathBuf::from("/tmp/token")));
}

#[rstest]
fn test_token_file_from_environment() {
    let creds = ClientConfig::new()
        .resolve_with(env_of(&[
            (HOST_ENV_VAR, "https://env.example.com"),
            (TOKEN_FILE_ENV_VAR, "/var/run/token"),
        ]))
        .unwrap();
    assert_eq!(creds.auth.kind(), "bearer-token");
}

#[rstest]
fn test_missing_host() {
    let result = ClientConfig::new()
        .with_api_key("key")
        .resolve_with(env_of(&[(HOST_ENV_VAR, "  ")]));
    assert!(matches!(result, Err(Error::MissingHost)));
}

#[rstest]
fn test_missing_credentials() {
    let result = ClientConfig::new()
        .with_host("https://example.com")
        .resolve_with(env_of(&[]));
    assert!(matches!(result, Err(Error::MissingCredentials)));
}

#[rstest]
#[case("example.com")]
#[case("")]
fn test_invalid_host(#[case] host: &str) {
    assert!(matches!(
        clean_host_url(host),
        Err(Error::InvalidHost { .. })
    ));
}

#[rstest]
#[case("https://example.com", "https://example.com")]
#[case("https://example.com///", "https://example.com")]
#[case(" http://localhost:8080/ ", "http://localhost:8080")]
fn test_clean_host_url(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(clean_host_url(input).unwrap(), expected);
}

#[rstest]
fn test_token_file_header_is_read_per_request() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("token");
    std::fs::write(&path, "first\n").unwrap();
    let auth = Auth::TokenFile(path.clone());

    assert_eq!(
        auth.header().unwrap(),
        ("Authorization", "Bearer first".to_string())
    );
    std::fs::write(&path, "second").unwrap();
    assert_eq!(auth.header().unwrap().1, "Bearer second");
}

#[rstest]
fn test_missing_token_file_is_a_transport_error() {
    let auth = Auth::TokenFile(PathBuf::from("/nonexistent/domenv/token"));
    assert!(matches!(
        auth.header(),
        Err(TransportError::TokenFile { .. })
    ));
}

#[rstest]
fn test_api_key_is_redacted_in_debug() {
    let config = ClientConfig::new().with_api_key("super-secret");
    assert!(!format!("{config:?}").contains("super-secret"));
}
