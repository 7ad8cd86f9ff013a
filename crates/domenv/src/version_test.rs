// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
#[case("4.1.0", Some((4, 1, 0)))]
#[case("5.10.2", Some((5, 10, 2)))]
#[case("v5.4", Some((5, 4, 0)))]
#[case("6", Some((6, 0, 0)))]
#[case("5.11.0-rc.1", Some((5, 11, 0)))]
#[case("5.x", None)]
#[case("", None)]
fn test_parse_deployment_version(#[case] input: &str, #[case] expected: Option<(u64, u64, u64)>) {
    let parsed = parse_deployment_version(input).map(|v| (v.major, v.minor, v.patch));
    assert_eq!(parsed, expected);
}

#[rstest]
#[case("4.1.0")]
#[case("4.1.0-beta")]
#[case("5.0")]
#[case("6.1.3")]
fn test_compatible_versions(#[case] version: &str) {
    assert!(check_compatible(version).is_ok());
}

#[rstest]
#[case("4.0.9")]
#[case("3.6.20")]
#[case("unknown")]
fn test_incompatible_versions(#[case] version: &str) {
    assert!(matches!(
        check_compatible(version),
        Err(Error::IncompatibleVersion { .. })
    ));
}

#[rstest]
fn test_minimum_constant_parses() {
    assert_eq!(
        parse_deployment_version(MINIMUM_SUPPORTED_VERSION),
        Some(Version::new(4, 1, 0))
    );
}
