// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::{fixture, rstest};

use super::*;
use crate::revision::BuildStatus;
use crate::spec::ClusterType;
use crate::Error;

#[fixture]
fn environment_json() -> &'static str {
    r#"{
        "id": "env-1",
        "name": "Base Env",
        "description": "First line\nSecond line",
        "visibility": "Global",
        "owner": {"id": "user-1", "username": "ada"},
        "archived": false,
        "supportedClusters": ["Spark"],
        "selectedRevision": {"id": "rev-1", "number": 1, "status": "Succeeded"},
        "latestRevision": {"id": "rev-2", "number": 2, "status": "Failed"}
    }"#
}

#[rstest]
fn test_deserialize_environment(environment_json: &str) {
    let env: Environment = serde_json::from_str(environment_json).unwrap();
    assert_eq!(env.id(), "env-1");
    assert_eq!(env.name(), "Base Env");
    assert_eq!(env.visibility(), Visibility::Global);
    assert_eq!(env.description().lines(), ["First line", "Second line"]);
    assert_eq!(env.description().to_string(), "First line\nSecond line");
    assert_eq!(env.owner().map(Owner::name), Some("ada"));
    assert_eq!(env.supported_clusters(), ["Spark"]);
    assert_eq!(env.active_revision().map(|r| r.id.as_str()), Some("rev-1"));
    assert_eq!(
        env.latest_revision().map(|r| r.status.clone()),
        Some(BuildStatus::Failed)
    );
    assert!(!env.active_details().is_cached());
    assert!(!env.latest_details().is_cached());
}

#[rstest]
fn test_active_revision_alias() {
    let env: Environment = serde_json::from_str(
        r#"{"id": "env-1", "name": "n", "activeRevision": {"id": "rev-9"}}"#,
    )
    .unwrap();
    assert_eq!(env.active_revision().map(|r| r.id.as_str()), Some("rev-9"));
    assert!(env.latest_revision().is_none());
}

#[rstest]
fn test_never_built_environment() {
    let env: Environment = serde_json::from_str(
        r#"{"id": "env-1", "name": "n", "selectedRevision": null,
            "latestRevision": {"id": "rev-1", "status": "Building"}}"#,
    )
    .unwrap();
    assert!(env.active_revision().is_none());
    assert_eq!(env.visibility(), Visibility::Private);
    assert!(env.description().is_empty());
    assert!(env.details_slot("rev-1").is_some());
}

#[rstest]
fn test_revision_lookup(environment_json: &str) {
    let env: Environment = serde_json::from_str(environment_json).unwrap();
    assert_eq!(env.revision("rev-2").and_then(|r| r.number), Some(2));
    assert!(env.revision("rev-3").is_none());
    assert!(env.details_slot("rev-3").is_none());
    assert!(std::ptr::eq(
        env.details_slot("rev-1").unwrap(),
        env.active_details()
    ));
    assert!(std::ptr::eq(
        env.details_slot("rev-2").unwrap(),
        env.latest_details()
    ));
}

#[rstest]
fn test_serialize_environment_skips_caches(environment_json: &str) {
    let env: Environment = serde_json::from_str(environment_json).unwrap();
    let value = serde_json::to_value(&env).unwrap();
    assert_eq!(value["selectedRevision"]["id"], "rev-1");
    assert_eq!(value["description"], "First line\nSecond line");
    assert!(value.get("activeDetails").is_none());
}

#[rstest]
#[case("line one\r\nline two\n")]
#[case("trailing blank\n\n")]
#[case("")]
fn test_description_text_is_kept_exactly(#[case] text: &str) {
    let description: Description = serde_json::from_value(serde_json::json!(text)).unwrap();
    assert_eq!(description.to_string(), text);
    assert_eq!(serde_json::to_value(&description).unwrap(), text);
}

#[rstest]
fn test_organization_owner() {
    let owner: Owner =
        serde_json::from_str(r#"{"id": "org-1", "name": "Data Team", "isOrganization": true}"#)
            .unwrap();
    assert_eq!(
        owner,
        Owner::Organization {
            id: "org-1".to_string(),
            name: Some("Data Team".to_string())
        }
    );
    assert_eq!(owner.id(), "org-1");
}

#[rstest]
#[case("private", Visibility::Private)]
#[case("Organization", Visibility::Organization)]
#[case("GLOBAL", Visibility::Global)]
fn test_parse_visibility(#[case] input: &str, #[case] expected: Visibility) {
    assert_eq!(input.parse::<Visibility>().unwrap(), expected);
}

#[rstest]
fn test_new_environment_default_image() {
    let new = NewEnvironment::builder("Base Env", ImageType::Default, Visibility::Global)
        .description(["A base", "environment"])
        .build()
        .unwrap();
    assert_eq!(new.name, "Base Env");
    assert_eq!(new.description.to_string(), "A base\nenvironment");
    assert_eq!(new.revision.image_type(), ImageType::Default);
}

#[rstest]
fn test_new_environment_validates_first_revision() {
    let missing_image = NewEnvironment::builder("Custom", ImageType::Custom, Visibility::Private)
        .build();
    assert!(matches!(missing_image, Err(Error::InvalidRevisionSpec(_))));

    let default_with_image =
        NewEnvironment::builder("Default", ImageType::Default, Visibility::Private)
            .docker_image("ubuntu:22.04")
            .build();
    assert!(matches!(
        default_with_image,
        Err(Error::InvalidRevisionSpec(_))
    ));

    let spark = NewEnvironment::builder("Spark", ImageType::Custom, Visibility::Organization)
        .docker_image("bitnami/spark:3")
        .cluster_types(ClusterType::Spark)
        .owner(OwnerId::Organization("org-1".to_string()))
        .build()
        .unwrap();
    assert!(spark.revision.cluster_types().contains(&ClusterType::Spark));
}
