// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::{fixture, rstest};

use super::*;
use crate::environment::NewEnvironment;
use crate::spec::{ClusterType, ImageType};

fn field<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
    form.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn fields<'a>(form: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    form.iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect()
}

#[fixture]
fn routes() -> Routes {
    Routes::new("https://domino.example.com")
}

#[rstest]
fn test_routes(routes: Routes) {
    assert_eq!(
        routes.deployment_version(),
        "https://domino.example.com/version"
    );
    assert_eq!(
        routes.environment_list(),
        "https://domino.example.com/v4/environments"
    );
    assert_eq!(
        routes.environment_default(),
        "https://domino.example.com/v4/environments/defaultEnvironment"
    );
    assert_eq!(
        routes.environment_create(),
        "https://domino.example.com/environments"
    );
    assert_eq!(
        routes.environment_get("env-1"),
        "https://domino.example.com/v4/environments/env-1"
    );
    assert_eq!(
        routes.environment_archive("env-1"),
        "https://domino.example.com/v4/environments/env-1/archive"
    );
    assert_eq!(
        routes.revision_create("env-1"),
        "https://domino.example.com/environments/env-1/revisions"
    );
    assert_eq!(
        routes.revision_download("env-1", "rev-1"),
        "https://domino.example.com/v1/environments/env-1/revisions/rev-1/dockerImageSourceProjectWeb"
    );
}

#[rstest]
fn test_revision_form_preserves_order_and_pairs() {
    let spec = RevisionSpec::builder(ImageType::Default)
        .dockerfile_instructions(vec!["RUN apt-get update", "RUN apt-get install -y wget"])
        .environment_variables(vec![("Key1", "Val1")])
        .build()
        .unwrap();
    let form = revision_form(&RevisionSubmission {
        spec,
        default_environment_image: Some("quay.io/domino/base:latest".to_string()),
        default_environment_revision_id: Some("rev-d1".to_string()),
    });

    assert_eq!(field(&form, "base.imageType"), Some("DefaultImage"));
    assert_eq!(
        field(&form, "base.defaultEnvironmentImage"),
        Some("quay.io/domino/base:latest")
    );
    assert_eq!(field(&form, "base.baseEnvironmentRevisionId"), Some("rev-d1"));
    assert_eq!(
        field(&form, "dockerfileInstructions"),
        Some("RUN apt-get update\nRUN apt-get install -y wget")
    );
    assert_eq!(
        field(&form, "buildEnvironmentVariables[0].name"),
        Some("Key1")
    );
    assert_eq!(
        field(&form, "buildEnvironmentVariables[0].value"),
        Some("Val1")
    );
    assert_eq!(field(&form, "buildEnvironmentVariables[1].name"), None);
    assert_eq!(field(&form, "noCache"), None);
    assert_eq!(field(&form, "shouldUseVPN"), None);
    assert!(fields(&form, "clusterTypes[]").is_empty());
}

#[rstest]
fn test_revision_form_flags_and_scripts() {
    let spec = RevisionSpec::builder(ImageType::Environment)
        .base_environment_revision_id("rev-0")
        .workspace_tools(["jupyter:\n  title: Jupyter", "vscode:\n  title: VS Code"])
        .pre_setup_script(["set -e", "apt-get update"])
        .post_run_script("echo bye")
        .docker_arguments("--shm-size=2g")
        .cluster_types([ClusterType::Spark, ClusterType::Ray])
        .force_rebuild(true)
        .should_use_vpn(true)
        .summary("rebuild with spark")
        .build()
        .unwrap();
    let form = revision_form(&RevisionSubmission {
        spec,
        default_environment_image: None,
        default_environment_revision_id: None,
    });

    assert_eq!(field(&form, "base.imageType"), Some("Environment"));
    assert_eq!(field(&form, "base.baseEnvironmentRevisionId"), Some("rev-0"));
    assert_eq!(field(&form, "base.dockerImage"), Some(""));
    assert_eq!(
        field(&form, "properties"),
        Some("jupyter:\n  title: Jupyter\nvscode:\n  title: VS Code")
    );
    assert_eq!(field(&form, "preSetupScript"), Some("set -e\napt-get update"));
    assert_eq!(field(&form, "postRunScript"), Some("echo bye"));
    assert_eq!(field(&form, "dockerArguments"), Some("--shm-size=2g"));
    assert_eq!(field(&form, "summary"), Some("rebuild with spark"));
    assert_eq!(field(&form, "noCache"), Some("true"));
    assert_eq!(field(&form, "shouldUseVPN"), Some("on"));
    assert_eq!(fields(&form, "clusterTypes[]"), vec!["Spark", "Ray"]);
}

#[rstest]
fn test_environment_form_owner_rules() {
    let org = NewEnvironment::builder("Team Env", ImageType::Custom, Visibility::Organization)
        .docker_image("ubuntu:22.04")
        .owner(OwnerId::Organization("org-1".to_string()))
        .description(["line one", "line two"])
        .build()
        .unwrap();
    let form = environment_form(&org, None, None);
    assert_eq!(field(&form, "name"), Some("Team Env"));
    assert_eq!(field(&form, "visibility"), Some("Organization"));
    assert_eq!(field(&form, "description"), Some("line one\nline two"));
    assert_eq!(field(&form, "base.imageType"), Some("CustomImage"));
    assert_eq!(field(&form, "base.dockerImage"), Some("ubuntu:22.04"));
    assert_eq!(field(&form, "organizationOwnerId"), Some("org-1"));
    assert_eq!(field(&form, "userOwnerId"), None);

    let private_with_org = NewEnvironment::builder("Mine", ImageType::Default, Visibility::Private)
        .owner(OwnerId::Organization("org-1".to_string()))
        .build()
        .unwrap();
    assert_eq!(
        field(&environment_form(&private_with_org, None, None), "organizationOwnerId"),
        None
    );

    let user = NewEnvironment::builder("Mine", ImageType::Default, Visibility::Private)
        .owner(OwnerId::User("user-1".to_string()))
        .build()
        .unwrap();
    assert_eq!(
        field(&environment_form(&user, None, None), "userOwnerId"),
        Some("user-1")
    );
}

#[rstest]
fn test_form_starts_with_base_fields() {
    let spec = RevisionSpec::builder(ImageType::Custom)
        .docker_image("ubuntu:22.04")
        .build()
        .unwrap();
    let form = revision_form(&RevisionSubmission {
        spec,
        default_environment_image: None,
        default_environment_revision_id: None,
    });
    let keys: Vec<&str> = form.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        keys[..4],
        [
            "base.imageType",
            "base.dockerImage",
            "base.baseEnvironmentRevisionId",
            "base.defaultEnvironmentImage"
        ]
    );
    assert_eq!(field(&form, "base.baseEnvironmentRevisionId"), Some(""));
}

#[rstest]
fn test_explicit_base_revision_wins_over_default() {
    let spec = RevisionSpec::builder(ImageType::Environment)
        .base_environment_revision_id("rev-0")
        .build()
        .unwrap();
    let form = revision_form(&RevisionSubmission {
        spec,
        default_environment_image: None,
        default_environment_revision_id: Some("rev-d1".to_string()),
    });
    assert_eq!(field(&form, "base.baseEnvironmentRevisionId"), Some("rev-0"));
}

#[rstest]
fn test_environment_form_sends_default_base() {
    let request = NewEnvironment::builder("Base Env", ImageType::Default, Visibility::Global)
        .build()
        .unwrap();
    let form = environment_form(&request, Some("quay.io/domino/base:latest"), Some("rev-d1"));
    assert_eq!(field(&form, "base.imageType"), Some("DefaultImage"));
    assert_eq!(field(&form, "base.baseEnvironmentRevisionId"), Some("rev-d1"));
    assert_eq!(
        field(&form, "base.defaultEnvironmentImage"),
        Some("quay.io/domino/base:latest")
    );
}
