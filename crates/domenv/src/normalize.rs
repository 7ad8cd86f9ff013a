// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Normalization of loosely shaped caller input.
//!
//! Scripts, Dockerfile instructions and workspace tools may be given as one
//! piece of text or as an ordered list of lines. Environment variables may be
//! given as a mapping or as a list of `(key, value)` pairs. Everything is
//! turned into one canonical form here so that nothing past this module ever
//! branches on the shape the caller used.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;

use crate::spec::ClusterType;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./normalize_test.rs"]
mod normalize_test;

/// Separator used when a sequence of lines is rendered as one blob.
pub const LINE_SEPARATOR: &str = "\n";

/// Text given either as a single item or as an ordered sequence of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInput {
    Single(String),
    Sequence(Vec<String>),
}

impl Default for TextInput {
    fn default() -> Self {
        Self::Sequence(Vec::new())
    }
}

impl From<&str> for TextInput {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for TextInput {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&String> for TextInput {
    fn from(value: &String) -> Self {
        Self::Single(value.clone())
    }
}

impl From<Vec<String>> for TextInput {
    fn from(value: Vec<String>) -> Self {
        Self::Sequence(value)
    }
}

impl From<Vec<&str>> for TextInput {
    fn from(value: Vec<&str>) -> Self {
        Self::Sequence(value.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for TextInput {
    fn from(value: &[&str]) -> Self {
        Self::Sequence(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for TextInput {
    fn from(value: [&str; N]) -> Self {
        Self::Sequence(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Canonical ordered sequence for a text input.
///
/// A lone item becomes a one-element sequence. Items are kept verbatim,
/// including blank lines and trailing line continuations.
pub fn normalize_lines<T: Into<TextInput>>(input: T) -> Vec<String> {
    match input.into() {
        TextInput::Single(text) => vec![text],
        TextInput::Sequence(lines) => lines,
    }
}

/// Canonical single blob for a text input, lines joined with [`LINE_SEPARATOR`].
pub fn normalize_text<T: Into<TextInput>>(input: T) -> String {
    normalize_lines(input).join(LINE_SEPARATOR)
}

/// Environment variables as given by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvVarsInput {
    Mapping(IndexMap<String, String>),
    Pairs(Vec<(String, String)>),
}

impl Default for EnvVarsInput {
    fn default() -> Self {
        Self::Pairs(Vec::new())
    }
}

impl<K: Into<String>, V: Into<String>> From<IndexMap<K, V>> for EnvVarsInput {
    fn from(value: IndexMap<K, V>) -> Self {
        Self::Mapping(
            value
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> From<BTreeMap<K, V>> for EnvVarsInput {
    fn from(value: BTreeMap<K, V>) -> Self {
        Self::Mapping(
            value
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for EnvVarsInput {
    fn from(value: Vec<(K, V)>) -> Self {
        Self::Pairs(
            value
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for EnvVarsInput {
    fn from(value: [(K, V); N]) -> Self {
        Self::Pairs(
            value
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Ordered mapping of environment variable names to values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnvironmentVariables(IndexMap<String, String>);

impl EnvironmentVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert a value, replacing (and reporting) any earlier one for the key.
    ///
    /// A replaced key keeps its original position.
    fn insert_last_wins(&mut self, key: String, value: String) -> Option<String> {
        let previous = self.0.insert(key.clone(), value)?;
        tracing::warn!(
            key = %key,
            previous = %previous,
            "duplicate environment variable, keeping the later value"
        );
        Some(previous)
    }
}

/// Canonical ordered mapping for environment variable input.
///
/// Duplicate keys in a pair list resolve to the later value and emit a
/// warning; this never fails.
pub fn normalize_env_vars<T: Into<EnvVarsInput>>(input: T) -> EnvironmentVariables {
    match input.into() {
        EnvVarsInput::Mapping(map) => EnvironmentVariables(map),
        EnvVarsInput::Pairs(pairs) => {
            let mut vars = EnvironmentVariables::new();
            for (key, value) in pairs {
                vars.insert_last_wins(key, value);
            }
            vars
        }
    }
}

/// Cluster affinities given as one tag or as a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterTypesInput {
    Single(ClusterType),
    Set(Vec<ClusterType>),
}

impl Default for ClusterTypesInput {
    fn default() -> Self {
        Self::Set(Vec::new())
    }
}

impl From<ClusterType> for ClusterTypesInput {
    fn from(value: ClusterType) -> Self {
        Self::Single(value)
    }
}

impl From<Option<ClusterType>> for ClusterTypesInput {
    fn from(value: Option<ClusterType>) -> Self {
        Self::Set(value.into_iter().collect())
    }
}

impl From<Vec<ClusterType>> for ClusterTypesInput {
    fn from(value: Vec<ClusterType>) -> Self {
        Self::Set(value)
    }
}

impl From<BTreeSet<ClusterType>> for ClusterTypesInput {
    fn from(value: BTreeSet<ClusterType>) -> Self {
        Self::Set(value.into_iter().collect())
    }
}

impl<const N: usize> From<[ClusterType; N]> for ClusterTypesInput {
    fn from(value: [ClusterType; N]) -> Self {
        Self::Set(value.to_vec())
    }
}

/// Canonical set of cluster affinities. Empty means the general pool.
pub fn normalize_cluster_types<T: Into<ClusterTypesInput>>(input: T) -> BTreeSet<ClusterType> {
    match input.into() {
        ClusterTypesInput::Single(cluster) => BTreeSet::from([cluster]),
        ClusterTypesInput::Set(clusters) => clusters.into_iter().collect(),
    }
}

/// Normalize a dynamically typed value (from a YAML manifest) into lines.
///
/// `null` is an empty sequence; scalars are a single line; a sequence must
/// contain scalars only.
pub fn lines_from_value(field: &str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                scalar_text(item).ok_or_else(|| invalid_kind(field, "a list containing", item))
            })
            .collect(),
        other => scalar_text(other)
            .map(|text| vec![text])
            .ok_or_else(|| invalid_kind(field, "", other)),
    }
}

/// Normalize a dynamically typed value into a single text blob.
pub fn text_from_value(field: &str, value: &Value) -> Result<String> {
    lines_from_value(field, value).map(|lines| lines.join(LINE_SEPARATOR))
}

/// Normalize a dynamically typed value into environment variables.
///
/// Accepts a mapping of scalars, or a sequence whose items are either
/// `[key, value]` pairs or `{name: key, value: value}` mappings.
pub fn env_vars_from_value(field: &str, value: &Value) -> Result<EnvironmentVariables> {
    match value {
        Value::Null => Ok(EnvironmentVariables::new()),
        Value::Mapping(map) => {
            let mut pairs = Vec::with_capacity(map.len());
            for (key, val) in map {
                let key = scalar_text(key).ok_or_else(|| invalid_kind(field, "a key of", key))?;
                let val = optional_scalar_text(val)
                    .ok_or_else(|| invalid_kind(field, "a value of", val))?;
                pairs.push((key, val));
            }
            Ok(normalize_env_vars(pairs))
        }
        Value::Sequence(items) => {
            let mut pairs = Vec::with_capacity(items.len());
            for item in items {
                pairs.push(env_pair_from_value(field, item)?);
            }
            Ok(normalize_env_vars(pairs))
        }
        other => Err(invalid_kind(field, "", other)),
    }
}

fn env_pair_from_value(field: &str, item: &Value) -> Result<(String, String)> {
    match item {
        Value::Sequence(pair) if pair.len() == 2 => {
            let key = scalar_text(&pair[0]).ok_or_else(|| invalid_kind(field, "a key of", &pair[0]))?;
            let val = optional_scalar_text(&pair[1])
                .ok_or_else(|| invalid_kind(field, "a value of", &pair[1]))?;
            Ok((key, val))
        }
        Value::Mapping(map) => {
            let key = map
                .get("name")
                .and_then(scalar_text)
                .ok_or_else(|| invalid_kind(field, "a pair of", item))?;
            let val = match map.get("value") {
                Some(val) => optional_scalar_text(val)
                    .ok_or_else(|| invalid_kind(field, "a value of", val))?,
                None => String::new(),
            };
            Ok((key, val))
        }
        other => Err(invalid_kind(field, "a pair of", other)),
    }
}

/// Normalize a dynamically typed value into a set of cluster affinities.
pub fn cluster_types_from_value(field: &str, value: &Value) -> Result<BTreeSet<ClusterType>> {
    let tags = lines_from_value(field, value)?;
    let mut clusters = Vec::with_capacity(tags.len());
    for tag in tags {
        let cluster = tag.parse::<ClusterType>().map_err(|_| Error::InvalidInputKind {
            field: field.to_string(),
            found: format!("unknown cluster type {tag:?}"),
        })?;
        clusters.push(cluster);
    }
    Ok(normalize_cluster_types(clusters))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn optional_scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        other => scalar_text(other),
    }
}

fn invalid_kind(field: &str, context: &str, value: &Value) -> Error {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    };
    let found = if context.is_empty() {
        kind.to_string()
    } else {
        format!("{context} {kind}")
    };
    Error::InvalidInputKind {
        field: field.to_string(),
        found,
    }
}
