// Author: Dustin Pilgrim
// License: MIT

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ast::{parse_body, Block, BlockExt};
use crate::ReshapeError;

mod access;
mod conversion;
mod validation;

/// Selects the top-level blocks a rule table applies to: blocks of type
/// `block_type` whose leading labels equal `labels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Target {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            labels: Vec::new(),
        }
    }

    /// `resource "<resource_type>" "<any name>"`
    pub fn resource(resource_type: impl Into<String>) -> Self {
        Self::new("resource").with_label(resource_type)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn matches(&self, block: &Block) -> bool {
        block.name() == self.block_type
            && block.labels.len() >= self.labels.len()
            && self
                .labels
                .iter()
                .zip(block.label_strs())
                .all(|(want, got)| want == got)
    }
}

/// Multiplicity contract of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "arity", rename_all = "snake_case")]
pub enum Arity {
    /// 0..N blocks → tuple attribute (absent when N = 0)
    List,
    /// 0..1 block → object attribute; more is an error
    Singleton,
    /// 0..N blocks with key/value attributes → map attribute, later wins
    KeyedPair {
        #[serde(default = "default_key_attr")]
        key: String,
        #[serde(default = "default_value_attr")]
        value: String,
    },
}

fn default_key_attr() -> String {
    "key".to_string()
}

fn default_value_attr() -> String {
    "value".to_string()
}

impl Arity {
    /// Keyed pair with the conventional `key`/`value` attribute names.
    pub fn keyed_pair() -> Self {
        Arity::KeyedPair {
            key: default_key_attr(),
            value: default_value_attr(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Arity::List => "list",
            Arity::Singleton => "singleton",
            Arity::KeyedPair { .. } => "keyed_pair",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    #[serde(flatten)]
    pub arity: Arity,
}

impl FieldRule {
    pub fn new(name: impl Into<String>, arity: Arity) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

/// The fields to convert inside one kind of target block, with their arity.
///
/// The same table shapes blocks nested inside lifted values, and its
/// singleton subset drives attribute path rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    target: Target,
    #[serde(rename = "fields", default)]
    rules: Vec<FieldRule>,
}

impl RuleTable {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            rules: Vec::new(),
        }
    }

    pub fn with_rules(target: Target, rules: Vec<FieldRule>) -> Self {
        Self { target, rules }
    }

    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn list(self, name: &str) -> Self {
        self.with_rule(FieldRule::new(name, Arity::List))
    }

    pub fn singleton(self, name: &str) -> Self {
        self.with_rule(FieldRule::new(name, Arity::Singleton))
    }

    pub fn keyed_pair(self, name: &str) -> Self {
        self.with_rule(FieldRule::new(name, Arity::keyed_pair()))
    }

    /// Rules for `mongodbatlas_advanced_cluster` resources.
    pub fn advanced_cluster() -> Self {
        RuleTable::new(Target::resource("mongodbatlas_advanced_cluster"))
            .list("replication_specs")
            .list("region_configs")
            .singleton("advanced_configuration")
            .singleton("bi_connector_config")
            .singleton("pinned_fcv")
            .singleton("timeouts")
            .singleton("electable_specs")
            .singleton("read_only_specs")
            .singleton("analytics_specs")
            .singleton("auto_scaling")
            .singleton("analytics_auto_scaling")
            .singleton("connection_strings")
            .keyed_pair("labels")
            .keyed_pair("tags")
    }

    /// Parse a rule file written in the block grammar:
    ///
    /// ```text
    /// target "resource" "mongodbatlas_advanced_cluster" {}
    ///
    /// field "replication_specs" { arity = "list" }
    /// field "tags" {
    ///   arity = "keyed_pair"
    ///   key   = "key"
    ///   value = "value"
    /// }
    /// ```
    pub fn from_str(content: &str) -> Result<Self, ReshapeError> {
        let body = parse_body(content)?;
        let table = RuleTable::try_from(&body)?;
        table.validate()?;
        Ok(table)
    }

    /// Parse a rule table from JSON:
    /// `{"target": {"type": "resource", "labels": [..]}, "fields": [{"name": "tags", "arity": "keyed_pair"}]}`
    pub fn from_json(content: &str) -> Result<Self, ReshapeError> {
        let table: RuleTable = serde_json::from_str(content).map_err(|e| {
            ReshapeError::rule(
                format!("Invalid JSON rule table: {}", e),
                Some("Expected {\"target\": {...}, \"fields\": [...]}"),
                317,
            )
        })?;
        table.validate()?;
        Ok(table)
    }

    /// Load a rule table from disk. `.json` files are read as JSON, anything
    /// else as a rule file. A leading `~/` is expanded to the home directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReshapeError> {
        let raw = path.as_ref().to_string_lossy().to_string();
        let path = expand_home(&raw)?;

        let content = fs::read_to_string(&path).map_err(|e| ReshapeError::FileError {
            message: format!("Failed to read file: {}", e),
            path: path.to_string_lossy().to_string(),
            hint: Some("Check that the file exists and is readable".into()),
            code: Some(301),
        })?;

        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_str(&content)
        }
    }
}

/// Expand "~/" to the home directory.
fn expand_home(raw_path: &str) -> Result<PathBuf, ReshapeError> {
    match raw_path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().ok_or_else(|| ReshapeError::FileError {
                message: "Could not determine home directory for ~ expansion".into(),
                path: raw_path.to_string(),
                hint: Some("Set HOME or use an absolute path".into()),
                code: Some(300),
            })?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(raw_path)),
    }
}
