// Author: Dustin Pilgrim
// License: MIT

use crate::ast::{Block, BlockExt, Body, BodyExt, Value};
use crate::ReshapeError;

use super::{Arity, FieldRule, RuleTable, Target};

impl TryFrom<Value> for String {
    type Error = ReshapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(s) => Ok(s.to_string()),
            None => Err(ReshapeError::rule(
                format!("Expected string, got {}", value),
                Some("Use a quoted string in the rule file"),
                315,
            )),
        }
    }
}

/// A rule file: exactly one `target` block and any number of `field` blocks.
impl TryFrom<&Body> for RuleTable {
    type Error = ReshapeError;

    fn try_from(body: &Body) -> Result<Self, Self::Error> {
        if let Some(attr) = body.attrs().next() {
            return Err(ReshapeError::rule(
                format!("Unexpected top-level attribute '{}' in rule file", attr.key.value()),
                Some("Rule files contain only 'target' and 'field' blocks"),
                312,
            ));
        }

        let mut target = None;
        let mut rules = Vec::new();

        for block in body.child_blocks() {
            match block.name() {
                "target" => {
                    if target.is_some() {
                        return Err(ReshapeError::rule(
                            "Rule file declares more than one target",
                            Some("Use one rule file per target"),
                            311,
                        ));
                    }
                    target = Some(Target::try_from(block)?);
                }
                "field" => rules.push(FieldRule::try_from(block)?),
                other => {
                    return Err(ReshapeError::rule(
                        format!("Unknown block '{}' in rule file", other),
                        Some("Expected 'target' or 'field'"),
                        312,
                    ));
                }
            }
        }

        let target = target.ok_or_else(|| {
            ReshapeError::rule(
                "Rule file has no target block",
                Some("Add e.g. target \"resource\" \"mongodbatlas_advanced_cluster\" {}"),
                310,
            )
        })?;

        Ok(RuleTable::with_rules(target, rules))
    }
}

/// `target "<block type>" "<label>"... {}`
impl TryFrom<&Block> for Target {
    type Error = ReshapeError;

    fn try_from(block: &Block) -> Result<Self, Self::Error> {
        let mut labels = block.labels.iter().map(|l| l.as_str().to_string());
        let block_type = labels.next().ok_or_else(|| {
            ReshapeError::rule(
                "target needs at least a block type label",
                Some("target \"resource\" \"<resource type>\" {}"),
                311,
            )
        })?;

        if !block.body.is_empty() {
            return Err(ReshapeError::rule(
                "target block takes no attributes",
                Some("Write the target as target \"resource\" \"<type>\" {}"),
                311,
            ));
        }

        Ok(Target {
            block_type,
            labels: labels.collect(),
        })
    }
}

/// `field "<name>" { arity = "..." [key = "..."] [value = "..."] }`
impl TryFrom<&Block> for FieldRule {
    type Error = ReshapeError;

    fn try_from(block: &Block) -> Result<Self, Self::Error> {
        let name = match block.label_strs().as_slice() {
            [name] => name.to_string(),
            _ => {
                return Err(ReshapeError::rule(
                    format!("field block needs exactly one label, got {}", block.labels.len()),
                    Some("field \"<block name>\" { arity = \"list\" }"),
                    313,
                ));
            }
        };

        let mut arity_name = None;
        let mut key = None;
        let mut value = None;

        for attr in block.body.attrs() {
            let setting = attr.key.value().as_str();
            let text = String::try_from(Value::expr(&attr.value)).map_err(|_| {
                ReshapeError::rule(
                    format!("'{}' of field '{}' must be a string", setting, name),
                    Some("Quote the value, e.g. arity = \"list\""),
                    315,
                )
            })?;
            match setting {
                "arity" => arity_name = Some(text),
                "key" => key = Some(text),
                "value" => value = Some(text),
                other => {
                    return Err(ReshapeError::rule(
                        format!("Unknown setting '{}' in field '{}'", other, name),
                        Some("Fields accept arity, key and value"),
                        314,
                    ));
                }
            }
        }

        if let Some(nested) = block.body.child_blocks().next() {
            return Err(ReshapeError::rule(
                format!("Unexpected block '{}' in field '{}'", nested.name(), name),
                Some("Fields accept arity, key and value"),
                314,
            ));
        }

        let arity_name = arity_name.ok_or_else(|| {
            ReshapeError::rule(
                format!("Field '{}' has no arity", name),
                Some("Add arity = \"list\", \"singleton\" or \"keyed_pair\""),
                314,
            )
        })?;

        let arity = match arity_name.as_str() {
            "keyed_pair" | "keyed-pair" | "keyedPair" => {
                let mut arity = Arity::keyed_pair();
                if let Arity::KeyedPair { key: k, value: v } = &mut arity {
                    if let Some(key) = key {
                        *k = key;
                    }
                    if let Some(value) = value {
                        *v = value;
                    }
                }
                arity
            }
            other => {
                if key.is_some() || value.is_some() {
                    return Err(ReshapeError::rule(
                        format!("key/value only apply to keyed_pair fields ('{}')", name),
                        Some("Remove key and value, or use arity = \"keyed_pair\""),
                        316,
                    ));
                }
                match other {
                    "list" => Arity::List,
                    "singleton" => Arity::Singleton,
                    unknown => {
                        return Err(ReshapeError::rule(
                            format!("Unknown arity '{}' for field '{}'", unknown, name),
                            Some("Expected list, singleton or keyed_pair"),
                            314,
                        ));
                    }
                }
            }
        };

        Ok(FieldRule::new(name, arity))
    }
}
