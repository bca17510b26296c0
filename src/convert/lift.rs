use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::warn;

use crate::ast::{BlockExt, Body, BodyExt, Structure, Value};
use crate::config::{Arity, RuleTable};
use crate::ReshapeError;

/// Turn a block body into an object value.
///
/// Attributes are copied as they are. Each nested block name is collected
/// and shaped by its arity in `rules`; names the table does not know become
/// tuples. The input body is not modified.
///
/// A nested block named like an attribute of the same body replaces that
/// attribute's value, and a warning is logged.
pub fn lift(body: &Body, rules: &RuleTable) -> Result<Value, ReshapeError> {
    let mut remaining = body.clone();
    let mut fields = IndexMap::new();

    for item in body.iter() {
        match item {
            Structure::Attribute(attr) => {
                let key = attr.key.value().as_str();
                if fields.contains_key(key) {
                    warn!(field = key, "attribute shares its name with a nested block, block wins");
                    continue;
                }
                fields.insert(key.to_string(), Value::expr(&attr.value));
            }
            Structure::Block(block) if !block.labels.is_empty() => {
                return Err(ReshapeError::UnsupportedBlock {
                    name: block.name().to_string(),
                    message: format!(
                        "labeled block {} {:?} has no value representation",
                        block.name(),
                        block.label_strs()
                    ),
                    hint: Some("Only unlabeled nested blocks can be converted".into()),
                    code: Some(403),
                });
            }
            Structure::Block(block) => {
                // later instances were taken with the first one
                let name = block.name();
                let instances = remaining.collect_blocks(name);
                let arity = rules.arity_of(name).unwrap_or(&Arity::List);
                if let Some(value) = shape_instances(name, arity, instances, rules)? {
                    if fields.insert(name.to_string(), value).is_some() {
                        warn!(field = name, "nested block replaces attribute of the same name");
                    }
                }
            }
        }
    }

    Ok(Value::Object(fields))
}

/// Build the attribute value for `instances` of field `name`.
/// `None` when there are no instances.
pub(crate) fn shape_instances(
    name: &str,
    arity: &Arity,
    instances: Vec<Body>,
    rules: &RuleTable,
) -> Result<Option<Value>, ReshapeError> {
    if instances.is_empty() {
        return Ok(None);
    }

    let value = match arity {
        Arity::List => Value::Tuple(
            instances
                .iter()
                .map(|instance| lift(instance, rules))
                .collect::<Result<_, _>>()?,
        ),
        Arity::Singleton => {
            if instances.len() > 1 {
                return Err(ReshapeError::MultiplicityError {
                    field: name.to_string(),
                    count: instances.len(),
                    hint: Some(format!("Keep one '{}' block or declare it as a list", name)),
                    code: Some(401),
                });
            }
            lift(&instances[0], rules)?
        }
        Arity::KeyedPair { key, value } => {
            let mut entries = BTreeMap::new();
            for (i, instance) in instances.iter().enumerate() {
                let lifted = lift(instance, rules)?;
                let entry_key = match lifted.get(key) {
                    Some(found) => match found.as_str() {
                        Some(s) => s.to_string(),
                        None => {
                            return Err(invalid_pair(
                                name,
                                format!("block {} has a non-literal '{}': {}", i + 1, key, found),
                            ));
                        }
                    },
                    None => {
                        return Err(invalid_pair(
                            name,
                            format!("block {} has no '{}' attribute", i + 1, key),
                        ));
                    }
                };
                let entry_value = lifted.get(value).cloned().ok_or_else(|| {
                    invalid_pair(name, format!("block {} has no '{}' attribute", i + 1, value))
                })?;
                entries.insert(entry_key, entry_value);
            }
            Value::Map(entries)
        }
    };

    Ok(Some(value))
}

fn invalid_pair(field: &str, message: String) -> ReshapeError {
    ReshapeError::InvalidKeyedPair {
        field: field.to_string(),
        message,
        hint: Some("Each block needs a string key and a value".into()),
        code: Some(402),
    }
}
