use std::collections::HashSet;

use super::*;
use crate::utils::is_identifier;

impl RuleTable {
    /// Check the table is usable: a non-empty target type, unique field
    /// names that are valid block identifiers, and keyed pairs whose key and
    /// value attribute names are distinct identifiers.
    pub fn validate(&self) -> Result<(), ReshapeError> {
        if self.target.block_type.trim().is_empty() {
            return Err(ReshapeError::rule(
                "Target block type is empty",
                Some("Set the target type, e.g. \"resource\""),
                320,
            ));
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !is_identifier(&rule.name) {
                return Err(ReshapeError::rule(
                    format!("Invalid field name '{}'", rule.name),
                    Some("Field names are block identifiers such as replication_specs"),
                    321,
                ));
            }

            if !seen.insert(rule.name.as_str()) {
                return Err(ReshapeError::rule(
                    format!("Field '{}' is declared more than once", rule.name),
                    Some("Each field takes exactly one arity"),
                    322,
                ));
            }

            if let Arity::KeyedPair { key, value } = &rule.arity {
                if !is_identifier(key) || !is_identifier(value) {
                    return Err(ReshapeError::rule(
                        format!("Field '{}' has an invalid key or value attribute name", rule.name),
                        Some("Use identifiers such as key and value"),
                        323,
                    ));
                }
                if key == value {
                    return Err(ReshapeError::rule(
                        format!("Field '{}' uses '{}' as both key and value", rule.name, key),
                        Some("Key and value must name different attributes"),
                        323,
                    ));
                }
            }
        }

        Ok(())
    }
}
