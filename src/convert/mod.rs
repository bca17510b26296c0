// Author: Dustin Pilgrim
// License: MIT

use hcl_edit::Decorate;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::ast::{parse_body, Block, BlockExt, Body, BodyExt, Expression, Structure, Value};
use crate::config::{Arity, FieldRule, RuleTable};
use crate::export::{format_attribute, print_body};
use crate::path::AttrPath;
use crate::ReshapeError;

mod lift;

pub use lift::lift;

/// One field written into a target block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldConversion {
    pub name: String,
    #[serde(flatten)]
    pub arity: Arity,
    /// Number of blocks the attribute replaced.
    pub instances: usize,
}

/// Fields converted inside one target block, identified by its labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockReport {
    pub labels: Vec<String>,
    pub fields: Vec<FieldConversion>,
    /// `lifecycle.ignore_changes` entries rewritten to the new shape.
    pub ignore_changes: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConversionReport {
    pub blocks: Vec<BlockReport>,
}

impl ConversionReport {
    /// Number of target blocks visited.
    pub fn targets(&self) -> usize {
        self.blocks.len()
    }

    pub fn converted_fields(&self) -> usize {
        self.blocks.iter().map(|b| b.fields.len()).sum()
    }

    /// True when nothing was rewritten.
    pub fn is_empty(&self) -> bool {
        self.converted_fields() == 0
    }
}

/// Rewrites repeated blocks inside target blocks into single attributes.
///
/// Each rule touches only blocks of its own name and writes its attribute
/// where the first of those blocks stood, so the result does not depend on
/// the order of rules in the table. Everything outside the removed blocks
/// keeps its source text.
///
/// By default the `ignore_changes` list of a target's `lifecycle` block is
/// rewritten too, so `advanced_configuration[0].x` becomes
/// `advanced_configuration.x` once that field is a singleton.
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    rules: &'a RuleTable,
    rewrite_lifecycle: bool,
}

impl<'a> Converter<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Self {
            rules,
            rewrite_lifecycle: true,
        }
    }

    /// Turn the `lifecycle.ignore_changes` rewrite on or off.
    pub fn rewrite_lifecycle(mut self, enabled: bool) -> Self {
        self.rewrite_lifecycle = enabled;
        self
    }

    pub fn rules(&self) -> &'a RuleTable {
        self.rules
    }

    /// Convert every top-level block of `body` that matches the target.
    /// Other blocks are left untouched.
    ///
    /// # Errors
    /// The first multiplicity, keyed-pair or unsupported-block error. The
    /// failing target block keeps its original content; blocks before it
    /// stay converted.
    pub fn convert(&self, body: &mut Body) -> Result<ConversionReport, ReshapeError> {
        let mut report = ConversionReport::default();
        let target = self.rules.target();

        for index in body.block_indexes(|block| target.matches(block)) {
            let mut block = match body.remove(index) {
                Structure::Block(block) => block,
                other => {
                    body.insert(index, other);
                    continue;
                }
            };

            let converted = self.convert_block(&mut block);
            let labels: Vec<String> = block.label_strs().iter().map(|l| l.to_string()).collect();
            debug!(block = block.name(), labels = ?labels, ok = converted.is_ok(), "visited target block");
            body.insert(index, block);

            let (fields, ignore_changes) = converted?;
            report.blocks.push(BlockReport {
                labels,
                fields,
                ignore_changes,
            });
        }

        Ok(report)
    }

    fn convert_block(&self, block: &mut Block) -> Result<(Vec<FieldConversion>, usize), ReshapeError> {
        let mut working = block.body.clone();
        let mut fields = Vec::new();

        for rule in self.rules.rules() {
            if let Some(field) = self.apply_rule(&mut working, rule)? {
                fields.push(field);
            }
        }

        let ignore_changes = if self.rewrite_lifecycle {
            self.rewrite_ignore_changes(&mut working)?
        } else {
            0
        };

        block.body = working;
        Ok((fields, ignore_changes))
    }

    fn apply_rule(
        &self,
        body: &mut Body,
        rule: &FieldRule,
    ) -> Result<Option<FieldConversion>, ReshapeError> {
        let Some(index) = body.first_block_index(&rule.name) else {
            return Ok(None);
        };

        let instances = body.collect_blocks(&rule.name);
        let count = instances.len();
        trace!(field = %rule.name, count, "collected blocks");

        let Some(value) = lift::shape_instances(&rule.name, &rule.arity, instances, self.rules)?
        else {
            return Ok(None);
        };

        let attr = format_attribute(&rule.name, &value)?;
        if body.put_attribute(index, attr).is_some() {
            warn!(field = %rule.name, "replaced existing attribute with converted blocks");
        }
        debug!(field = %rule.name, arity = rule.arity.name(), instances = count, "converted field");

        Ok(Some(FieldConversion {
            name: rule.name.clone(),
            arity: rule.arity.clone(),
            instances: count,
        }))
    }

    /// Drop singleton indexes from the traversals listed in
    /// `lifecycle { ignore_changes = [...] }`. Returns how many changed.
    fn rewrite_ignore_changes(&self, body: &mut Body) -> Result<usize, ReshapeError> {
        let singletons = self.rules.singleton_names();
        let mut rewritten = 0;

        for index in body.block_indexes(|block| block.is_instance_of("lifecycle")) {
            let mut lifecycle = match body.remove(index) {
                Structure::Block(block) => block,
                other => {
                    body.insert(index, other);
                    continue;
                }
            };

            if let Some(at) = lifecycle.body.attribute_index("ignore_changes") {
                if let Structure::Attribute(mut attr) = lifecycle.body.remove(at) {
                    let result = rewrite_traversals(&mut attr.value, &singletons);
                    lifecycle.body.insert(at, attr);
                    rewritten += result?;
                }
            }

            body.insert(index, lifecycle);
        }

        if rewritten > 0 {
            debug!(count = rewritten, "rewrote ignore_changes entries");
        }
        Ok(rewritten)
    }
}

fn rewrite_traversals(value: &mut Expression, singletons: &[&str]) -> Result<usize, ReshapeError> {
    let Expression::Array(array) = value else {
        return Ok(0);
    };

    let mut rewritten = 0;
    for element in array.iter_mut() {
        let bare = Value::expr(element).to_string();
        let Some(path) = AttrPath::from_traversal(&bare) else {
            continue;
        };

        let collapsed = path.collapse_singletons(singletons);
        if collapsed == path {
            continue;
        }

        let text = if bare.contains('[') {
            collapsed.to_traversal()
        } else {
            collapsed.to_string()
        };
        let mut replacement = hcl_edit::parser::parse_expr(&text)?;
        *replacement.decor_mut() = element.decor().clone();
        trace!(from = %bare, to = %text, "rewrote ignore_changes entry");
        *element = replacement;
        rewritten += 1;
    }

    Ok(rewritten)
}

/// Parse `text`, convert it with `rules` and print the result.
///
/// # Examples
/// ```
/// use hcl_reshape::{convert_str, RuleTable, Target};
///
/// let rules = RuleTable::new(Target::resource("r")).singleton("timeouts");
/// let out = convert_str("resource \"r\" \"x\" {\n  timeouts {\n    create = \"1h\"\n  }\n}\n", &rules).unwrap();
/// assert!(out.contains("timeouts = {"));
/// assert!(out.contains("create = \"1h\""));
/// ```
pub fn convert_str(text: &str, rules: &RuleTable) -> Result<String, ReshapeError> {
    let mut body = parse_body(text)?;
    Converter::new(rules).convert(&mut body)?;
    Ok(print_body(&body))
}

#[cfg(test)]
mod tests;
