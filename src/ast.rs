// Author: Dustin Pilgrim
// License: MIT

use std::collections::BTreeMap;
use std::fmt;

use hcl_edit::{Decor, Decorate};
use indexmap::IndexMap;

pub use hcl_edit::expr::Expression;
pub use hcl_edit::structure::{Attribute, Block, BlockLabel, Body, Structure};

use crate::utils::format_key;
use crate::ReshapeError;

/// Parse HCL text into a tree that prints back byte for byte, comments
/// and layout included.
pub fn parse_body(text: &str) -> Result<Body, ReshapeError> {
    Ok(hcl_edit::parser::parse_body(text)?)
}

/// A lifted block value.
///
/// Attribute values are kept as the parsed expression, so numbers,
/// strings, templates and heredocs keep their exact source form. Nested
/// blocks become tuples, objects or maps.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Expr(Expression),
    Tuple(Vec<Value>),
    Object(IndexMap<String, Value>),
    /// Keys are unordered; printed sorted.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Wrap an attribute expression, dropping the whitespace and comments
    /// around it.
    pub fn expr(expr: &Expression) -> Value {
        let mut expr = expr.clone();
        *expr.decor_mut() = Decor::default();
        Value::Expr(expr)
    }

    /// Content of a string literal without interpolation.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Expr(Expression::String(s)) => Some(s.value().as_str()),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&Expression> {
        if let Value::Expr(expr) = self {
            Some(expr)
        } else {
            None
        }
    }

    pub fn as_tuple(&self) -> Option<&Vec<Value>> {
        if let Value::Tuple(items) = self {
            Some(items)
        } else {
            None
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        if let Value::Object(fields) = self {
            Some(fields)
        } else {
            None
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        if let Value::Map(entries) = self {
            Some(entries)
        } else {
            None
        }
    }

    /// Field of an object or entry of a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(key),
            Value::Map(entries) => entries.get(key),
            _ => None,
        }
    }
}

/// HCL expression text. Objects and maps are written one entry per line;
/// the layout is settled by the formatter afterwards.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Expr(expr) => write!(f, "{}", expr),
            Value::Tuple(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(fields) => write_entries(f, fields.iter()),
            Value::Map(entries) => write_entries(f, entries.iter()),
        }
    }
}

fn write_entries<'a, I>(f: &mut fmt::Formatter<'_>, entries: I) -> fmt::Result
where
    I: ExactSizeIterator<Item = (&'a String, &'a Value)>,
{
    if entries.len() == 0 {
        return f.write_str("{}");
    }
    f.write_str("{\n")?;
    for (key, value) in entries {
        writeln!(f, "{} = {}", format_key(key), value)?;
    }
    f.write_str("}")
}

/// Name and labels of a block.
pub trait BlockExt {
    fn name(&self) -> &str;

    fn label_strs(&self) -> Vec<&str>;

    /// Unlabeled block called `name`, i.e. one instance of a nested field.
    fn is_instance_of(&self, name: &str) -> bool;
}

impl BlockExt for Block {
    fn name(&self) -> &str {
        self.ident.value().as_str()
    }

    fn label_strs(&self) -> Vec<&str> {
        self.labels.iter().map(BlockLabel::as_str).collect()
    }

    fn is_instance_of(&self, name: &str) -> bool {
        self.labels.is_empty() && self.name() == name
    }
}

/// Lookup and block collection on a body. Edits go through `remove` and
/// `insert`, so untouched structures keep their source text.
pub trait BodyExt {
    fn attrs(&self) -> Box<dyn Iterator<Item = &Attribute> + '_>;

    fn child_blocks(&self) -> Box<dyn Iterator<Item = &Block> + '_>;

    fn attribute_index(&self, key: &str) -> Option<usize>;

    /// Position of the first unlabeled block called `name`.
    fn first_block_index(&self, name: &str) -> Option<usize>;

    /// Remove every unlabeled block called `name` and return their bodies
    /// in source order. Everything else stays in place.
    fn collect_blocks(&mut self, name: &str) -> Vec<Body>;

    /// Put `attr` at `index`. An attribute with the same key is replaced
    /// where it stands and returned.
    fn put_attribute(&mut self, index: usize, attr: Attribute) -> Option<Attribute>;

    /// Indexes of the structures `f` accepts, front to back.
    fn block_indexes<F>(&self, f: F) -> Vec<usize>
    where
        F: Fn(&Block) -> bool;

    fn block_names(&self) -> Vec<&str>;
}

impl BodyExt for Body {
    fn attrs(&self) -> Box<dyn Iterator<Item = &Attribute> + '_> {
        Box::new(self.iter().filter_map(|s| match s {
            Structure::Attribute(attr) => Some(attr),
            Structure::Block(_) => None,
        }))
    }

    fn child_blocks(&self) -> Box<dyn Iterator<Item = &Block> + '_> {
        Box::new(self.iter().filter_map(|s| match s {
            Structure::Block(block) => Some(block),
            Structure::Attribute(_) => None,
        }))
    }

    fn attribute_index(&self, key: &str) -> Option<usize> {
        self.iter()
            .position(|s| matches!(s, Structure::Attribute(a) if a.key.value().as_str() == key))
    }

    fn first_block_index(&self, name: &str) -> Option<usize> {
        self.iter()
            .position(|s| matches!(s, Structure::Block(b) if b.is_instance_of(name)))
    }

    fn collect_blocks(&mut self, name: &str) -> Vec<Body> {
        let mut bodies = Vec::new();
        while let Some(index) = self.first_block_index(name) {
            if let Structure::Block(block) = self.remove(index) {
                bodies.push(block.body);
            }
        }
        bodies
    }

    fn put_attribute(&mut self, index: usize, attr: Attribute) -> Option<Attribute> {
        match self.attribute_index(attr.key.value().as_str()) {
            Some(existing) => {
                let old = self.remove(existing);
                self.insert(existing, attr);
                match old {
                    Structure::Attribute(old) => Some(old),
                    Structure::Block(_) => None,
                }
            }
            None => {
                let index = index.min(self.len());
                self.insert(index, attr);
                None
            }
        }
    }

    fn block_indexes<F>(&self, f: F) -> Vec<usize>
    where
        F: Fn(&Block) -> bool,
    {
        self.iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                Structure::Block(block) if f(block) => Some(i),
                _ => None,
            })
            .collect()
    }

    fn block_names(&self) -> Vec<&str> {
        self.child_blocks().map(|b| b.name()).collect()
    }
}
