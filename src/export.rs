// Author: Dustin Pilgrim
// License: MIT

use crate::ast::{parse_body, Attribute, Body, BodyExt, Structure, Value};
use crate::ReshapeError;

mod json;

pub use json::{body_to_json, export_body_to_json, export_str_to_json, value_to_json};

/// Block the formatter lays converted attributes out in, so they come
/// back indented one level deep like the target block's other fields.
const LAYOUT_BLOCK: &str = "reshape";

/// Print a body. Parsed text comes back exactly as it was read; edited
/// parts print as they were inserted.
pub fn print_body(body: &Body) -> String {
    body.to_string()
}

/// Print a single value as unformatted HCL expression text.
pub fn print_value(value: &Value) -> String {
    value.to_string()
}

/// Parse and format `text` with `hcl::format`. Two documents with the same
/// structure and values produce the same output whatever their layout.
/// Comments are dropped.
///
/// # Errors
/// Returns the parser's error if `text` is not a valid document.
pub fn canonicalize(text: &str) -> Result<String, ReshapeError> {
    let body = hcl::parse(text)?;
    Ok(hcl::format::to_string(&body)?)
}

/// True if both documents have the same canonical form.
pub fn equivalent(a: &str, b: &str) -> Result<bool, ReshapeError> {
    Ok(canonicalize(a)? == canonicalize(b)?)
}

/// Build the attribute `key = value`, laid out by `hcl::format` at one
/// level of nesting.
pub(crate) fn format_attribute(key: &str, value: &Value) -> Result<Attribute, ReshapeError> {
    let source = format!("{} {{\n{} = {}\n}}\n", LAYOUT_BLOCK, key, value);
    let parsed = hcl::parse(&source).map_err(|e| ReshapeError::format(e.to_string()))?;
    let formatted =
        hcl::format::to_string(&parsed).map_err(|e| ReshapeError::format(e.to_string()))?;

    let wrapper = parse_body(&formatted)?;
    wrapper
        .child_blocks()
        .flat_map(|block| block.body.iter())
        .find_map(|structure| match structure {
            Structure::Attribute(attr) => Some(attr.clone()),
            Structure::Block(_) => None,
        })
        .ok_or_else(|| ReshapeError::format(format!("no attribute '{}' after formatting", key)))
}
