use crate::ast::{Body, Value};
use crate::ReshapeError;

/// Convert HCL text to JSON following HCL's JSON mapping, as `hcl::from_str`
/// implements it.
///
/// - Strings, numbers, booleans, null → direct mapping
/// - Tuples → arrays; objects and maps → objects
/// - Templates and heredocs → their template text, unchanged
/// - Other expressions → `"${...}"`
/// - Blocks nest under their type and labels
pub fn export_str_to_json(text: &str) -> Result<serde_json::Value, ReshapeError> {
    Ok(hcl::from_str(text)?)
}

/// Convert a body to JSON. Comments are dropped.
pub fn body_to_json(body: &Body) -> Result<serde_json::Value, ReshapeError> {
    export_str_to_json(&body.to_string())
}

/// Convert a single value to JSON.
pub fn value_to_json(value: &Value) -> Result<serde_json::Value, ReshapeError> {
    let wrapped = export_str_to_json(&format!("value = {}\n", value))?;
    Ok(wrapped.get("value").cloned().unwrap_or(serde_json::Value::Null))
}

/// Export a body as pretty-printed JSON.
pub fn export_body_to_json(body: &Body) -> Result<String, ReshapeError> {
    Ok(format!("{:#}", body_to_json(body)?))
}
