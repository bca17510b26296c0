// Author: Dustin Pilgrim
// License: MIT

use thiserror::Error;

/// The main error type for parsing, converting and loading rule tables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReshapeError {
    /// The input is not valid HCL. The message carries the parser's location.
    #[error("[HCL] Syntax Error: {message}{}", suffix(.hint, .code))]
    SyntaxError {
        message: String,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// A converted value could not be laid out as HCL text.
    #[error("[HCL] Format Error: {message}{}", suffix(.hint, .code))]
    FormatError {
        message: String,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// A singleton field appeared more than once.
    #[error("[HCL] Multiplicity Error: '{field}' occurs {count} times, expected at most one{}", suffix(.hint, .code))]
    MultiplicityError {
        field: String,
        count: usize,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// A keyed-pair block is missing its key or value, or the key is not a string.
    #[error("[HCL] Invalid keyed pair in '{field}': {message}{}", suffix(.hint, .code))]
    InvalidKeyedPair {
        field: String,
        message: String,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// A block that cannot be expressed as a value, e.g. one carrying labels.
    #[error("[HCL] Unsupported block '{name}': {message}{}", suffix(.hint, .code))]
    UnsupportedBlock {
        name: String,
        message: String,
        hint: Option<String>,
        code: Option<u32>,
    },
    #[error("[HCL] File Error '{path}': {message}{}", suffix(.hint, .code))]
    FileError {
        message: String,
        path: String,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// Raised for rule tables that are malformed or inconsistent.
    #[error("[HCL] Rule Error: {message}{}", suffix(.hint, .code))]
    RuleError {
        message: String,
        hint: Option<String>,
        code: Option<u32>,
    },
}

impl ReshapeError {
    /// Numeric code of the error, if it carries one.
    pub fn code(&self) -> Option<u32> {
        match self {
            ReshapeError::SyntaxError { code, .. }
            | ReshapeError::FormatError { code, .. }
            | ReshapeError::MultiplicityError { code, .. }
            | ReshapeError::InvalidKeyedPair { code, .. }
            | ReshapeError::UnsupportedBlock { code, .. }
            | ReshapeError::FileError { code, .. }
            | ReshapeError::RuleError { code, .. } => *code,
        }
    }

    pub(crate) fn rule(message: impl Into<String>, hint: Option<&str>, code: u32) -> Self {
        ReshapeError::RuleError {
            message: message.into(),
            hint: hint.map(Into::into),
            code: Some(code),
        }
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        ReshapeError::FormatError {
            message: message.into(),
            hint: Some("Converted values must form a valid HCL expression".into()),
            code: Some(501),
        }
    }
}

impl From<hcl_edit::parser::Error> for ReshapeError {
    fn from(err: hcl_edit::parser::Error) -> Self {
        ReshapeError::SyntaxError {
            message: err.to_string(),
            hint: None,
            code: Some(201),
        }
    }
}

impl From<hcl::Error> for ReshapeError {
    fn from(err: hcl::Error) -> Self {
        ReshapeError::SyntaxError {
            message: err.to_string(),
            hint: None,
            code: Some(202),
        }
    }
}

fn suffix(hint: &Option<String>, code: &Option<u32>) -> String {
    format!(
        "{}{}",
        hint.as_ref().map_or(String::new(), |h| format!(" Hint: {}", h)),
        code.map_or(String::new(), |c| format!(" Code: {}", c))
    )
}
