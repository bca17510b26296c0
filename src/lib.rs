// Author: Dustin Pilgrim
// License: MIT

//! Rewrites repeated HCL blocks inside selected resources into single
//! list, object or map attributes, and translates attribute paths to match.
//!
//! Documents are read with `hcl-edit`, so everything outside the converted
//! blocks prints back exactly as written. Converted attributes and
//! canonical forms are laid out by `hcl::format`.

pub mod ast;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod path;
pub mod utils;

pub use ast::{parse_body, Attribute, Block, BlockExt, BlockLabel, Body, BodyExt, Expression, Structure, Value};
pub use config::{Arity, FieldRule, RuleTable, Target};
pub use convert::{BlockReport, ConversionReport, Converter, FieldConversion, convert_str, lift};
pub use error::ReshapeError;
pub use export::{canonicalize, equivalent, export_body_to_json, export_str_to_json, print_body};
pub use path::{AttrPath, Segment, rewrite_path, rewrite_path_keys, rewrite_paths};
