// Author: Dustin Pilgrim
// License: MIT

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static TRAVERSAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*(?:\.[A-Za-z0-9_-]+|\[(?:0|[1-9][0-9]*)\])*$")
        .expect("traversal pattern is valid")
});

static TRAVERSAL_STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.([A-Za-z0-9_-]+)|\[([0-9]+)\]").expect("traversal step pattern is valid")
});

/// One segment of an attribute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Name(String),
    Index(usize),
}

impl Segment {
    fn parse(token: &str) -> Segment {
        // only canonical decimals are indexes, so "00" or "+1" survive as names
        let canonical = token == "0"
            || (!token.is_empty()
                && !token.starts_with('0')
                && token.bytes().all(|b| b.is_ascii_digit()));

        match token.parse::<usize>() {
            Ok(index) if canonical => Segment::Index(index),
            _ => Segment::Name(token.to_string()),
        }
    }

    fn is_zero(&self) -> bool {
        matches!(self, Segment::Index(0))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => f.write_str(name),
            Segment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A dotted attribute address such as `replication_specs.0.zone_name`.
/// Parsing never fails and `to_string` gives back the input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttrPath {
    segments: Vec<Segment>,
}

impl AttrPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Drop the `0` index after every singleton name. A run of zeros is
    /// dropped whole, so applying this twice changes nothing.
    pub fn collapse_singletons<S: AsRef<str>>(&self, singletons: &[S]) -> AttrPath {
        let is_singleton =
            |name: &str| singletons.iter().any(|s| s.as_ref() == name);

        let mut segments = Vec::with_capacity(self.segments.len());
        let mut iter = self.segments.iter().peekable();

        while let Some(segment) = iter.next() {
            segments.push(segment.clone());
            if let Segment::Name(name) = segment {
                if is_singleton(name) {
                    while iter.next_if(|next| next.is_zero()).is_some() {}
                }
            }
        }

        AttrPath { segments }
    }

    /// Read an HCL traversal such as `replication_specs[0].zone_name` or
    /// its legacy form `replication_specs.0.zone_name`. `None` for anything
    /// that is not a plain attribute traversal.
    pub fn from_traversal(text: &str) -> Option<AttrPath> {
        if !TRAVERSAL.is_match(text) {
            return None;
        }

        let root_end = text.find(['.', '[']).unwrap_or(text.len());
        let mut segments = vec![Segment::Name(text[..root_end].to_string())];
        for step in TRAVERSAL_STEP.captures_iter(&text[root_end..]) {
            if let Some(name) = step.get(1) {
                segments.push(Segment::parse(name.as_str()));
            } else if let Some(index) = step.get(2) {
                segments.push(Segment::Index(index.as_str().parse().ok()?));
            }
        }

        Some(AttrPath { segments })
    }

    /// Write the path as an HCL traversal with bracketed indexes.
    pub fn to_traversal(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Index(index) => out.push_str(&format!("[{}]", index)),
                Segment::Name(name) if i == 0 => out.push_str(name),
                Segment::Name(name) => {
                    out.push('.');
                    out.push_str(name);
                }
            }
        }
        out
    }
}

impl FromStr for AttrPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AttrPath {
            segments: s.split('.').map(Segment::parse).collect(),
        })
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<&str> for AttrPath {
    fn from(s: &str) -> Self {
        let Ok(path) = AttrPath::from_str(s);
        path
    }
}

/// Translate a path written against repeated blocks into the path of the
/// same value after conversion. Indexes after list and keyed-pair fields
/// are kept; unknown names pass through.
///
/// # Examples
/// ```
/// use hcl_reshape::rewrite_path;
///
/// let singletons = ["electable_specs", "advanced_configuration"];
/// assert_eq!(
///     rewrite_path("replication_specs.0.region_configs.0.electable_specs.0.disk_size_gb", &singletons),
///     "replication_specs.0.region_configs.0.electable_specs.disk_size_gb"
/// );
/// ```
pub fn rewrite_path<S: AsRef<str>>(path: &str, singletons: &[S]) -> String {
    AttrPath::from(path).collapse_singletons(singletons).to_string()
}

/// Rewrite every path in `paths`, keeping order.
pub fn rewrite_paths<P, S>(paths: &[P], singletons: &[S]) -> Vec<String>
where
    P: AsRef<str>,
    S: AsRef<str>,
{
    paths
        .iter()
        .map(|p| rewrite_path(p.as_ref(), singletons))
        .collect()
}

/// Rewrite the keys of a path → expected-value map, keeping the values.
/// If two keys rewrite to the same path the later entry wins.
pub fn rewrite_path_keys<I, K, V, S>(entries: I, singletons: &[S]) -> IndexMap<String, V>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|(k, v)| (rewrite_path(k.as_ref(), singletons), v))
        .collect()
}
