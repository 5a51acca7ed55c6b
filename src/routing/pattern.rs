//! Route template compilation and matching.
//!
//! # Responsibilities
//! - Compile `{name}` templates into segment matchers
//! - Match full paths exactly (no trailing-slash normalization)
//! - Extract raw placeholder values in declaration order
//!
//! # Design Decisions
//! - Segment-wise matching, no regex in the hot path
//! - A placeholder matches one non-empty segment of `[A-Za-z0-9_-]+`
//! - A malformed placeholder is treated as a literal segment

use indexmap::IndexMap;

/// Placeholder values extracted from a matched path, keyed by name.
/// Values are the raw, undecoded path segments.
pub type RouteParams = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    template: String,
    segments: Vec<Segment>,
    variables: Vec<String>,
}

impl RoutePattern {
    /// Compile a template such as `/api/requests/{id}`. Compilation cannot
    /// fail: a segment that is not a well-formed `{identifier}` placeholder
    /// is kept as a literal.
    pub fn compile(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut variables = Vec::new();

        for part in template.split('/') {
            match placeholder_name(part) {
                Some(name) => {
                    variables.push(name.to_string());
                    segments.push(Segment::Placeholder(name.to_string()));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Self {
            template: template.to_string(),
            segments,
            variables,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in declaration order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Match a full request path. Returns the extracted placeholder values,
    /// or `None` when the path does not match exactly.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Placeholder(name) => {
                    if !is_valid_capture(part) {
                        return None;
                    }
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        Some(params)
    }
}

/// `{ident}` where `ident` starts with a letter or underscore and continues
/// with letters, digits, `_` or `-`. Anything else is not a placeholder.
fn placeholder_name(segment: &str) -> Option<&str> {
    let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
    let mut chars = inner.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        Some(inner)
    } else {
        None
    }
}

fn is_valid_capture(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
