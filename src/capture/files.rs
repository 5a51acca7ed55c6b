//! Uploaded-file metadata normalization.
//!
//! # Responsibilities
//! - Model transport upload metadata: one entry per field, each attribute
//!   (`name`/`type`/`size`/`error`) a scalar or a nested structure keyed
//!   identically across attributes
//! - Transpose that parallel-attribute shape into a single tree keyed by
//!   field, with a `{name, type, size, error}` descriptor at every leaf
//!
//! # Design Decisions
//! - `FileNode` is a discriminated union (leaf descriptor or group), so the
//!   transform is a pure recursion independent of any transport convention
//! - `size`/`error` coerce to integers, `name`/`type` to strings; missing
//!   attributes fall back to empty/zero rather than failing the capture

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::capture::keypath::{parse_key, set_path};

/// Normalized metadata for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: i64,
    pub error: i64,
}

/// One node of the normalized file tree: a file descriptor, or a group of
/// named children for array-style multi-file fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FileNode {
    Leaf(FileInfo),
    Group(IndexMap<String, FileNode>),
}

/// Transport-level metadata for one upload field. Each attribute mirrors the
/// same nesting: scalars for a single file, identically-keyed structures for
/// array fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadField {
    #[serde(default)]
    pub name: Value,
    #[serde(default, rename = "type")]
    pub content_type: Value,
    #[serde(default)]
    pub size: Value,
    #[serde(default)]
    pub error: Value,
}

/// One file part as it comes off the wire, before attribute grouping.
#[derive(Debug, Clone)]
pub struct UploadedPart {
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    pub error: i64,
}

/// The full upload set for a request, keyed by field name in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Uploads {
    fields: IndexMap<String, UploadField>,
}

impl Uploads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Inject a field in the transport's grouped-by-attribute shape.
    pub fn insert_field(&mut self, field: impl Into<String>, meta: UploadField) {
        self.fields.insert(field.into(), meta);
    }

    /// Record one parsed multipart part under a possibly bracketed field
    /// name (`avatar`, `docs[]`, `nested[a][b]`), building the grouped
    /// attribute structures as the transport would.
    pub fn insert_part(&mut self, key: &str, part: UploadedPart) {
        let (base, path) = parse_key(key);
        let field = self.fields.entry(base).or_default();

        if path.is_empty() {
            field.name = Value::String(part.file_name);
            field.content_type = Value::String(part.content_type);
            field.size = Value::from(part.size);
            field.error = Value::from(part.error);
            return;
        }

        set_path(&mut field.name, &path, Value::String(part.file_name));
        set_path(
            &mut field.content_type,
            &path,
            Value::String(part.content_type),
        );
        set_path(&mut field.size, &path, Value::from(part.size));
        set_path(&mut field.error, &path, Value::from(part.error));
    }

    /// Transpose the parallel-attribute shape into one tree keyed by field.
    pub fn normalize(&self) -> IndexMap<String, FileNode> {
        self.fields
            .iter()
            .map(|(field, meta)| (field.clone(), normalize_field(meta)))
            .collect()
    }
}

fn normalize_field(field: &UploadField) -> FileNode {
    match &field.name {
        Value::Object(names) => {
            let mut group = IndexMap::new();
            for (key, name) in names {
                let child = UploadField {
                    name: name.clone(),
                    content_type: member(&field.content_type, key),
                    size: member(&field.size, key),
                    error: member(&field.error, key),
                };
                group.insert(key.clone(), normalize_field(&child));
            }
            FileNode::Group(group)
        }
        scalar => FileNode::Leaf(FileInfo {
            name: coerce_string(scalar),
            content_type: coerce_string(&field.content_type),
            size: coerce_int(&field.size),
            error: coerce_int(&field.error),
        }),
    }
}

fn member(value: &Value, key: &str) -> Value {
    value.get(key).cloned().unwrap_or(Value::Null)
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn coerce_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// The tree as a JSON object, ready for storage.
pub fn to_value(tree: &IndexMap<String, FileNode>) -> Value {
    serde_json::to_value(tree).unwrap_or_else(|_| Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_field_is_leaf() {
        let mut uploads = Uploads::new();
        uploads.insert_field(
            "avatar",
            UploadField {
                name: json!("avatar.png"),
                content_type: json!("image/png"),
                size: json!(512),
                error: json!(0),
            },
        );

        let tree = uploads.normalize();
        assert_eq!(
            tree.get("avatar"),
            Some(&FileNode::Leaf(FileInfo {
                name: "avatar.png".into(),
                content_type: "image/png".into(),
                size: 512,
                error: 0,
            }))
        );
    }

    #[test]
    fn test_parallel_arrays_transpose() {
        let mut uploads = Uploads::new();
        uploads.insert_field(
            "docs",
            UploadField {
                name: json!({"0": "a.txt", "1": "b.txt"}),
                content_type: json!({"0": "text/plain", "1": "text/plain"}),
                size: json!({"0": 10, "1": 20}),
                error: json!({"0": 0, "1": 0}),
            },
        );

        let tree = uploads.normalize();
        let Some(FileNode::Group(group)) = tree.get("docs") else {
            panic!("expected a group node");
        };
        assert_eq!(
            group.get("1"),
            Some(&FileNode::Leaf(FileInfo {
                name: "b.txt".into(),
                content_type: "text/plain".into(),
                size: 20,
                error: 0,
            }))
        );
        assert_eq!(group.keys().collect::<Vec<_>>(), ["0", "1"]);
    }

    #[test]
    fn test_nested_groups_recurse() {
        let mut uploads = Uploads::new();
        uploads.insert_field(
            "forms",
            UploadField {
                name: json!({"inner": {"deep": "d.pdf"}}),
                content_type: json!({"inner": {"deep": "application/pdf"}}),
                size: json!({"inner": {"deep": "2048"}}),
                error: json!({"inner": {"deep": 0}}),
            },
        );

        let value = to_value(&uploads.normalize());
        assert_eq!(
            value,
            json!({"forms": {"inner": {"deep": {
                "name": "d.pdf",
                "type": "application/pdf",
                "size": 2048,
                "error": 0,
            }}}})
        );
    }

    #[test]
    fn test_missing_attributes_coerce_to_defaults() {
        let mut uploads = Uploads::new();
        uploads.insert_field(
            "partial",
            UploadField {
                name: json!("p.bin"),
                ..UploadField::default()
            },
        );

        let tree = uploads.normalize();
        assert_eq!(
            tree.get("partial"),
            Some(&FileNode::Leaf(FileInfo {
                name: "p.bin".into(),
                content_type: String::new(),
                size: 0,
                error: 0,
            }))
        );
    }

    #[test]
    fn test_insert_part_builds_grouped_shape() {
        let mut uploads = Uploads::new();
        uploads.insert_part(
            "docs[]",
            UploadedPart {
                file_name: "a.txt".into(),
                content_type: "text/plain".into(),
                size: 10,
                error: 0,
            },
        );
        uploads.insert_part(
            "docs[]",
            UploadedPart {
                file_name: "b.txt".into(),
                content_type: "text/plain".into(),
                size: 20,
                error: 0,
            },
        );

        let value = to_value(&uploads.normalize());
        assert_eq!(
            value,
            json!({"docs": {
                "0": {"name": "a.txt", "type": "text/plain", "size": 10, "error": 0},
                "1": {"name": "b.txt", "type": "text/plain", "size": 20, "error": 0},
            }})
        );
    }
}
