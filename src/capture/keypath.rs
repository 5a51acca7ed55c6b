//! Bracketed key paths for query strings and form fields.
//!
//! Keys such as `user[name]`, `tags[]` or `matrix[a][b]` address nested
//! structures. The same parsing feeds query parameters, form fields and
//! uploaded-file attributes so all three nest identically.

use serde_json::{Map, Value};

/// One step of a parsed key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSeg {
    /// `[key]`, a named member.
    Key(String),
    /// `[]`, appending under the next numeric key.
    Append,
}

/// Split `base[a][]` into the base name and its bracket segments. A key with
/// unbalanced or empty brackets keeps the malformed tail as part of the base.
pub fn parse_key(key: &str) -> (String, Vec<PathSeg>) {
    let Some(open) = key.find('[') else {
        return (key.to_string(), Vec::new());
    };

    let base = key[..open].to_string();
    if base.is_empty() {
        return (key.to_string(), Vec::new());
    }

    let mut segments = Vec::new();
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            // Unbalanced bracket: fold the tail back into the base name.
            return (key.to_string(), Vec::new());
        };
        let inner = &stripped[..close];
        segments.push(if inner.is_empty() {
            PathSeg::Append
        } else {
            PathSeg::Key(inner.to_string())
        });
        rest = &stripped[close + 1..];
    }

    if !rest.is_empty() {
        return (key.to_string(), Vec::new());
    }

    (base, segments)
}

/// Insert `value` into `map` under a possibly bracketed `key`. Scalar
/// collisions overwrite (last write wins); `[]` appends under successive
/// numeric keys, which keeps array-style fields ordered.
pub fn insert_pair(map: &mut Map<String, Value>, key: &str, value: Value) {
    let (base, path) = parse_key(key);
    if path.is_empty() {
        map.insert(base, value);
        return;
    }

    let entry = map.entry(base).or_insert(Value::Null);
    set_path(entry, &path, value);
}

/// Walk `path` into `target`, creating objects along the way, and set the
/// final member. A non-object intermediate value is replaced by an object.
pub fn set_path(target: &mut Value, path: &[PathSeg], value: Value) {
    if !matches!(target, Value::Object(_)) {
        *target = Value::Object(Map::new());
    }
    let Value::Object(map) = target else {
        return;
    };

    let key = match &path[0] {
        PathSeg::Key(key) => key.clone(),
        PathSeg::Append => map.len().to_string(),
    };

    if path.len() == 1 {
        map.insert(key, value);
    } else {
        let entry = map.entry(key).or_insert(Value::Null);
        set_path(entry, &path[1..], value);
    }
}
