//! Slash-separated path helpers over JSON trees

use serde_json::{Map, Value};

/// Non-empty segments of a path; `""` and `"/"` are the root
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join a relative path onto a base path
pub fn join(base: &str, relative: &str) -> String {
    let mut parts = segments(base);
    parts.extend(segments(relative));
    parts.join("/")
}

/// True when one path is equal to, or nested below, the other
pub fn overlaps(a: &str, b: &str) -> bool {
    let a = segments(a);
    let b = segments(b);
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

/// The value at `path`, or `Value::Null` when absent
pub fn value_at(tree: &Value, path: &str) -> Value {
    let mut node = tree;
    for segment in segments(path) {
        match node.get(segment) {
            Some(child) => node = child,
            None => return Value::Null,
        }
    }
    node.clone()
}

/// Replace the value at `path`. Writing null deletes the key and any parent
/// objects left empty, so an empty tree is always `Value::Null`.
pub fn set_at(tree: &mut Value, path: &str, value: Value) {
    set_in(tree, &segments(path), value);
}

fn set_in(node: &mut Value, path: &[&str], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }

    let Value::Object(map) = node else {
        return;
    };

    let child_empty = {
        let child = map.entry(first.to_string()).or_insert(Value::Null);
        set_in(child, rest, value);
        child.is_null()
    };
    if child_empty {
        map.remove(*first);
    }

    if map.is_empty() {
        *node = Value::Null;
    }
}
