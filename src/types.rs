//! Core types for spark-elements.
//!
//! Every bindable value in the engine is a [`Value`]. Models expose their
//! fields as values, attributes are values coerced to text, and event payloads
//! travel as values. The helpers here implement the small amount of value
//! semantics the binding layer relies on: text coercion, truthiness and
//! dotted-path addressing (`user.name`, `items.length`, `rows.0`).

pub use serde_json::Value;

/// Cleanup function returned by anything that registers a callback.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Coercion
// =============================================================================

/// Coerce a value to the text written into attributes and text nodes.
///
/// Strings are used verbatim, `null` renders empty, scalars use their display
/// form and arrays/objects render as compact JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Truthiness used by conditional rendering.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// =============================================================================
// Paths
// =============================================================================

/// Split a dotted path into its root segment and the remainder.
///
/// `"user.name.first"` yields `("user", "name.first")`, `"user"` yields
/// `("user", "")`.
pub fn split_root(path: &str) -> (&str, &str) {
    match path.split_once('.') {
        Some((root, rest)) => (root, rest),
        None => (path, ""),
    }
}

/// Read a nested value by dotted path. An empty path returns the value itself.
///
/// `length` is understood on arrays and strings, numeric segments index arrays.
pub fn lookup(value: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return Some(value.clone());
    }
    let mut current = value;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => {
                if segment == "length" {
                    // `length` is terminal; nothing can follow a number
                    return segments.peek().is_none().then(|| Value::from(items.len()));
                }
                segment.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            Value::String(s) if segment == "length" => {
                return segments
                    .peek()
                    .is_none()
                    .then(|| Value::from(s.chars().count()));
            }
            _ => None,
        };
        current = next?;
    }
    Some(current.clone())
}

/// Write a nested value by dotted path, creating intermediate objects where
/// the path passes through `null`. Returns false if the path cannot be written.
pub fn assign(target: &mut Value, path: &str, new_value: Value) -> bool {
    if path.is_empty() {
        *target = new_value;
        return true;
    }
    let (head, rest) = split_root(path);
    if target.is_null() {
        *target = Value::Object(Default::default());
    }
    let slot = match target {
        Value::Object(map) => map.entry(head.to_string()).or_insert(Value::Null),
        Value::Array(items) => match head.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            Some(slot) => slot,
            None => return false,
        },
        _ => return false,
    };
    assign(slot, rest, new_value)
}
