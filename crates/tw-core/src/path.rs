//! Path-addressed reads and mutations over nested JSON values.
//!
//! A path is a dot-delimited list of segments. Each segment is an object key,
//! or a list index when the container at that point is a list and the segment
//! is a non-negative integer. Reads never fail on missing data; writes create
//! intermediate objects on demand but never create lists, and refuse to walk
//! through scalars. `delete` treats a path through a scalar like a missing
//! one and does nothing.

use serde_json::{Map, Number, Value};

use crate::error::{TwError, TwResult};
use crate::event::{Operation, StateDiff};

/// A mutable handle to the container one level above the target.
enum Slot<'a> {
    Object(&'a mut Map<String, Value>),
    Array(&'a mut Vec<Value>),
}

/// Split a path into its segments, rejecting empty paths and segments.
pub fn split_path(path: &str) -> TwResult<Vec<&str>> {
    if path.is_empty() {
        return Err(TwError::invalid_path(path, "path is empty"));
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(TwError::invalid_path(path, "path has an empty segment"));
    }
    Ok(segments)
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.bytes().all(|b| b.is_ascii_digit()) {
        segment.parse().ok()
    } else {
        None
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn child<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Read the value at `path`.
///
/// Missing keys, out-of-range indices, scalars met along the way and `null`
/// all read as `None`.
pub fn get_path<'v>(root: &'v Map<String, Value>, path: &str) -> TwResult<Option<&'v Value>> {
    let segments = split_path(path)?;
    let mut current = match root.get(segments[0]) {
        Some(v) => v,
        None => return Ok(None),
    };
    for segment in &segments[1..] {
        current = match child(current, segment) {
            Some(v) => v,
            None => return Ok(None),
        };
    }
    Ok(if current.is_null() { None } else { Some(current) })
}

fn list_index(path: &str, segment: &str, len: usize) -> TwResult<usize> {
    parse_index(segment).filter(|i| *i < len).ok_or_else(|| {
        TwError::invalid_path(
            path,
            format!("segment \"{segment}\" is not an index into a list of {len}"),
        )
    })
}

/// Walk to the parent container, creating missing objects on the way.
fn parent_for_write<'a>(
    root: &'a mut Map<String, Value>,
    path: &str,
    parents: &[&str],
) -> TwResult<Slot<'a>> {
    let mut slot = Slot::Object(root);
    for segment in parents {
        let next: &mut Value = match slot {
            Slot::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
            Slot::Array(items) => {
                let idx = list_index(path, segment, items.len())?;
                &mut items[idx]
            }
        };
        if next.is_null() {
            *next = Value::Object(Map::new());
        }
        slot = match next {
            Value::Object(map) => Slot::Object(map),
            Value::Array(items) => Slot::Array(items),
            other => {
                return Err(TwError::invalid_path(
                    path,
                    format!("segment \"{segment}\" holds a {}", kind_of(other)),
                ));
            }
        };
    }
    Ok(slot)
}

/// Walk to the parent container without creating anything.
fn parent_if_present<'a>(
    root: &'a mut Map<String, Value>,
    parents: &[&str],
) -> Option<Slot<'a>> {
    let mut slot = Slot::Object(root);
    for segment in parents {
        let next: Option<&mut Value> = match slot {
            Slot::Object(map) => map.get_mut(*segment),
            Slot::Array(items) => parse_index(segment).and_then(|i| items.get_mut(i)),
        };
        slot = match next? {
            Value::Object(map) => Slot::Object(map),
            Value::Array(items) => Slot::Array(items),
            _ => return None,
        };
    }
    Some(slot)
}

fn write(
    root: &mut Map<String, Value>,
    path: &str,
    segments: &[&str],
    value: Value,
) -> TwResult<()> {
    let Some((last, parents)) = segments.split_last() else {
        return Err(TwError::invalid_path(path, "path is empty"));
    };
    match parent_for_write(root, path, parents)? {
        Slot::Object(map) => {
            map.insert(last.to_string(), value);
        }
        Slot::Array(items) => {
            let idx = list_index(path, last, items.len())?;
            items[idx] = value;
        }
    }
    Ok(())
}

fn delete(root: &mut Map<String, Value>, path: &str, segments: &[&str]) -> TwResult<()> {
    let Some((last, parents)) = segments.split_last() else {
        return Err(TwError::invalid_path(path, "path is empty"));
    };
    match parent_if_present(root, parents) {
        Some(Slot::Object(map)) => {
            map.remove(*last);
        }
        Some(Slot::Array(items)) => {
            if let Some(idx) = parse_index(last).filter(|i| *i < items.len()) {
                items.remove(idx);
            }
        }
        None => {}
    }
    Ok(())
}

fn arithmetic(
    path: &str,
    operation: Operation,
    current: Option<&Value>,
    operand: &Value,
) -> TwResult<Value> {
    let non_numeric = || TwError::NonNumeric {
        path: path.to_string(),
        operation: operation.to_string(),
    };
    let identity = Number::from(if operation == Operation::Multiply { 1 } else { 0 });
    let lhs = match current {
        None => &identity,
        Some(Value::Number(n)) => n,
        Some(_) => return Err(non_numeric()),
    };
    let Value::Number(rhs) = operand else {
        return Err(non_numeric());
    };

    if let (Some(a), Some(b)) = (lhs.as_i64(), rhs.as_i64()) {
        let exact = match operation {
            Operation::Add => a.checked_add(b),
            Operation::Subtract => a.checked_sub(b),
            _ => a.checked_mul(b),
        };
        if let Some(n) = exact {
            return Ok(Value::from(n));
        }
    }

    let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
        return Err(non_numeric());
    };
    let result = match operation {
        Operation::Add => a + b,
        Operation::Subtract => a - b,
        _ => a * b,
    };
    Number::from_f64(result)
        .map(Value::Number)
        .ok_or_else(non_numeric)
}

/// Apply `operation` with `value` at `path` and return the previous value.
///
/// The previous value is `None` when nothing (or `null`) was stored there.
pub fn apply(
    root: &mut Map<String, Value>,
    path: &str,
    operation: Operation,
    value: &Value,
) -> TwResult<Option<Value>> {
    let segments = split_path(path)?;
    let previous = get_path(root, path)?.cloned();

    match operation {
        Operation::Set => write(root, path, &segments, value.clone())?,
        Operation::Add | Operation::Subtract | Operation::Multiply => {
            let result = arithmetic(path, operation, previous.as_ref(), value)?;
            write(root, path, &segments, result)?;
        }
        Operation::Append => match &previous {
            None => write(root, path, &segments, Value::Array(vec![value.clone()]))?,
            Some(Value::Array(items)) => {
                let mut items = items.clone();
                items.push(value.clone());
                write(root, path, &segments, Value::Array(items))?;
            }
            Some(_) => {}
        },
        Operation::Remove => {
            if let Some(Value::Array(items)) = &previous
                && let Some(pos) = items.iter().position(|v| v == value)
            {
                let mut items = items.clone();
                items.remove(pos);
                write(root, path, &segments, Value::Array(items))?;
            }
        }
        Operation::Delete => delete(root, path, &segments)?,
    }

    Ok(previous)
}

/// Apply a [`StateDiff`] and return the previous value at its path.
pub fn apply_diff(root: &mut Map<String, Value>, diff: &StateDiff) -> TwResult<Option<Value>> {
    apply(root, &diff.path, diff.operation, &diff.value)
}
