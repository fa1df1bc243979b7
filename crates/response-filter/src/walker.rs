//! Traversal of JSON:API documents.
//!
//! A document is `{ "data": <resource | [resource] | null>, "included": [resource], ... }`.
//! [`check_document`] validates the shape up front and reports the first anomaly with a JSON
//! pointer; [`for_each_resource_mut`] then visits every resource object. Filtering only mutates
//! after a successful check, so a malformed document is never left half-pruned.

use serde_json::{Map, Value};

use crate::error::{FilterError, Result};

/// Where a resource object sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Primary data (`data` or `data[i]`).
    Data,
    /// Side-loaded resources (`included[i]`).
    Included,
}

impl Section {
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Section::Data => "data",
            Section::Included => "included",
        }
    }
}

/// Validate that `doc` has the shape the filter engine walks over.
///
/// # Errors
///
/// - [`FilterError::MissingData`] if `doc` is not an object with a `data` member.
/// - [`FilterError::MalformedDocument`] if a resource, its `attributes` or its `relationships`
///   is not a JSON object, or if `included` is not an array.
pub fn check_document(doc: &Value) -> Result<()> {
    let Some(data) = doc.as_object().and_then(|map| map.get("data")) else {
        return Err(FilterError::MissingData);
    };
    match data {
        Value::Null => {}
        Value::Object(resource) => check_resource(resource, "/data")?,
        Value::Array(items) => check_items(items, "/data")?,
        other => {
            return Err(FilterError::malformed(
                "/data",
                format!("expected object, array or null, got {}", kind(other)),
            ));
        }
    }
    match doc.get("included") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(items)) => check_items(items, "/included"),
        Some(other) => Err(FilterError::malformed(
            "/included",
            format!("expected array, got {}", kind(other)),
        )),
    }
}

fn check_items(items: &[Value], pointer: &str) -> Result<()> {
    for (idx, item) in items.iter().enumerate() {
        let item_pointer = format!("{pointer}/{idx}");
        let Value::Object(resource) = item else {
            return Err(FilterError::malformed(
                item_pointer,
                format!("expected resource object, got {}", kind(item)),
            ));
        };
        check_resource(resource, &item_pointer)?;
    }
    Ok(())
}

fn check_resource(resource: &Map<String, Value>, pointer: &str) -> Result<()> {
    for member in ["attributes", "relationships"] {
        match resource.get(member) {
            None | Some(Value::Object(_)) => {}
            Some(other) => {
                return Err(FilterError::malformed(
                    format!("{pointer}/{member}"),
                    format!("expected object, got {}", kind(other)),
                ));
            }
        }
    }
    Ok(())
}

/// Visit every resource object in `data` and `included`.
///
/// Nodes that are not objects are skipped; call [`check_document`] first to reject them.
pub fn for_each_resource_mut<F>(doc: &mut Value, mut visit: F)
where
    F: FnMut(Section, &mut Map<String, Value>),
{
    let Some(map) = doc.as_object_mut() else {
        return;
    };
    for section in [Section::Data, Section::Included] {
        match map.get_mut(section.key()) {
            Some(Value::Object(resource)) => visit(section, resource),
            Some(Value::Array(items)) => {
                for item in items {
                    if let Value::Object(resource) = item {
                        visit(section, resource);
                    }
                }
            }
            _ => {}
        }
    }
}

/// The resource's JSON:API `type` tag.
#[must_use]
pub fn type_tag(resource: &Map<String, Value>) -> Option<&str> {
    resource.get("type").and_then(Value::as_str)
}

/// Remove every key of `member` (an object inside `resource`) for which `remove` returns true.
///
/// Returns the number of removed keys. Missing or non-object members are left alone.
pub fn prune_member<F>(resource: &mut Map<String, Value>, member: &str, mut remove: F) -> usize
where
    F: FnMut(&str) -> bool,
{
    let Some(Value::Object(inner)) = resource.get_mut(member) else {
        return 0;
    };
    let before = inner.len();
    inner.retain(|k, _| !remove(k.as_str()));
    before - inner.len()
}

/// Depth-first count of object keys in a value; used for size diagnostics.
#[must_use]
pub fn count_keys(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.len() + map.values().map(count_keys).sum::<usize>(),
        Value::Array(items) => items.iter().map(count_keys).sum(),
        _ => 0,
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
