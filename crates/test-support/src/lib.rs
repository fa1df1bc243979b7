//! JSON:API fixtures shared by the integration tests.

use anyhow::Context as _;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A resource object with the given `type`, `id` and attributes.
#[must_use]
pub fn resource(kind: &str, id: &str, attributes: Value) -> Value {
    json!({
        "id": id,
        "type": kind,
        "attributes": attributes,
        "links": { "self": format!("/api/v2/{kind}/{id}") }
    })
}

/// A workspace carrying audit fields, statistics and a mix of relationships.
#[must_use]
pub fn workspace(id: &str) -> Value {
    let mut ws = resource(
        "workspaces",
        id,
        json!({
            "name": format!("{id}-name"),
            "created-at": "2023-01-01T00:00:00Z",
            "updated-at": "2023-06-01T12:00:00Z",
            "permissions": { "can-update": true, "can-destroy": false },
            "actions": { "is-destroyable": true },
            "terraform-version": "1.6.2",
            "apply-duration-average": 42.3,
            "plan-duration-average": 11.5,
            "policy-check-failures": 0,
            "run-failures": 2,
            "workspace-kpis-runs-count": 40,
            "unarchived-workspace-change-requests-count": 0
        }),
    );
    ws["relationships"] = json!({
        "organization": { "data": { "id": "acme", "type": "organizations" } },
        "project": { "data": { "id": "prj-1", "type": "projects" } },
        "current-run": { "data": { "id": "run-1", "type": "runs" } },
        "agent-pool": { "data": null },
        "readme": { "data": null }
    });
    ws
}

/// A state version with hosted URLs and VCS details.
#[must_use]
pub fn state_version(id: &str) -> Value {
    resource(
        "state-versions",
        id,
        json!({
            "created-at": "2023-03-01T00:00:00Z",
            "serial": 7,
            "vcs-commit-sha": "abc123",
            "vcs-commit-url": "https://vcs.example/commit/abc123",
            "hosted-state-download-url": "https://archivist.example/state",
            "hosted-json-state-download-url": "https://archivist.example/json",
            "hosted-state-upload-url": null
        }),
    )
}

/// Wrap a single resource: `{ "data": item }`.
#[must_use]
pub fn single_document(item: Value) -> Value {
    json!({ "data": item })
}

/// Wrap resources as a paginated list document.
#[must_use]
pub fn list_document(items: Vec<Value>) -> Value {
    let count = items.len();
    json!({
        "data": items,
        "links": {
            "self": "/api/v2/organizations/acme/workspaces?page%5Bnumber%5D=1",
            "next": null
        },
        "meta": {
            "pagination": {
                "current-page": 1,
                "page-size": 20,
                "prev-page": null,
                "next-page": null,
                "total-pages": 1,
                "total-count": count
            }
        }
    })
}

/// Attribute keys of every resource in `data` and `included`, as `(pointer, key)` pairs.
#[must_use]
pub fn attribute_keys(doc: &Value) -> BTreeSet<(String, String)> {
    let mut out = BTreeSet::new();
    for section in ["data", "included"] {
        let items: Vec<(String, &Value)> = match doc.get(section) {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("/{section}/{i}"), v))
                .collect(),
            Some(v @ Value::Object(_)) => vec![(format!("/{section}"), v)],
            _ => Vec::new(),
        };
        for (pointer, item) in items {
            if let Some(attrs) = item.get("attributes").and_then(Value::as_object) {
                out.extend(attrs.keys().map(|k| (pointer.clone(), k.clone())));
            }
        }
    }
    out
}

/// Write `value` as pretty JSON into `dir/name`.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn write_json(dir: &Path, name: &str, value: &Value) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    let bytes = serde_json::to_vec_pretty(value).context("serialize fixture")?;
    std::fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
