//! Operation classification from HTTP method and path shape.
//!
//! Only `GET` requests are ever filtered. A `GET` is a point read ([`OperationType::Read`])
//! when the path ends in a resource identifier, a named lookup or a single-document
//! sub-resource, and a collection listing ([`OperationType::List`]) otherwise.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;
use crate::resource::strip_query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// `GET` on a single identified resource.
    Read,
    /// `GET` on a collection (typically paginated).
    List,
    /// Any non-`GET`: create, update, delete or action.
    Manage,
}

impl OperationType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Read => "read",
            OperationType::List => "list",
            OperationType::Manage => "manage",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(OperationType::Read),
            "list" => Ok(OperationType::List),
            "manage" => Ok(OperationType::Manage),
            other => Err(FilterError::Config(format!(
                "unknown operation type '{other}'"
            ))),
        }
    }
}

/// ID prefixes used by the API for each resource family.
pub const ID_PREFIXES: &[&str] = &[
    "ws-", "run-", "org-", "prj-", "var-", "plan-", "apply-", "sv-", "wsout-", "ce-", "asmtres-",
    "user-",
];

/// Path segments that name a collection.
pub const COLLECTION_SEGMENTS: &[&str] = &[
    "workspaces",
    "runs",
    "organizations",
    "projects",
    "vars",
    "variables",
    "plans",
    "applies",
    "state-versions",
    "state-version-outputs",
    "outputs",
    "cost-estimates",
    "assessment-results",
    "users",
];

/// Path segments that return a single document below an identified resource.
pub const DOCUMENT_SEGMENTS: &[&str] = &[
    "json-output",
    "json-output-redacted",
    "json-schema",
    "json-state",
    "log",
    "logs",
    "download",
    "content",
    "details",
    "current-run",
    "current-state-version",
    "current-assessment-result",
    "plan",
    "apply",
    "cost-estimate",
    "entitlement-set",
    "subscription",
];

fn has_id_prefix(segment: &str) -> bool {
    ID_PREFIXES
        .iter()
        .any(|prefix| segment.len() > prefix.len() && segment.starts_with(prefix))
}

fn is_collection(segment: &str) -> bool {
    COLLECTION_SEGMENTS.contains(&segment)
}

/// Classify a request as point read, list, or manage.
#[must_use]
pub fn classify_operation(path: &str, method: &str) -> OperationType {
    if !method.trim().eq_ignore_ascii_case("GET") {
        return OperationType::Manage;
    }

    let segments: Vec<&str> = strip_query(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let Some((last, parents)) = segments.split_last() else {
        return OperationType::List;
    };

    if has_id_prefix(last) {
        return OperationType::Read;
    }
    if is_collection(last) {
        return OperationType::List;
    }
    if !parents.is_empty() && DOCUMENT_SEGMENTS.contains(last) {
        return OperationType::Read;
    }
    // Named lookup, e.g. `organizations/<name>` or `workspaces/<name>`.
    if parents.last().is_some_and(|prev| is_collection(prev)) {
        return OperationType::Read;
    }
    OperationType::List
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_get_methods_are_manage() {
        for m in ["POST", "PATCH", "PUT", "DELETE", "post", "HEAD", ""] {
            assert_eq!(
                classify_operation("/workspaces/ws-abc", m),
                OperationType::Manage,
                "method {m}"
            );
        }
    }

    #[test]
    fn get_is_case_insensitive() {
        assert_eq!(classify_operation("/workspaces/ws-abc", "get"), OperationType::Read);
    }

    #[test]
    fn identified_resources_are_reads() {
        for p in [
            "/workspaces/ws-abc123",
            "runs/run-XyZ",
            "/projects/prj-1",
            "/vars/var-1",
            "/state-versions/sv-1",
            "/assessment-results/asmtres-1",
            "/cost-estimates/ce-1",
        ] {
            assert_eq!(classify_operation(p, "GET"), OperationType::Read, "path {p}");
        }
    }

    #[test]
    fn collections_are_lists() {
        for p in [
            "/organizations",
            "/organizations/acme/workspaces",
            "/workspaces/ws-abc/runs",
            "/state-versions/sv-1/outputs",
            "/organizations/acme/projects?page[number]=2",
            "/",
            "",
        ] {
            assert_eq!(classify_operation(p, "GET"), OperationType::List, "path {p}");
        }
    }

    #[test]
    fn sub_resource_documents_are_reads() {
        for p in [
            "/plans/plan-1/json-output",
            "/runs/run-1/plan",
            "/runs/run-1/apply",
            "/workspaces/ws-1/current-state-version",
            "/account/details",
            "/assessment-results/asmtres-1/log",
        ] {
            assert_eq!(classify_operation(p, "GET"), OperationType::Read, "path {p}");
        }
    }

    #[test]
    fn named_lookups_are_reads() {
        assert_eq!(
            classify_operation("/organizations/acme", "GET"),
            OperationType::Read
        );
        assert_eq!(
            classify_operation("/organizations/acme/workspaces/prod-network", "GET"),
            OperationType::Read
        );
    }

    #[test]
    fn bare_prefix_is_not_an_identifier() {
        assert_eq!(classify_operation("/things/ws-", "GET"), OperationType::List);
    }

    #[test]
    fn operation_type_parses_names() {
        assert_eq!("LIST".parse::<OperationType>().unwrap(), OperationType::List);
        assert!("delete".parse::<OperationType>().is_err());
    }
}
