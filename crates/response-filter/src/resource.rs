//! Resource classification.
//!
//! Maps a request path (and, as a fallback, the document's own `type` tag) onto a closed set of
//! [`ResourceType`]s. Classification is total: anything unrecognised is [`ResourceType::Generic`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;

/// Known Terraform Cloud resource families that carry filtering rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ResourceType {
    Workspace,
    Run,
    Organization,
    Project,
    Variable,
    Plan,
    Apply,
    StateVersion,
    CostEstimate,
    Assessment,
    Account,
    Generic,
}

impl ResourceType {
    /// Every resource type, in declaration order.
    pub const ALL: [ResourceType; 12] = [
        ResourceType::Workspace,
        ResourceType::Run,
        ResourceType::Organization,
        ResourceType::Project,
        ResourceType::Variable,
        ResourceType::Plan,
        ResourceType::Apply,
        ResourceType::StateVersion,
        ResourceType::CostEstimate,
        ResourceType::Assessment,
        ResourceType::Account,
        ResourceType::Generic,
    ];

    /// Canonical kebab-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Workspace => "workspace",
            ResourceType::Run => "run",
            ResourceType::Organization => "organization",
            ResourceType::Project => "project",
            ResourceType::Variable => "variable",
            ResourceType::Plan => "plan",
            ResourceType::Apply => "apply",
            ResourceType::StateVersion => "state-version",
            ResourceType::CostEstimate => "cost-estimate",
            ResourceType::Assessment => "assessment",
            ResourceType::Account => "account",
            ResourceType::Generic => "generic",
        }
    }

    /// Resolve a canonical name or one of its singular/plural aliases.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        RESOURCE_TYPE_MAP
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|(_, rt)| *rt)
    }

    /// Like [`ResourceType::from_name`], but unknown names become [`ResourceType::Generic`].
    #[must_use]
    pub fn from_name_or_generic(name: &str) -> Self {
        Self::from_name(name).unwrap_or(ResourceType::Generic)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| FilterError::Config(format!("unknown resource type '{s}'")))
    }
}

impl TryFrom<String> for ResourceType {
    type Error = FilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceType> for &'static str {
    fn from(value: ResourceType) -> Self {
        value.as_str()
    }
}

/// Path substrings, most specific first. First match wins.
///
/// Paths are normalized with a leading `/` before matching and a pattern only matches when it
/// ends on a segment boundary. Sub-collections (`/workspaces/ws-1/runs`) are listed ahead of
/// their parents.
pub const PATH_PATTERNS: &[(&str, ResourceType)] = &[
    ("/state-version-outputs", ResourceType::StateVersion),
    ("/current-state-version", ResourceType::StateVersion),
    ("/state-versions", ResourceType::StateVersion),
    ("/assessment-results", ResourceType::Assessment),
    ("/current-assessment-result", ResourceType::Assessment),
    ("/cost-estimates", ResourceType::CostEstimate),
    ("/cost-estimate", ResourceType::CostEstimate),
    ("/plans", ResourceType::Plan),
    ("/plan", ResourceType::Plan),
    ("/applies", ResourceType::Apply),
    ("/apply", ResourceType::Apply),
    ("/vars", ResourceType::Variable),
    ("/variables", ResourceType::Variable),
    ("/current-run", ResourceType::Run),
    ("/runs", ResourceType::Run),
    ("/workspaces", ResourceType::Workspace),
    ("/projects", ResourceType::Project),
    ("/organizations", ResourceType::Organization),
    ("/account/details", ResourceType::Account),
    ("/users", ResourceType::Account),
];

/// JSON:API `type` tags as emitted by the API.
pub const DATA_TYPE_MAP: &[(&str, ResourceType)] = &[
    ("workspaces", ResourceType::Workspace),
    ("runs", ResourceType::Run),
    ("organizations", ResourceType::Organization),
    ("projects", ResourceType::Project),
    ("vars", ResourceType::Variable),
    ("plans", ResourceType::Plan),
    ("applies", ResourceType::Apply),
    ("state-versions", ResourceType::StateVersion),
    ("state-version-outputs", ResourceType::StateVersion),
    ("cost-estimates", ResourceType::CostEstimate),
    ("assessment-results", ResourceType::Assessment),
    ("users", ResourceType::Account),
];

/// Names accepted for a resource type: canonical, singular and plural forms.
pub const RESOURCE_TYPE_MAP: &[(&str, ResourceType)] = &[
    ("workspace", ResourceType::Workspace),
    ("workspaces", ResourceType::Workspace),
    ("run", ResourceType::Run),
    ("runs", ResourceType::Run),
    ("organization", ResourceType::Organization),
    ("organizations", ResourceType::Organization),
    ("project", ResourceType::Project),
    ("projects", ResourceType::Project),
    ("variable", ResourceType::Variable),
    ("variables", ResourceType::Variable),
    ("var", ResourceType::Variable),
    ("vars", ResourceType::Variable),
    ("plan", ResourceType::Plan),
    ("plans", ResourceType::Plan),
    ("apply", ResourceType::Apply),
    ("applies", ResourceType::Apply),
    ("state-version", ResourceType::StateVersion),
    ("state-versions", ResourceType::StateVersion),
    ("cost-estimate", ResourceType::CostEstimate),
    ("cost-estimates", ResourceType::CostEstimate),
    ("assessment", ResourceType::Assessment),
    ("assessment-result", ResourceType::Assessment),
    ("assessment-results", ResourceType::Assessment),
    ("account", ResourceType::Account),
    ("user", ResourceType::Account),
    ("users", ResourceType::Account),
    ("generic", ResourceType::Generic),
];

/// Strip the query string and fragment from a request path.
pub(crate) fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// Classify a request by path, falling back to the document's declared `type`.
#[must_use]
pub fn classify_resource(path: &str, payload: &Value) -> ResourceType {
    if let Some(rt) = classify_path(path) {
        return rt;
    }
    declared_type(payload)
        .and_then(classify_type_tag)
        .unwrap_or(ResourceType::Generic)
}

/// Path-only classification; `None` if no pattern matches.
#[must_use]
pub fn classify_path(path: &str) -> Option<ResourceType> {
    let path = strip_query(path);
    let normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    PATH_PATTERNS
        .iter()
        .find(|(pattern, _)| contains_on_boundary(&normalized, pattern))
        .map(|(_, rt)| *rt)
}

fn contains_on_boundary(path: &str, pattern: &str) -> bool {
    path.match_indices(pattern).any(|(idx, _)| {
        let rest = &path[idx + pattern.len()..];
        rest.is_empty() || rest.starts_with('/')
    })
}

/// Resolve a JSON:API `type` tag (`"workspaces"`) or resource type name (`"workspace"`).
#[must_use]
pub fn classify_type_tag(tag: &str) -> Option<ResourceType> {
    DATA_TYPE_MAP
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, rt)| *rt)
        .or_else(|| ResourceType::from_name(tag))
}

/// The `type` of `data` (object) or of `data[0]` (array).
fn declared_type(payload: &Value) -> Option<&str> {
    let data = payload.get("data")?;
    let item = match data {
        Value::Array(items) => items.first()?,
        Value::Object(_) => data,
        _ => return None,
    };
    item.get("type").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_patterns_resolve_top_level_collections() {
        let empty = json!({});
        assert_eq!(
            classify_resource("/organizations/acme/workspaces", &empty),
            ResourceType::Workspace
        );
        assert_eq!(
            classify_resource("workspaces/ws-abc123", &empty),
            ResourceType::Workspace
        );
        assert_eq!(
            classify_resource("/organizations/acme", &empty),
            ResourceType::Organization
        );
        assert_eq!(
            classify_resource("/account/details", &empty),
            ResourceType::Account
        );
        assert_eq!(
            classify_resource("/organizations/acme/projects", &empty),
            ResourceType::Project
        );
    }

    #[test]
    fn nested_sub_collections_win_over_parents() {
        let empty = json!({});
        assert_eq!(
            classify_resource("/workspaces/ws-1/runs", &empty),
            ResourceType::Run
        );
        assert_eq!(
            classify_resource("/workspaces/ws-1/vars", &empty),
            ResourceType::Variable
        );
        assert_eq!(
            classify_resource("/runs/run-1/plan", &empty),
            ResourceType::Plan
        );
        assert_eq!(
            classify_resource("/runs/run-1/cost-estimate", &empty),
            ResourceType::CostEstimate
        );
        assert_eq!(
            classify_resource("/workspaces/ws-1/current-state-version", &empty),
            ResourceType::StateVersion
        );
        assert_eq!(
            classify_resource("/state-versions/sv-1/outputs", &empty),
            ResourceType::StateVersion
        );
        assert_eq!(
            classify_resource("/workspaces/ws-1/current-assessment-result", &empty),
            ResourceType::Assessment
        );
    }

    #[test]
    fn patterns_only_match_whole_segments() {
        assert_eq!(
            classify_path("/organizations/planet-corp"),
            Some(ResourceType::Organization)
        );
        assert_eq!(classify_path("/varsets/varset-1"), None);
        assert_eq!(classify_path("/plans/plan-1"), Some(ResourceType::Plan));
    }

    #[test]
    fn query_string_is_ignored() {
        assert_eq!(classify_path("/runs?filter[status]=planned"), Some(ResourceType::Run));
        assert_eq!(classify_path("/things?include=workspaces"), None);
    }

    #[test]
    fn falls_back_to_declared_type() {
        let single = json!({ "data": { "id": "x", "type": "projects", "attributes": {} } });
        assert_eq!(classify_resource("/unknown/x", &single), ResourceType::Project);

        let list = json!({ "data": [ { "id": "x", "type": "vars" } ] });
        assert_eq!(classify_resource("/unknown", &list), ResourceType::Variable);

        let named = json!({ "data": { "type": "assessment-result" } });
        assert_eq!(classify_resource("/unknown", &named), ResourceType::Assessment);
    }

    #[test]
    fn unknown_inputs_are_generic() {
        assert_eq!(classify_resource("/ping", &json!({})), ResourceType::Generic);
        assert_eq!(
            classify_resource("/ping", &json!({ "data": [] })),
            ResourceType::Generic
        );
        assert_eq!(
            classify_resource("/ping", &json!({ "data": "scalar" })),
            ResourceType::Generic
        );
        assert_eq!(
            classify_resource("/ping", &json!({ "data": { "type": "agent-pools" } })),
            ResourceType::Generic
        );
        assert_eq!(classify_resource("", &Value::Null), ResourceType::Generic);
    }

    #[test]
    fn names_round_trip_and_accept_aliases() {
        for rt in ResourceType::ALL {
            assert_eq!(rt.as_str().parse::<ResourceType>().unwrap(), rt);
        }
        assert_eq!(
            "State-Versions".parse::<ResourceType>().unwrap(),
            ResourceType::StateVersion
        );
        assert_eq!("users".parse::<ResourceType>().unwrap(), ResourceType::Account);
        assert!("agent-pools".parse::<ResourceType>().is_err());
        assert_eq!(
            ResourceType::from_name_or_generic("agent-pools"),
            ResourceType::Generic
        );
    }

    #[test]
    fn serde_uses_canonical_names() {
        let v = serde_json::to_value(ResourceType::CostEstimate).unwrap();
        assert_eq!(v, json!("cost-estimate"));
        let rt: ResourceType = serde_json::from_value(json!("assessment-results")).unwrap();
        assert_eq!(rt, ResourceType::Assessment);
    }
}
