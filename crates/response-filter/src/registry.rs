//! Filter configuration registry.
//!
//! The built-in registry is constructed once per process and is immutable afterwards, so it can
//! be shared freely across threads and tasks. Override files can extend it at startup
//! (see [`FilterRegistry::with_overrides`]); the result is again immutable.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, LazyLock};

use crate::config::{FilterOverrides, ResourceOverride};
use crate::error::{FilterError, Result};
use crate::operation::OperationType;
use crate::resource::ResourceType;

/// Attribute names that must never be stripped, for any resource type.
///
/// These carry creation/update timing, permission blocks, version identifiers and actor
/// attribution, which audits and operational decisions depend on.
pub const AUDIT_CRITICAL_FIELDS: &[&str] = &[
    "created-at",
    "updated-at",
    "permissions",
    "version-id",
    "created-by",
    "updated-by",
    "status-timestamps",
    "source",
    "actions",
    "is-sudo",
    "is-site-admin",
    "auth-method",
    "two-factor-conformant",
    "saml-enabled",
    "trial-expires-at",
];

#[must_use]
pub fn is_audit_critical(field: &str) -> bool {
    AUDIT_CRITICAL_FIELDS.contains(&field)
}

/// Relationships that attribute a resource to a user. Every essential-relationship set keeps them.
pub const ATTRIBUTION_RELATIONSHIPS: &[&str] = &[
    "created-by",
    "updated-by",
    "confirmed-by",
    "canceled-by",
    "discarded-by",
    "locked-by",
];

fn with_attribution(names: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    names
        .into_iter()
        .chain(ATTRIBUTION_RELATIONSHIPS.iter().map(|s| (*s).to_string()))
        .collect()
}

/// Removal rules for one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Attribute keys removed for every filtered operation.
    #[serde(default)]
    pub always_remove: BTreeSet<String>,
    /// Attribute keys removed only for [`OperationType::Read`].
    #[serde(default)]
    pub read_remove: BTreeSet<String>,
    /// Attribute keys removed only for [`OperationType::List`].
    #[serde(default)]
    pub list_remove: BTreeSet<String>,
    /// If set, the only relationship keys retained. `None` leaves relationships untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essential_relationships: Option<BTreeSet<String>>,
}

impl FilterConfig {
    fn from_lists(
        always_remove: &[&str],
        read_remove: &[&str],
        list_remove: &[&str],
        essential_relationships: Option<&[&str]>,
    ) -> Self {
        let set = |names: &[&str]| names.iter().map(|s| (*s).to_string()).collect();
        Self {
            always_remove: set(always_remove),
            read_remove: set(read_remove),
            list_remove: set(list_remove),
            essential_relationships: essential_relationships
                .map(|names| with_attribution(names.iter().map(|s| (*s).to_string()))),
        }
    }

    /// Attribute keys to strip for an operation. Empty for [`OperationType::Manage`].
    pub fn removal_set(&self, operation: OperationType) -> BTreeSet<&str> {
        let tiered = match operation {
            OperationType::Read => &self.read_remove,
            OperationType::List => &self.list_remove,
            OperationType::Manage => return BTreeSet::new(),
        };
        self.always_remove
            .iter()
            .chain(tiered)
            .map(String::as_str)
            .collect()
    }

    /// All removal sets, for validation.
    fn removal_fields(&self) -> impl Iterator<Item = &str> {
        self.always_remove
            .iter()
            .chain(&self.read_remove)
            .chain(&self.list_remove)
            .map(String::as_str)
    }

    fn validate(&self, resource_type: ResourceType) -> Result<()> {
        for field in self.removal_fields() {
            if field.trim().is_empty() {
                return Err(FilterError::Config(format!(
                    "{resource_type}: field names must be non-empty"
                )));
            }
            if is_audit_critical(field) {
                return Err(FilterError::Config(format!(
                    "{resource_type}: audit-critical field '{field}' cannot be removed"
                )));
            }
        }
        if let Some(rels) = &self.essential_relationships {
            if rels.iter().any(|r| r.trim().is_empty()) {
                return Err(FilterError::Config(format!(
                    "{resource_type}: relationship names must be non-empty"
                )));
            }
            if let Some(missing) = ATTRIBUTION_RELATIONSHIPS
                .iter()
                .find(|r| !rels.contains(**r))
            {
                return Err(FilterError::Config(format!(
                    "{resource_type}: attribution relationship '{missing}' must be retained"
                )));
            }
        }
        Ok(())
    }

    fn merge(&mut self, o: &ResourceOverride) {
        let extend = |set: &mut BTreeSet<String>, names: &[String]| {
            set.extend(names.iter().map(|s| s.trim().to_string()));
        };
        extend(&mut self.always_remove, &o.always_remove);
        extend(&mut self.read_remove, &o.read_remove);
        extend(&mut self.list_remove, &o.list_remove);
        if let Some(rels) = &o.essential_relationships {
            self.essential_relationships =
                Some(with_attribution(rels.iter().map(|s| s.trim().to_string())));
        }
    }
}

/// Conservative default: only statistical aggregates with no audit value.
fn default_config() -> FilterConfig {
    FilterConfig::from_lists(
        &[
            "apply-duration-average",
            "plan-duration-average",
            "workspace-kpis-runs-count",
        ],
        &[],
        &[],
        None,
    )
}

fn builtin_config(resource_type: ResourceType) -> FilterConfig {
    match resource_type {
        ResourceType::Workspace => FilterConfig::from_lists(
            &[
                "apply-duration-average",
                "plan-duration-average",
                "policy-check-failures",
                "run-failures",
            ],
            &[],
            &[
                "workspace-kpis-runs-count",
                "unarchived-workspace-change-requests-count",
            ],
            Some(&[
                "organization",
                "project",
                "current-run",
                "current-state-version",
                "current-configuration-version",
            ]),
        ),
        ResourceType::Run => FilterConfig::from_lists(
            &[],
            &[],
            &[],
            Some(&["workspace", "plan", "apply", "cost-estimate"]),
        ),
        ResourceType::Organization => FilterConfig::from_lists(
            &[
                "fair-run-queuing-enabled",
                "send-passing-statuses-for-untriggered-speculative-plans",
            ],
            &[],
            &[],
            None,
        ),
        ResourceType::Project => FilterConfig::from_lists(&[], &[], &[], Some(&["organization"])),
        ResourceType::Variable => FilterConfig::from_lists(&[], &[], &[], None),
        ResourceType::Plan => FilterConfig::from_lists(
            &[],
            &["resource-drift"],
            &["execution-details"],
            Some(&["run", "state-versions"]),
        ),
        ResourceType::Apply => FilterConfig::from_lists(
            &[],
            &[],
            &["execution-details"],
            Some(&["run", "state-versions"]),
        ),
        ResourceType::StateVersion => FilterConfig::from_lists(
            &["vcs-commit-sha", "vcs-commit-url"],
            &[],
            &[
                "hosted-state-download-url",
                "hosted-json-state-download-url",
                "hosted-state-upload-url",
            ],
            Some(&["workspace", "run", "outputs"]),
        ),
        ResourceType::CostEstimate => {
            FilterConfig::from_lists(&[], &[], &["resources-count"], Some(&["run"]))
        }
        ResourceType::Assessment => {
            FilterConfig::from_lists(&[], &[], &[], Some(&["workspace"]))
        }
        ResourceType::Account => {
            FilterConfig::from_lists(&["password", "avatar-url"], &[], &[], None)
        }
        ResourceType::Generic => default_config(),
    }
}

static BUILTIN: LazyLock<Arc<FilterRegistry>> =
    LazyLock::new(|| Arc::new(FilterRegistry::new()));

/// Immutable mapping from [`ResourceType`] to [`FilterConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRegistry {
    configs: BTreeMap<ResourceType, FilterConfig>,
    fallback: FilterConfig,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterRegistry {
    /// Build the registry from the built-in tables.
    #[must_use]
    pub fn new() -> Self {
        let configs = ResourceType::ALL
            .into_iter()
            .map(|rt| (rt, builtin_config(rt)))
            .collect();
        Self {
            configs,
            fallback: default_config(),
        }
    }

    /// The shared built-in registry.
    #[must_use]
    pub fn builtin() -> Arc<FilterRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// Built-in registry extended with configured overrides.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Config`] if an override names an empty field or tries to remove an
    /// audit-critical field.
    pub fn with_overrides(overrides: &FilterOverrides) -> Result<Self> {
        let mut registry = Self::new();
        for (rt, o) in &overrides.resources {
            let config = registry
                .configs
                .entry(*rt)
                .or_insert_with(default_config);
            config.merge(o);
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Look up the rules for a resource type, falling back to the conservative default.
    #[must_use]
    pub fn lookup(&self, resource_type: ResourceType) -> &FilterConfig {
        self.configs.get(&resource_type).unwrap_or(&self.fallback)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, &FilterConfig)> {
        self.configs.iter().map(|(rt, c)| (*rt, c))
    }

    /// Check every config against the audit-critical set.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        for (rt, config) in self.iter() {
            config.validate(rt)?;
        }
        self.fallback.validate(ResourceType::Generic)
    }
}

/// Look up a resource type in the built-in registry.
#[must_use]
pub fn lookup(resource_type: ResourceType) -> &'static FilterConfig {
    BUILTIN.lookup(resource_type)
}
