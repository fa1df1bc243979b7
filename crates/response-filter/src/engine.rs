//! Filter engine: classify, look up rules, prune a copy.
//!
//! Filtering is an optimization. Every anomaly fails open: the caller gets the document back
//! exactly as it came in, and the anomaly is logged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

use crate::config::FilterSettings;
use crate::gate::{process_filtering_disabled, should_bypass};
use crate::operation::{OperationType, classify_operation};
use crate::registry::{FilterRegistry, is_audit_critical};
use crate::resource::{ResourceType, classify_resource, classify_type_tag, strip_query};
use crate::walker::{Section, check_document, for_each_resource_mut, prune_member, type_tag};

/// Path segments whose responses are raw content (logs, state files, plan exports), not
/// JSON:API resources.
pub const RAW_CONTENT_SEGMENTS: &[&str] = &[
    "log",
    "logs",
    "download",
    "json-output",
    "json-output-redacted",
    "content",
    "json-state",
];

/// `true` if the path addresses a raw-content endpoint. Only the final segment counts, so an
/// organization or workspace named `content` is still filtered.
#[must_use]
pub fn is_raw_content_path(path: &str) -> bool {
    strip_query(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .is_some_and(|last| {
            RAW_CONTENT_SEGMENTS
                .iter()
                .any(|raw| raw.eq_ignore_ascii_case(last))
        })
}

/// Explicit filtering parameters, bypassing path classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub resource_type: ResourceType,
    #[serde(default = "default_operation")]
    pub operation_type: OperationType,
    /// Extra attribute keys to remove beyond the configured rules.
    #[serde(default)]
    pub custom_fields: BTreeSet<String>,
    /// Attribute keys that are never removed, even if configured or requested.
    #[serde(default)]
    pub preserve_fields: BTreeSet<String>,
}

fn default_operation() -> OperationType {
    OperationType::Read
}

impl FilterRequest {
    #[must_use]
    pub fn new(resource_type: ResourceType, operation_type: OperationType) -> Self {
        Self {
            resource_type,
            operation_type,
            custom_fields: BTreeSet::new(),
            preserve_fields: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn remove<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn preserve<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preserve_fields
            .extend(fields.into_iter().map(Into::into));
        self
    }
}

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The override gate was active.
    Bypassed,
    /// Non-`GET` request; manage responses keep full context.
    Manage { resource_type: ResourceType },
    /// Raw-content endpoint; not a JSON:API resource document.
    RawContent,
    /// The document was walked and `removed` keys were dropped.
    Filtered {
        resource_type: ResourceType,
        operation_type: OperationType,
        removed: usize,
    },
    /// The document had an unexpected shape and was left unchanged.
    FailedOpen,
}

struct RemovalPlan<'a> {
    attributes: BTreeSet<&'a str>,
    essential_relationships: Option<&'a BTreeSet<String>>,
}

impl RemovalPlan<'_> {
    fn apply(&self, resource: &mut Map<String, Value>) -> usize {
        let mut removed = prune_member(resource, "attributes", |k| self.attributes.contains(k));
        if let Some(keep) = self.essential_relationships {
            removed += prune_member(resource, "relationships", |k| !keep.contains(k));
        }
        removed
    }
}

/// The filter engine. Immutable and cheap to clone; share it across tasks.
#[derive(Debug, Clone)]
pub struct ResponseFilter {
    registry: Arc<FilterRegistry>,
    settings: FilterSettings,
}

impl Default for ResponseFilter {
    fn default() -> Self {
        Self::new(FilterRegistry::builtin(), FilterSettings::default())
    }
}

impl ResponseFilter {
    #[must_use]
    pub fn new(registry: Arc<FilterRegistry>, settings: FilterSettings) -> Self {
        Self { registry, settings }
    }

    /// Built-in rules with settings read from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(FilterRegistry::builtin(), FilterSettings::from_env())
    }

    #[must_use]
    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    #[must_use]
    pub fn settings(&self) -> FilterSettings {
        self.settings
    }

    /// Return a filtered copy of `raw`. `raw` itself is never modified.
    ///
    /// `bypass` is the per-call raw-mode flag.
    #[must_use]
    pub fn filter(&self, raw: &Value, path: &str, method: &str, bypass: bool) -> Value {
        let mut doc = raw.clone();
        self.filter_in_place(&mut doc, path, method, bypass);
        doc
    }

    /// Filter `doc` in place. On any anomaly `doc` is left untouched.
    pub fn filter_in_place(
        &self,
        doc: &mut Value,
        path: &str,
        method: &str,
        bypass: bool,
    ) -> FilterOutcome {
        if should_bypass(self.settings.disabled, bypass) {
            debug!(path, method, "response filtering bypassed");
            return FilterOutcome::Bypassed;
        }

        let resource_type = classify_resource(path, doc);
        let operation_type = classify_operation(path, method);
        if operation_type == OperationType::Manage {
            return FilterOutcome::Manage { resource_type };
        }
        if is_raw_content_path(path) {
            debug!(path, "raw content endpoint; not filtering");
            return FilterOutcome::RawContent;
        }

        self.apply(doc, resource_type, operation_type, None, path, method)
    }

    /// Return a copy of `raw` filtered with explicit request parameters.
    #[must_use]
    pub fn filter_with_request(&self, raw: &Value, request: &FilterRequest, bypass: bool) -> Value {
        let mut doc = raw.clone();
        self.filter_with_request_in_place(&mut doc, request, bypass);
        doc
    }

    pub fn filter_with_request_in_place(
        &self,
        doc: &mut Value,
        request: &FilterRequest,
        bypass: bool,
    ) -> FilterOutcome {
        if should_bypass(self.settings.disabled, bypass) {
            debug!(resource_type = %request.resource_type, "response filtering bypassed");
            return FilterOutcome::Bypassed;
        }
        if request.operation_type == OperationType::Manage {
            return FilterOutcome::Manage {
                resource_type: request.resource_type,
            };
        }
        for field in &request.custom_fields {
            if field.trim().is_empty() {
                warn!("ignoring empty custom field name");
            } else if is_audit_critical(field.trim()) {
                warn!(field = %field, "ignoring request to remove audit-critical field");
            }
        }

        self.apply(
            doc,
            request.resource_type,
            request.operation_type,
            Some(request),
            "",
            "",
        )
    }

    fn apply(
        &self,
        doc: &mut Value,
        resource_type: ResourceType,
        operation_type: OperationType,
        request: Option<&FilterRequest>,
        path: &str,
        method: &str,
    ) -> FilterOutcome {
        if let Err(e) = check_document(doc) {
            warn!(
                path,
                method,
                resource_type = %resource_type,
                error = %e,
                "response not filtered; returning it unchanged"
            );
            return FilterOutcome::FailedOpen;
        }

        let primary = self.plan(resource_type, operation_type, request);
        let mut included: HashMap<ResourceType, RemovalPlan<'_>> = HashMap::new();
        let mut removed = 0;

        for_each_resource_mut(doc, |section, resource| {
            let plan = match section {
                Section::Data => &primary,
                Section::Included => {
                    let rt = type_tag(resource)
                        .and_then(classify_type_tag)
                        .unwrap_or(ResourceType::Generic);
                    &*included
                        .entry(rt)
                        .or_insert_with(|| self.plan(rt, operation_type, request))
                }
            };
            removed += plan.apply(resource);
        });

        debug!(
            resource_type = %resource_type,
            operation_type = %operation_type,
            removed,
            "response filtered"
        );
        FilterOutcome::Filtered {
            resource_type,
            operation_type,
            removed,
        }
    }

    fn plan<'a>(
        &'a self,
        resource_type: ResourceType,
        operation_type: OperationType,
        request: Option<&'a FilterRequest>,
    ) -> RemovalPlan<'a> {
        let config = self.registry.lookup(resource_type);
        let mut attributes = config.removal_set(operation_type);
        if let Some(request) = request {
            attributes.extend(
                request
                    .custom_fields
                    .iter()
                    .map(|f| f.trim())
                    .filter(|f| !f.is_empty() && !is_audit_critical(f)),
            );
            for field in &request.preserve_fields {
                attributes.remove(field.trim());
            }
        }
        RemovalPlan {
            attributes,
            essential_relationships: config.essential_relationships.as_ref(),
        }
    }
}

static PROCESS_FILTER: LazyLock<ResponseFilter> = LazyLock::new(|| {
    ResponseFilter::new(
        FilterRegistry::builtin(),
        FilterSettings {
            disabled: process_filtering_disabled(),
        },
    )
});

/// Filter with the built-in rules and the process-wide override gate.
///
/// Returns a new document; `raw` is left intact for callers that still need it.
#[must_use]
pub fn filter(raw: &Value, path: &str, method: &str, bypass: bool) -> Value {
    PROCESS_FILTER.filter(raw, path, method, bypass)
}

/// [`ResponseFilter::filter_with_request`] with the built-in rules and process-wide gate.
#[must_use]
pub fn filter_with_request(raw: &Value, request: &FilterRequest, bypass: bool) -> Value {
    PROCESS_FILTER.filter_with_request(raw, request, bypass)
}
