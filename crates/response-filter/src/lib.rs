//! Audit-safe response filtering for Terraform Cloud API documents.
//!
//! Given a decoded JSON:API response, its request path and HTTP method, the filter decides which
//! attribute keys are safe to strip to reduce payload size. Fields needed for audit, security and
//! operational decisions are never removed, and any anomaly fails open (the document comes back
//! unchanged).
//!
//! This crate intentionally contains **no** HTTP transport and **no** tool-level business logic;
//! callers hand it a parsed document and get a filtered document back.

pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod operation;
pub mod registry;
pub mod resource;
pub mod walker;

pub use config::{FilterOverrides, FilterSettings, ResourceOverride};
pub use engine::{FilterOutcome, FilterRequest, ResponseFilter, filter, filter_with_request};
pub use error::{FilterError, Result};
pub use gate::should_bypass;
pub use operation::{OperationType, classify_operation};
pub use registry::{
    ATTRIBUTION_RELATIONSHIPS, AUDIT_CRITICAL_FIELDS, FilterConfig, FilterRegistry, lookup,
};
pub use resource::{ResourceType, classify_resource};
