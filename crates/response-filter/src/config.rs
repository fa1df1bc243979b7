//! Filtering settings: the process environment switch and YAML/JSON override files.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{FilterError, Result};
use crate::gate::{DISABLE_FILTERING_ENV, env_flag};
use crate::resource::ResourceType;

/// Process-level filtering settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSettings {
    /// Disable filtering for every call (debugging switch).
    #[serde(default)]
    pub disabled: bool,
}

impl FilterSettings {
    /// Read settings from the environment.
    ///
    /// Env:
    /// - `TFC_DISABLE_RESPONSE_FILTERING=1` passes every response through unchanged.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            disabled: env_flag(DISABLE_FILTERING_ENV),
        }
    }
}

/// Override file contents (YAML or JSON).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOverrides {
    /// Disable filtering regardless of the environment.
    #[serde(default)]
    pub disabled: bool,

    /// Per-resource-type extensions of the built-in rules. Two aliases of the same type
    /// (`workspace` and `workspaces`) are rejected.
    #[serde(default, deserialize_with = "unique_resources")]
    pub resources: BTreeMap<ResourceType, ResourceOverride>,
}

fn unique_resources<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<ResourceType, ResourceOverride>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ResourcesVisitor;

    impl<'de> Visitor<'de> for ResourcesVisitor {
        type Value = BTreeMap<ResourceType, ResourceOverride>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of resource type to override")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = BTreeMap::new();
            while let Some((rt, o)) = map.next_entry::<ResourceType, ResourceOverride>()? {
                if out.insert(rt, o).is_some() {
                    return Err(serde::de::Error::custom(format!(
                        "resource type '{rt}' is configured more than once"
                    )));
                }
            }
            Ok(out)
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(BTreeMap::new())
        }
    }

    deserializer.deserialize_map(ResourcesVisitor)
}

/// Additional removals for one resource type.
///
/// Removal lists are unioned with the built-in sets; `essentialRelationships` replaces the
/// built-in list when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOverride {
    #[serde(default)]
    pub always_remove: Vec<String>,
    #[serde(default)]
    pub read_remove: Vec<String>,
    #[serde(default)]
    pub list_remove: Vec<String>,
    #[serde(default)]
    pub essential_relationships: Option<Vec<String>>,
}

impl FilterOverrides {
    /// Parse overrides from YAML (JSON is accepted as a YAML subset).
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid YAML/JSON or names an unknown resource type.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Load overrides from a `.yaml`, `.yml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| FilterError::OverridesReadFile {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Self::from_yaml_str(&raw)
        }
    }

    /// Combine file settings with the process settings. Either side can disable filtering.
    #[must_use]
    pub fn settings(&self, env: FilterSettings) -> FilterSettings {
        FilterSettings {
            disabled: env.disabled || self.disabled,
        }
    }
}
