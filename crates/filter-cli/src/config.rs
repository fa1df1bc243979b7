use anyhow::Context as _;
use std::path::{Path, PathBuf};
use tfc_response_filter::FilterOverrides;

/// `$XDG_CONFIG_HOME/tfc-filter/overrides.yaml`, or `~/.config/...` when XDG is unset.
pub fn default_overrides_path() -> anyhow::Result<PathBuf> {
    let base = if let Ok(v) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(v)
    } else {
        let home = std::env::var("HOME").context("HOME is not set")?;
        PathBuf::from(home).join(".config")
    };
    Ok(base.join("tfc-filter").join("overrides.yaml"))
}

/// Load overrides from an explicit path, or from the default location if it exists.
///
/// An explicit path must exist; a missing default file means "no overrides".
pub fn load_overrides(explicit: Option<&Path>) -> anyhow::Result<Option<FilterOverrides>> {
    let (path, required) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => match default_overrides_path() {
            Ok(p) => (p, false),
            Err(e) => {
                tracing::debug!(error = %e, "no default overrides location");
                return Ok(None);
            }
        },
    };
    if !required && !path.exists() {
        return Ok(None);
    }
    let overrides = FilterOverrides::load(&path)
        .with_context(|| format!("load overrides {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        resources = overrides.resources.len(),
        "loaded overrides"
    );
    Ok(Some(overrides))
}
