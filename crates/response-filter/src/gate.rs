//! Override gate: decides whether filtering is skipped for a call.

use std::sync::LazyLock;

/// Environment switch that disables filtering process-wide.
pub const DISABLE_FILTERING_ENV: &str = "TFC_DISABLE_RESPONSE_FILTERING";

/// Truthy env parsing: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

static PROCESS_DISABLED: LazyLock<bool> = LazyLock::new(|| env_flag(DISABLE_FILTERING_ENV));

/// Whether the environment disabled filtering. Read once per process.
#[must_use]
pub fn process_filtering_disabled() -> bool {
    *PROCESS_DISABLED
}

/// `true` if either the process-wide switch or the per-call raw flag is set.
#[must_use]
pub fn should_bypass(env_flag: bool, per_call_flag: bool) -> bool {
    env_flag || per_call_flag
}
