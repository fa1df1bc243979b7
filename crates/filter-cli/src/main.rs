mod config;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use serde_json::{Map, Value};
use std::io::{Read as _, Write as _};
use std::path::PathBuf;
use std::sync::Arc;
use tfc_response_filter::walker::count_keys;
use tfc_response_filter::{FilterOutcome, FilterRegistry, FilterSettings, ResponseFilter};
use tracing_subscriber::EnvFilter;

/// Filter a Terraform Cloud API response the way the MCP tools do.
#[derive(Parser, Debug)]
#[command(name = "tfc-filter", version, about, long_about = None)]
struct Args {
    /// Request path the response came from, e.g. `/organizations/acme/workspaces`.
    #[arg(long, env = "TFC_FILTER_PATH", required_unless_present = "show_config")]
    path: Option<String>,

    /// HTTP method of the request.
    #[arg(long, env = "TFC_FILTER_METHOD", default_value = "GET")]
    method: String,

    /// Response document to read (stdin when omitted).
    #[arg(long, env = "TFC_FILTER_INPUT")]
    input: Option<PathBuf>,

    /// Return the document unfiltered.
    #[arg(long, env = "TFC_FILTER_RAW")]
    raw: bool,

    /// Override file (YAML or JSON). Defaults to `$XDG_CONFIG_HOME/tfc-filter/overrides.yaml`.
    #[arg(long, env = "TFC_FILTER_OVERRIDES")]
    overrides: Option<PathBuf>,

    /// Log level for stderr output.
    #[arg(long, env = "TFC_FILTER_LOG_LEVEL", value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,

    /// Print the effective filter rules and exit.
    #[arg(long)]
    show_config: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn setup_logging(level: LogLevel) {
    // RUST_LOG wins over --log-level.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.log_level);

    let overrides = config::load_overrides(args.overrides.as_deref())?;
    let env = FilterSettings::from_env();
    let (registry, settings) = match &overrides {
        Some(o) => (
            Arc::new(FilterRegistry::with_overrides(o).context("invalid overrides")?),
            o.settings(env),
        ),
        None => (FilterRegistry::builtin(), env),
    };
    let filter = ResponseFilter::new(registry, settings);

    if args.show_config {
        return write_output(&effective_rules(filter.registry()), args.pretty);
    }

    // Guaranteed by `required_unless_present`.
    let path = args.path.as_deref().context("--path is required")?;
    let mut doc = read_input(args.input.as_deref())?;

    let before = count_keys(&doc);
    let outcome = filter.filter_in_place(&mut doc, path, &args.method, args.raw);
    let after = count_keys(&doc);
    match outcome {
        FilterOutcome::Filtered {
            resource_type,
            operation_type,
            removed,
        } => tracing::info!(
            %resource_type,
            %operation_type,
            removed,
            keys_before = before,
            keys_after = after,
            "filtered response"
        ),
        other => tracing::info!(outcome = ?other, keys = before, "response left unchanged"),
    }

    write_output(&doc, args.pretty)
}

fn read_input(path: Option<&std::path::Path>) -> anyhow::Result<Value> {
    let raw = match path {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("input is not valid JSON")
}

fn effective_rules(registry: &FilterRegistry) -> Value {
    let mut out = Map::new();
    for (rt, config) in registry.iter() {
        let value = serde_json::to_value(config).unwrap_or(Value::Null);
        out.insert(rt.as_str().to_string(), value);
    }
    Value::Object(out)
}

fn write_output(value: &Value, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("serialize output")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}").context("write stdout")?;
    Ok(())
}
