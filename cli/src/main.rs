//! ruta CLI: driving adapter for the ruta URL router.
//!
//! Subcommands:
//! - `check <config>`: validate a config and compile every rule
//! - `rules <config>`: print the compiled rule table
//! - `parse <config> <uri> [--path P] [--script-name S] [--json]`: match a request
//! - `build <config> <group> [-p name=value...]`: create a URL
//! - `trace <config> <path>`: show every rule tried while matching
//!
//! Logs go to stderr. The filter comes from `--log` or `RUST_LOG` and
//! defaults to `warn`.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use ruta::prelude::*;
use serde_json::{json, Map, Value};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ruta", version, about = "Inspect and exercise ruta route tables")]
struct Cli {
    /// Log filter, e.g. `ruta=trace` (overrides RUST_LOG)
    #[arg(long, global = true, value_name = "FILTER")]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a config and compile every rule
    Check {
        /// Router config (.yaml, .yml or .json)
        config: PathBuf,
    },
    /// Print the compiled rule table
    Rules {
        /// Router config (.yaml, .yml or .json)
        config: PathBuf,
    },
    /// Match a request URI against the rule table
    Parse {
        /// Router config (.yaml, .yml or .json)
        config: PathBuf,
        /// Request URI, e.g. `/index.php?u=product/7`
        uri: String,
        /// Match this path instead of the one derived from the URI
        #[arg(long)]
        path: Option<String>,
        /// Front script path, for pathinfo mode
        #[arg(long, default_value = "")]
        script_name: String,
        /// Print the match as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a URL for a path group
    Build {
        /// Router config (.yaml, .yml or .json)
        config: PathBuf,
        /// Path group, e.g. `product/view`
        group: String,
        /// Parameters: `name=value`, `name[]=item` or `name[key]=value`
        #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,
    },
    /// Show every rule tried while matching a path
    Trace {
        /// Router config (.yaml, .yml or .json)
        config: PathBuf,
        /// Path to match, without base path
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    match run(cli.command) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<String, String> {
    match command {
        Command::Check { config } => cmd_check(&load_router(&config)?),
        Command::Rules { config } => cmd_rules(&load_router(&config)?),
        Command::Parse {
            config,
            uri,
            path,
            script_name,
            json,
        } => {
            let request = Request::new(uri).with_script_name(script_name);
            cmd_parse(&load_router(&config)?, &request, path.as_deref(), json)
        }
        Command::Build {
            config,
            group,
            params,
        } => cmd_build(&load_router(&config)?, &group, &parse_params(&params)?),
        Command::Trace { config, path } => cmd_trace(&load_router(&config)?, &path),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_check(router: &Router) -> Result<String, String> {
    let groups = router.table().compile().map_err(|e| e.to_string())?;
    let rules: usize = groups.iter().map(|g| g.rules().len()).sum();
    Ok(format!(
        "Config valid: {} groups, {rules} rules\n",
        groups.len()
    ))
}

fn cmd_rules(router: &Router) -> Result<String, String> {
    let groups = router.table().compile().map_err(|e| e.to_string())?;
    let mut out = String::new();
    for group in groups {
        out.push_str(group.name());
        out.push('\n');
        for (index, rule) in group.rules().iter().enumerate() {
            out.push_str(&format!("  #{index} {}\n", rule.rule()));
            out.push_str(&format!("      template: {}\n", rule.url_template()));
            out.push_str(&format!("      pattern:  {}\n", rule.pattern().as_str()));
        }
    }
    Ok(out)
}

fn cmd_parse(
    router: &Router,
    request: &Request,
    path: Option<&str>,
    as_json: bool,
) -> Result<String, String> {
    let found = router.parse(path, request).map_err(|e| e.to_string())?;

    if as_json {
        let value = found.as_ref().map_or(Value::Null, match_to_json);
        return serde_json::to_string_pretty(&value)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string());
    }

    let Some(found) = found else {
        return Ok("(no match)\n".to_owned());
    };
    let mut out = format!("group: {}\nrule:  #{}\n", found.group, found.rule_index);
    for (name, value) in &found.params {
        out.push_str(&format!("  {name} = {value}\n"));
    }
    Ok(out)
}

fn cmd_build(router: &Router, group: &str, params: &Params) -> Result<String, String> {
    router
        .create_url(group, params)
        .map(|url| url + "\n")
        .map_err(|e| e.to_string())
}

fn cmd_trace(router: &Router, path: &str) -> Result<String, String> {
    let trace = router
        .table()
        .trace(
            path.trim_start_matches('/'),
            &Params::new(),
            &router.settings().path_identifiers,
        )
        .map_err(|e| e.to_string())?;

    let mut out = String::new();
    for step in &trace.steps {
        out.push_str(&format!("{step}\n"));
    }
    match &trace.result {
        Some(found) => out.push_str(&format!("=> {} #{}\n", found.group, found.rule_index)),
        None => out.push_str("=> (no match)\n"),
    }
    Ok(out)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_router(path: &Path) -> Result<Router, String> {
    tracing::debug!(path = %path.display(), "loading router config");
    let config = ruta::load_config(path).map_err(|e| e.to_string())?;
    Router::from_config(&config).map_err(|e| format!("config invalid: {e}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

/// `name=value` is a scalar, `name[]=item` appends to an array and
/// `name[key]=value` adds a pair.
fn parse_params(args: &[String]) -> Result<Params, String> {
    let mut params = Params::new();

    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| format!("invalid parameter \"{arg}\", expected name=value"))?;
        let value = value.to_owned();

        match key.strip_suffix(']').and_then(|k| k.split_once('[')) {
            Some(("", _)) => return Err(format!("invalid parameter \"{arg}\", missing name")),
            Some((name, "")) => {
                let mut items = params.get_array(name).map(<[String]>::to_vec).unwrap_or_default();
                items.push(value);
                params.insert(name, items);
            }
            Some((name, pair_key)) => {
                let mut pairs = match params.get(name) {
                    Some(ParameterValue::Pairs(pairs)) => pairs.clone(),
                    _ => Vec::new(),
                };
                pairs.push((pair_key.to_owned(), value));
                params.insert(name, pairs);
            }
            None if key.is_empty() => {
                return Err(format!("invalid parameter \"{arg}\", missing name"));
            }
            None => {
                params.insert(key, value);
            }
        }
    }

    Ok(params)
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON output
// ═══════════════════════════════════════════════════════════════════════════════

fn match_to_json(found: &RequestMatch) -> Value {
    let params: Map<String, Value> = found
        .params
        .iter()
        .map(|(name, value)| (name.clone(), value_to_json(value)))
        .collect();
    json!({
        "group": found.group,
        "rule_index": found.rule_index,
        "params": params,
    })
}

fn value_to_json(value: &ParameterValue) -> Value {
    match value {
        ParameterValue::Scalar(s) => Value::String(s.clone()),
        ParameterValue::Array(items) => items.iter().cloned().map(Value::String).collect(),
        ParameterValue::Pairs(pairs) => Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        ),
        ParameterValue::Missing => Value::Null,
    }
}
