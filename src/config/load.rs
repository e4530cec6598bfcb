//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies the `BROKER_IDENTITY_*` env overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::address::DnsTemplate;
use crate::cluster_id;
use crate::error::AppError;
use crate::quorum::{NodeRoles, QuorumVoter, QuorumVoterSet, Role};

use super::raw::{RawConfig, RawVoters};
use super::types::*;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Values taken from the process environment, applied over the file.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub data_dir: Option<String>,
    pub log_level: Option<String>,
    pub cluster_id: Option<String>,
    /// Kafka voter syntax, replaces `[quorum] voters` entirely.
    pub quorum_voters: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var("BROKER_IDENTITY_DATA_DIR").ok(),
            log_level: env::var("BROKER_IDENTITY_LOG_LEVEL").ok(),
            cluster_id: env::var("BROKER_IDENTITY_CLUSTER_ID").ok(),
            quorum_voters: env::var("BROKER_IDENTITY_QUORUM_VOTERS").ok(),
        }
    }
}

/// Deep-merge two TOML values.
/// Tables are merged recursively — the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and the default file does not exist, the config is
/// built from defaults and env overrides alone.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = EnvOverrides::from_env();

    if let Some(path) = config_path {
        return load_from(Path::new(path), &overrides);
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        load_from(default_path, &overrides)
    } else {
        resolve(RawConfig::default(), &overrides, "built-in defaults")
    }
}

/// Internal loader — accepts an explicit path and overrides.
/// Tests pass overrides directly instead of mutating env vars.
/// Follows `[meta] base = "..."` inheritance chains before resolving.
pub fn load_from(path: &Path, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(
        |e: toml::de::Error| AppError::Config(format!("config error in {}: {e}", path.display())),
    )?;

    resolve(parsed, overrides, &path.display().to_string())
}

/// Turn raw values plus overrides into a validated [`Config`].
fn resolve(parsed: RawConfig, overrides: &EnvOverrides, source: &str) -> Result<Config, AppError> {
    let r = parsed.resolver;

    let data_dir_str = overrides.data_dir.as_deref().unwrap_or(&r.data_dir);
    let data_dir = expand_home(data_dir_str);
    let log_level = overrides.log_level.clone().unwrap_or(r.log_level);
    crate::logger::parse_level(&log_level)
        .map_err(|e| AppError::Config(format!("resolver.log_level ({source}): {e}")))?;
    let log_file = r.log_file.as_deref().map(expand_home);

    if r.identity_file.is_empty()
        || r.identity_file.contains(['/', '\\'])
        || r.identity_file == "."
        || r.identity_file == ".."
    {
        return Err(AppError::Config(format!(
            "resolver.identity_file {:?} must be a plain file name",
            r.identity_file
        )));
    }

    let cluster_id = overrides
        .cluster_id
        .clone()
        .or(parsed.cluster.cluster_id)
        .ok_or_else(|| {
            AppError::Config(format!(
                "cluster.cluster_id is required ({source}, or BROKER_IDENTITY_CLUSTER_ID)"
            ))
        })?;
    cluster_id::validate(&cluster_id)?;

    let template_str = parsed
        .listener
        .dns_template
        .ok_or_else(|| AppError::Config(format!("listener.dns_template is required ({source})")))?;
    let dns_template = DnsTemplate::parse(&template_str)?;
    if parsed.listener.port == 0 {
        return Err(AppError::Config("listener.port must not be 0".into()));
    }
    if parsed.listener.name.is_empty() || parsed.listener.name.contains(char::is_whitespace) {
        return Err(AppError::Config(format!(
            "listener.name {:?} must be a non-empty word",
            parsed.listener.name
        )));
    }

    let roles = NodeRoles::from_roles(
        parsed
            .node
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?,
    )?;

    let voters = match (&overrides.quorum_voters, parsed.quorum.voters) {
        (Some(env_voters), _) => env_voters.parse::<QuorumVoterSet>()?,
        (None, RawVoters::Kafka(s)) => s.parse::<QuorumVoterSet>()?,
        (None, RawVoters::List(list)) => QuorumVoterSet::new(
            list.into_iter()
                .map(|v| QuorumVoter {
                    node_id: v.node_id,
                    host: v.host,
                    port: v.port,
                })
                .collect(),
        )?,
    };

    let launch = resolve_launch(parsed.launch)?;

    Ok(Config {
        data_dir,
        identity_file: r.identity_file,
        log_level,
        log_file,
        cluster_id,
        listener: ListenerConfig {
            name: parsed.listener.name,
            dns_template,
            port: parsed.listener.port,
        },
        roles,
        voters,
        launch,
    })
}

fn resolve_launch(raw: super::raw::RawLaunch) -> Result<LaunchConfig, AppError> {
    let mode = match raw.mode.as_str() {
        "exec" => LaunchMode::Exec,
        "env-file" | "env_file" => LaunchMode::EnvFile,
        "print" => LaunchMode::Print,
        other => {
            return Err(AppError::Config(format!(
                "launch.mode '{other}' is not one of: exec, env-file, print"
            )));
        }
    };

    if !raw
        .env_prefix
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(AppError::Config(format!(
            "launch.env_prefix {:?} may only contain A-Z, 0-9 and '_'",
            raw.env_prefix
        )));
    }

    Ok(LaunchConfig {
        mode,
        command: raw.command,
        env_file: raw.env_file.as_deref().map(expand_home),
        env_prefix: raw.env_prefix,
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
