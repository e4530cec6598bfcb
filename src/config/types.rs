//! Public configuration types.
//!
//! These are the resolved, validated structs the resolver and launcher
//! consume. Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;

use crate::address::DnsTemplate;
use crate::quorum::{NodeRoles, QuorumVoterSet};

// ── Listener ────────────────────────────────────────────────────────────────

/// The listener this node advertises to peers and clients.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Listener name / security protocol, e.g. `PLAINTEXT`.
    pub name: String,
    pub dns_template: DnsTemplate,
    pub port: u16,
}

// ── Launch ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Replace this process with the broker command.
    Exec,
    /// Write `export` lines to a file for a shell wrapper to source.
    EnvFile,
    /// Write `export` lines to stdout.
    Print,
}

/// How resolved values reach the broker.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub mode: LaunchMode,
    /// Program and arguments; required for [`LaunchMode::Exec`].
    pub command: Vec<String>,
    /// Target file; required for [`LaunchMode::EnvFile`].
    pub env_file: Option<PathBuf>,
    /// Prefix for broker environment names (`KAFKA_` → `KAFKA_NODE_ID`).
    pub env_prefix: String,
}

// ── Top-level ───────────────────────────────────────────────────────────────

/// Fully-resolved resolver configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Durable volume holding the identity record (already expanded, no `~`).
    pub data_dir: PathBuf,
    /// Identity record file name inside `data_dir`.
    pub identity_file: String,
    pub log_level: String,
    /// Append logs here instead of stderr.
    pub log_file: Option<PathBuf>,
    pub cluster_id: String,
    pub listener: ListenerConfig,
    pub roles: NodeRoles,
    pub voters: QuorumVoterSet,
    pub launch: LaunchConfig,
}
