//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape — serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub resolver: RawResolver,
    #[serde(default)]
    pub cluster: RawCluster,
    #[serde(default)]
    pub listener: RawListener,
    #[serde(default)]
    pub node: RawNode,
    #[serde(default)]
    pub quorum: RawQuorum,
    #[serde(default)]
    pub launch: RawLaunch,
}

#[derive(Deserialize)]
pub(super) struct RawResolver {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_identity_file")]
    pub identity_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for RawResolver {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            identity_file: default_identity_file(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

#[derive(Deserialize, Default)]
pub(super) struct RawCluster {
    #[serde(default)]
    pub cluster_id: Option<String>,
}

// ── Listener ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawListener {
    #[serde(default = "default_listener_name")]
    pub name: String,
    #[serde(default)]
    pub dns_template: Option<String>,
    #[serde(default = "default_listener_port")]
    pub port: u16,
}

impl Default for RawListener {
    fn default() -> Self {
        Self {
            name: default_listener_name(),
            dns_template: None,
            port: default_listener_port(),
        }
    }
}

// ── Node / quorum ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawNode {
    /// `["broker", "controller"]` by default: combined KRaft mode.
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
}

impl Default for RawNode {
    fn default() -> Self {
        Self { roles: default_roles() }
    }
}

#[derive(Deserialize, Default)]
pub(super) struct RawQuorum {
    #[serde(default)]
    pub voters: RawVoters,
}

/// Either Kafka's `id@host:port,...` string or an array of tables.
#[derive(Deserialize)]
#[serde(untagged)]
pub(super) enum RawVoters {
    Kafka(String),
    List(Vec<RawVoter>),
}

impl Default for RawVoters {
    fn default() -> Self {
        RawVoters::List(Vec::new())
    }
}

#[derive(Deserialize)]
pub(super) struct RawVoter {
    pub node_id: u32,
    pub host: String,
    #[serde(default = "default_controller_port")]
    pub port: u16,
}

// ── Launch ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLaunch {
    #[serde(default = "default_launch_mode")]
    pub mode: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub env_file: Option<String>,
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,
}

impl Default for RawLaunch {
    fn default() -> Self {
        Self {
            mode: default_launch_mode(),
            command: Vec::new(),
            env_file: None,
            env_prefix: default_env_prefix(),
        }
    }
}

// ── Defaults ────────────────────────────────────────────────────────────────

pub(super) fn default_data_dir() -> String {
    "/var/lib/kafka/data".to_string()
}

pub(super) fn default_identity_file() -> String {
    crate::identity::DEFAULT_IDENTITY_FILE.to_string()
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_listener_name() -> String {
    "PLAINTEXT".to_string()
}

pub(super) fn default_listener_port() -> u16 {
    9092
}

pub(super) fn default_controller_port() -> u16 {
    9093
}

fn default_roles() -> Vec<String> {
    vec!["broker".to_string(), "controller".to_string()]
}

fn default_launch_mode() -> String {
    "exec".to_string()
}

pub(super) fn default_env_prefix() -> String {
    "KAFKA_".to_string()
}
