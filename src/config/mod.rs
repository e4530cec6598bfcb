//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the file given with `-f`), then applies the `BROKER_IDENTITY_*`
//! env overrides.
//!
//! # Module layout
//!
//! - **types** — Public configuration structs (`Config`, `ListenerConfig`,
//!   `LaunchConfig`).
//! - **raw** — Raw TOML deserialization types (`RawConfig`, `RawListener`, …).
//!   These mirror the file shape and use serde defaults; kept private.
//! - **load** — Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{DEFAULT_CONFIG_PATH, EnvOverrides, expand_home, load, load_from};
pub use types::*;

#[cfg(test)]
impl Config {
    /// Combined broker/controller node 0 of a one-voter cluster, printing its
    /// overrides instead of exec'ing anything.
    pub fn test_default(data_dir: &std::path::Path) -> Self {
        use crate::address::DnsTemplate;
        use crate::quorum::{NodeRoles, QuorumVoterSet};

        Self {
            data_dir: data_dir.to_path_buf(),
            identity_file: raw::default_identity_file(),
            log_level: raw::default_log_level(),
            log_file: None,
            cluster_id: "1984e4f7-test-cluster".into(),
            listener: ListenerConfig {
                name: raw::default_listener_name(),
                dns_template: DnsTemplate::parse("kafka-{id}.kafka.svc.cluster.local")
                    .expect("valid template"),
                port: raw::default_listener_port(),
            },
            roles: NodeRoles::COMBINED,
            voters: "0@kafka-0.kafka.svc.cluster.local:9093"
                .parse::<QuorumVoterSet>()
                .expect("valid voters"),
            launch: LaunchConfig {
                mode: LaunchMode::Print,
                command: Vec::new(),
                env_file: None,
                env_prefix: raw::default_env_prefix(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::{NamedTempFile, TempDir};

    const MINIMAL_TOML: &str = r#"
[resolver]
data_dir = "/var/lib/kafka/data"

[cluster]
cluster_id = "1984e4f7-test-cluster"

[listener]
dns_template = "kafka-{id}.kafka.svc.cluster.local"

[quorum]
voters = "0@kafka-0.kafka.svc.cluster.local:9093"

[launch]
command = ["/etc/confluent/docker/run"]
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn no_overrides() -> EnvOverrides {
        EnvOverrides::default()
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), &no_overrides()).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/kafka/data"));
        assert_eq!(cfg.identity_file, "meta.identity");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.cluster_id, "1984e4f7-test-cluster");
        assert_eq!(cfg.listener.name, "PLAINTEXT");
        assert_eq!(cfg.listener.port, 9092);
        assert!(cfg.roles.is_controller());
        assert_eq!(cfg.voters.len(), 1);
        assert_eq!(cfg.launch.mode, LaunchMode::Exec);
        assert_eq!(cfg.launch.env_prefix, "KAFKA_");
    }

    #[test]
    fn voters_as_array_of_tables() {
        let toml = r#"
[cluster]
cluster_id = "c1"

[listener]
dns_template = "kafka-{id}.kafka"

[[quorum.voters]]
node_id = 0
host = "kafka-0.kafka"

[[quorum.voters]]
node_id = 1
host = "kafka-1.kafka"
port = 19093
"#;
        let f = write_toml(toml);
        let cfg = load_from(f.path(), &no_overrides()).unwrap();
        assert_eq!(cfg.voters.to_string(), "0@kafka-0.kafka:9093,1@kafka-1.kafka:19093");
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/kafka-data");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with("kafka-data"));
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn relative_path_unchanged() {
        assert_eq!(expand_home("relative/path"), PathBuf::from("relative/path"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), &no_overrides());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn env_overrides_win() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = EnvOverrides {
            data_dir: Some("/tmp/override".into()),
            log_level: Some("debug".into()),
            cluster_id: Some("from-env".into()),
            quorum_voters: Some("0@a:9093,1@b:9093".into()),
        };
        let cfg = load_from(f.path(), &overrides).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/override"));
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.cluster_id, "from-env");
        assert_eq!(cfg.voters.len(), 2);
    }

    #[test]
    fn mistyped_log_level_errors() {
        let f = write_toml(&MINIMAL_TOML.replace(
            "data_dir = \"/var/lib/kafka/data\"",
            "data_dir = \"/var/lib/kafka/data\"\nlog_level = \"inf\"",
        ));
        let err = load_from(f.path(), &no_overrides()).unwrap_err();
        assert!(err.to_string().contains("resolver.log_level"));

        let f = write_toml(MINIMAL_TOML);
        let overrides = EnvOverrides {
            log_level: Some("inf".into()),
            ..EnvOverrides::default()
        };
        assert!(load_from(f.path(), &overrides).is_err());
    }

    #[test]
    fn missing_cluster_id_errors() {
        let f = write_toml(
            r#"
[listener]
dns_template = "kafka-{id}.kafka"
"#,
        );
        let err = load_from(f.path(), &no_overrides()).unwrap_err();
        assert!(err.to_string().contains("cluster.cluster_id is required"));
    }

    #[test]
    fn missing_template_errors() {
        let f = write_toml("[cluster]\ncluster_id = \"c1\"\n");
        let err = load_from(f.path(), &no_overrides()).unwrap_err();
        assert!(err.to_string().contains("listener.dns_template is required"));
    }

    #[test]
    fn template_without_placeholder_errors() {
        let f = write_toml(&MINIMAL_TOML.replace("kafka-{id}.kafka", "kafka.kafka"));
        assert!(load_from(f.path(), &no_overrides()).is_err());
    }

    #[test]
    fn unknown_role_errors() {
        let toml = format!("{MINIMAL_TOML}\n[node]\nroles = [\"observer\"]\n");
        let f = write_toml(&toml);
        let err = load_from(f.path(), &no_overrides()).unwrap_err();
        assert!(err.to_string().contains("observer"));
    }

    #[test]
    fn unknown_launch_mode_errors() {
        let f = write_toml(&MINIMAL_TOML.replace("[launch]", "[launch]\nmode = \"fork\""));
        let err = load_from(f.path(), &no_overrides()).unwrap_err();
        assert!(err.to_string().contains("launch.mode"));
    }

    #[test]
    fn identity_file_must_be_plain_name() {
        let f = write_toml(&MINIMAL_TOML.replace(
            "data_dir = \"/var/lib/kafka/data\"",
            "data_dir = \"/var/lib/kafka/data\"\nidentity_file = \"../elsewhere\"",
        ));
        let err = load_from(f.path(), &no_overrides()).unwrap_err();
        assert!(err.to_string().contains("identity_file"));
    }

    fn write_named(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn overlay_keeps_base_fields() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", MINIMAL_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[resolver]
log_level = "debug"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, &no_overrides()).unwrap();
        assert_eq!(cfg.cluster_id, "1984e4f7-test-cluster");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/kafka/data"));
    }

    #[test]
    fn overlay_replaces_voter_string() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", MINIMAL_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[quorum]
voters = "0@kafka-0.kafka:9093,1@kafka-1.kafka:9093,2@kafka-2.kafka:9093"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, &no_overrides()).unwrap();
        assert_eq!(cfg.voters.len(), 3);
    }

    #[test]
    fn missing_base_errors() {
        let dir = TempDir::new().unwrap();
        let overlay = r#"
[meta]
base = "nonexistent.toml"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let msg = load_from(&overlay_path, &no_overrides()).unwrap_err().to_string();
        assert!(msg.contains("cannot read"));
    }

    #[test]
    fn cycle_detection() {
        let dir = TempDir::new().unwrap();
        let self_path = dir.path().join("self.toml");
        let content = format!("[meta]\nbase = \"{}\"\n\n{MINIMAL_TOML}", self_path.display());
        std::fs::write(&self_path, content).unwrap();
        let msg = load_from(&self_path, &no_overrides()).unwrap_err().to_string();
        assert!(msg.contains("circular"));
    }
}
