//! Broker launch — hands resolved overrides to the broker process.
//!
//! The overrides arrive as an explicit value. `exec` applies them to the
//! child's environment only; this process's environment is never mutated.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::info;

use crate::{
    config::{LaunchConfig, LaunchMode},
    error::AppError,
    resolver::RuntimeOverrides,
};

/// Consumer of the resolved overrides.
pub trait BrokerLauncher {
    /// Short name used in logs (`"exec"`, `"env-file"`, `"print"`).
    fn name(&self) -> &str;

    /// Deliver `overrides`. For `exec` on unix this only returns on failure.
    fn launch(&self, overrides: &RuntimeOverrides) -> Result<(), AppError>;
}

/// Build the launcher selected by `[launch] mode`.
pub fn launcher_for(config: &LaunchConfig) -> Result<Box<dyn BrokerLauncher>, AppError> {
    match config.mode {
        LaunchMode::Exec => {
            let (program, args) = config.command.split_first().ok_or_else(|| {
                AppError::Config("launch.command is required when launch.mode = \"exec\"".into())
            })?;
            Ok(Box::new(ExecLauncher {
                program: program.clone(),
                args: args.to_vec(),
            }))
        }
        LaunchMode::EnvFile => {
            let path = config.env_file.clone().ok_or_else(|| {
                AppError::Config(
                    "launch.env_file is required when launch.mode = \"env-file\"".into(),
                )
            })?;
            Ok(Box::new(EnvFileLauncher { path }))
        }
        LaunchMode::Print => Ok(Box::new(PrintLauncher)),
    }
}

/// Render overrides as shell `export` lines.
pub fn render_exports(overrides: &RuntimeOverrides) -> String {
    let mut out = String::new();
    for (name, value) in overrides.iter() {
        out.push_str("export ");
        out.push_str(name);
        out.push('=');
        out.push_str(&shell_quote(value));
        out.push('\n');
    }
    out
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

// ── exec ─────────────────────────────────────────────────────────────────────

/// Replaces this process with the broker command.
#[derive(Debug, Clone)]
pub struct ExecLauncher {
    pub program: String,
    pub args: Vec<String>,
}

impl ExecLauncher {
    fn command(&self, overrides: &RuntimeOverrides) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(overrides.iter());
        cmd
    }
}

impl BrokerLauncher for ExecLauncher {
    fn name(&self) -> &str {
        "exec"
    }

    #[cfg(unix)]
    fn launch(&self, overrides: &RuntimeOverrides) -> Result<(), AppError> {
        use std::os::unix::process::CommandExt;

        info!(program = %self.program, args = ?self.args, "exec broker");
        let err = self.command(overrides).exec();
        Err(AppError::Launch(format!("cannot exec {}: {err}", self.program)))
    }

    #[cfg(not(unix))]
    fn launch(&self, overrides: &RuntimeOverrides) -> Result<(), AppError> {
        info!(program = %self.program, args = ?self.args, "spawn broker");
        let status = self
            .command(overrides)
            .status()
            .map_err(|e| AppError::Launch(format!("cannot spawn {}: {e}", self.program)))?;
        if status.success() {
            Ok(())
        } else {
            Err(AppError::Launch(format!("{} exited with {status}", self.program)))
        }
    }
}

// ── env-file ─────────────────────────────────────────────────────────────────

/// Writes `export` lines to a file, atomically.
#[derive(Debug, Clone)]
pub struct EnvFileLauncher {
    pub path: PathBuf,
}

impl BrokerLauncher for EnvFileLauncher {
    fn name(&self) -> &str {
        "env-file"
    }

    fn launch(&self, overrides: &RuntimeOverrides) -> Result<(), AppError> {
        write_atomically(&self.path, render_exports(overrides).as_bytes())?;
        info!(path = %self.path.display(), vars = overrides.len(), "env file written");
        Ok(())
    }
}

fn write_atomically(path: &Path, body: &[u8]) -> Result<(), AppError> {
    let launch_err = |what: &str, p: &Path, e: std::io::Error| {
        AppError::Launch(format!("cannot {what} {}: {e}", p.display()))
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| launch_err("create", dir, e))?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let mut file = File::create(&tmp).map_err(|e| launch_err("create", &tmp, e))?;
    file.write_all(body)
        .and_then(|_| file.sync_all())
        .map_err(|e| launch_err("write", &tmp, e))?;
    drop(file);
    fs::rename(&tmp, path).map_err(|e| launch_err("rename into", path, e))
}

// ── print ────────────────────────────────────────────────────────────────────

/// Writes `export` lines to stdout, e.g. for `eval "$(broker-identity)"`.
#[derive(Debug, Clone, Copy)]
pub struct PrintLauncher;

impl BrokerLauncher for PrintLauncher {
    fn name(&self) -> &str {
        "print"
    }

    fn launch(&self, overrides: &RuntimeOverrides) -> Result<(), AppError> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(render_exports(overrides).as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| AppError::Launch(format!("cannot write to stdout: {e}")))
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::resolver::resolve;
    use tempfile::TempDir;

    fn overrides(tmp: &TempDir) -> RuntimeOverrides {
        let cfg = Config::test_default(tmp.path());
        resolve(&cfg, "kafka-0").unwrap().overrides("KAFKA_")
    }

    fn launch_config(mode: LaunchMode) -> LaunchConfig {
        LaunchConfig {
            mode,
            command: Vec::new(),
            env_file: None,
            env_prefix: "KAFKA_".into(),
        }
    }

    #[test]
    fn exports_are_single_quoted() {
        let tmp = TempDir::new().unwrap();
        let rendered = render_exports(&overrides(&tmp));
        assert!(rendered.contains("export KAFKA_NODE_ID='0'\n"));
        assert!(rendered.contains(
            "export KAFKA_ADVERTISED_LISTENERS='PLAINTEXT://kafka-0.kafka.svc.cluster.local:9092'\n"
        ));
        assert!(rendered.starts_with("export KAFKA_NODE_ID="));
    }

    #[test]
    fn quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn env_file_written_atomically() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("run").join("broker.env");
        let launcher = EnvFileLauncher {
            path: target.clone(),
        };
        let ov = overrides(&tmp);
        launcher.launch(&ov).unwrap();

        let body = fs::read_to_string(&target).unwrap();
        assert_eq!(body, render_exports(&ov));
        assert!(!tmp.path().join("run").join("broker.env.tmp").exists());
    }

    #[test]
    fn exec_requires_command() {
        let err = launcher_for(&launch_config(LaunchMode::Exec)).err().unwrap();
        assert!(err.to_string().contains("launch.command"));
    }

    #[test]
    fn env_file_requires_path() {
        let err = launcher_for(&launch_config(LaunchMode::EnvFile)).err().unwrap();
        assert!(err.to_string().contains("launch.env_file"));
    }

    #[test]
    fn launcher_names_follow_mode() {
        let mut cfg = launch_config(LaunchMode::Exec);
        cfg.command = vec!["/etc/confluent/docker/run".into()];
        assert_eq!(launcher_for(&cfg).unwrap().name(), "exec");
        assert_eq!(launcher_for(&launch_config(LaunchMode::Print)).unwrap().name(), "print");
    }

    #[test]
    fn exec_of_missing_program_reports_launch_error() {
        let tmp = TempDir::new().unwrap();
        let launcher = ExecLauncher {
            program: tmp.path().join("no-such-broker").display().to_string(),
            args: vec![],
        };
        let err = launcher.launch(&overrides(&tmp)).unwrap_err();
        assert!(matches!(err, AppError::Launch(_)));
    }

    #[test]
    fn exec_passes_overrides_to_child() {
        let tmp = TempDir::new().unwrap();
        let launcher = ExecLauncher {
            program: "env".into(),
            args: vec![],
        };
        let cmd = launcher.command(&overrides(&tmp));
        let envs: Vec<_> = cmd.get_envs().collect();
        assert!(envs.iter().any(|(k, _)| *k == "KAFKA_NODE_ID"));
    }
}
