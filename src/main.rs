//! broker-identity — resolves this node's identity, then starts the broker.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Resolve ordinal, voters, advertised address and durable identity
//!   6. Hand the overrides to the configured launcher (exec / env-file / print)
//!
//! Any failure exits with status 1 before the broker is started.

use std::path::PathBuf;

use tracing::info;

use broker_identity::{
    cluster_id,
    config::{self, LaunchMode},
    error::AppError,
    launch, logger, resolver,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    if args.random_cluster_id {
        println!("{}", cluster_id::generate());
        return Ok(());
    }

    let mut config = config::load(args.config_path.as_deref())?;

    if let Some(path) = args.env_file {
        config.launch.mode = LaunchMode::EnvFile;
        config.launch.env_file = Some(path);
    }
    if args.print {
        config.launch.mode = LaunchMode::Print;
    }
    if !args.command.is_empty() {
        config.launch.command = args.command;
    }

    let (effective_log_level, source) = match args.log_level {
        Some(level) => (level, logger::LevelSource::Cli),
        None => (config.log_level.as_str(), logger::LevelSource::Config),
    };
    logger::init(effective_log_level, source, config.log_file.as_deref())?;

    info!(
        data_dir = %config.data_dir.display(),
        cluster_id = %config.cluster_id,
        dns_template = %config.listener.dns_template,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    // Built before resolving so a bad launch section fails without a write.
    let launcher = launch::launcher_for(&config.launch)?;

    let assigned_name = match args.name {
        Some(name) => name,
        None => resolver::assigned_name_from_env()?,
    };

    let node = resolver::resolve(&config, &assigned_name)?;
    let overrides = node.overrides(&config.launch.env_prefix);

    info!(
        node_id = node.identity.node_id,
        advertised = %node.advertised,
        launcher = launcher.name(),
        "identity resolved — handing off to broker"
    );

    launcher.launch(&overrides)
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
    name: Option<String>,
    env_file: Option<PathBuf>,
    print: bool,
    random_cluster_id: bool,
    /// Everything after `--`: the broker command for exec mode.
    command: Vec<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;
    let mut name = None;
    let mut env_file = None;
    let mut print = false;
    let mut random_cluster_id = false;
    let mut command = Vec::new();

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            command.extend(iter.by_ref());
            break;
        }
        if let Some(count) = logger::verbosity_flag_count(&arg) {
            verbosity = verbosity.saturating_add(count);
            continue;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: broker-identity [OPTIONS] [-- <BROKER COMMAND>...]");
                println!("       broker-identity random-cluster-id");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -n, --name <NAME>          Assigned name (default: $POD_NAME, then $HOSTNAME)");
                println!("      --env-file <PATH>      Write overrides to PATH instead of exec'ing the broker");
                println!("      --print                Print overrides to stdout instead of exec'ing the broker");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "random-cluster-id" => random_cluster_id = true,
            "-f" | "--config" => config_path = Some(required_value(&mut iter, "-f/--config")),
            "-n" | "--name" => name = Some(required_value(&mut iter, "-n/--name")),
            "--env-file" => env_file = Some(PathBuf::from(required_value(&mut iter, "--env-file"))),
            "--print" => print = true,
            "--verbose" => verbosity = verbosity.saturating_add(1),
            other => {
                eprintln!("error: unexpected argument '{other}' (see --help)");
                std::process::exit(1);
            }
        }
    }

    CliArgs {
        log_level: logger::level_for_verbosity(verbosity),
        config_path,
        name,
        env_file,
        print,
        random_cluster_id,
        command,
    }
}

fn required_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> String {
    match iter.next() {
        Some(value) => value,
        None => {
            eprintln!("error: {flag} requires a value");
            std::process::exit(1);
        }
    }
}
