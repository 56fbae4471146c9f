use annotag::cli::{Args, Command};
use annotag::config::{self, AppConfig, PathConfig};
use annotag::core::registry::{TagRegistry, registry};
use annotag::document::Document;
use annotag::entities::attrs::ValidationPolicy;
use annotag::tags;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::path::Path;

fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, path_config));
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging; RUST_LOG still wins if set
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn run_parse(
    reg: &TagRegistry,
    app_config: &AppConfig,
    file: &Path,
    lenient: bool,
    json: bool,
) -> Result<()> {
    let src = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let policy = if lenient {
        ValidationPolicy::Substitute
    } else {
        app_config.validation_policy
    };
    debug!("Parsing {} with {:?} validation", file.display(), policy);

    let doc = Document::parse(&src, reg, policy)
        .with_context(|| format!("Invalid config {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc.snapshot())?);
    } else {
        for node in doc.render() {
            print!("{}", node);
        }
        for entity in doc.entities() {
            let tools: Vec<&str> = entity.tools().map(|t| t.kind().key()).collect();
            println!(
                "{:<12} {:<14} hasStates={:<5} tools=[{}]",
                entity.label(),
                entity.type_name(),
                entity.has_states(),
                tools.join(", ")
            );
        }
    }
    Ok(())
}

fn run_tags(reg: &TagRegistry) -> Result<()> {
    for tag in reg.tags() {
        let entry = reg.resolve(&tag)?;
        let surface = entry.entity_type.surface();
        println!("<{}> {}", tag, entry.entity_type.name());
        for (name, attr_type) in &surface.fields {
            println!("    field  {:<14} {:?}", name, attr_type);
        }
        for (name, kind) in &surface.members {
            println!("    {:<6} {}", format!("{:?}", kind).to_lowercase(), name);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }
    init_logging(&args, &path_config)?;
    debug!("Command-line args: {:?}", args);

    let config_path = config::config_file(config::CONFIG_FILE, &path_config);
    info!("Config file: {}", config_path.display());
    let app_config = AppConfig::load(&config_path)?;

    let reg = registry();
    tags::register_all(reg).context("Failed to register built-in tags")?;

    match &args.command {
        Command::Parse {
            file,
            lenient,
            json,
        } => run_parse(reg, &app_config, file, *lenient, *json),
        Command::Tags => run_tags(reg),
    }
}
