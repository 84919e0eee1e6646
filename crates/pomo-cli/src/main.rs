use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use pomo_core::SessionKind;
use pomo_engine::{Engine, EngineError};
use tracing_subscriber::EnvFilter;

use pomo_cli::commands::output::{ErrorBody, exit_code, write_json};
use pomo_cli::commands::{presets, session, state, stats};
use pomo_cli::{Cli, Commands, Config, LogFormat};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Open the database and wrap it in an engine, ensuring the parent directory exists.
fn open_engine(config: &Config) -> Result<Engine> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = pomo_db::Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok(Engine::new(db, config.engine_options()))
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    init_tracing(cli.verbose, config.log_format);
    tracing::debug!(?config, "loaded configuration");

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let json = cli.json;
    let mut out = io::stdout().lock();
    if matches!(command, Commands::Presets) {
        return presets::run(&mut out, &config, json);
    }

    let owner = config
        .owner_id(cli.owner.as_deref())
        .map_err(EngineError::from)?;
    let owner = owner.as_ref();
    let mut engine = open_engine(&config)?;

    match command {
        Commands::Start(args) => session::start(
            &mut out,
            &mut engine,
            owner,
            &config,
            SessionKind::Focus,
            args,
            json,
        ),
        Commands::Break(args) => session::start(
            &mut out,
            &mut engine,
            owner,
            &config,
            SessionKind::Break,
            args,
            json,
        ),
        Commands::LongBreak => session::long_break(&mut out, &mut engine, owner, json),
        Commands::Decline => session::decline(&mut out, &mut engine, owner, json),
        Commands::Stop => session::stop(&mut out, &mut engine, owner, json),
        Commands::Complete { id } => session::complete(&mut out, &mut engine, owner, *id, json),
        Commands::Show { id } => session::show(&mut out, &engine, owner, *id, json),
        Commands::State => state::run(&mut out, &mut engine, owner, json),
        Commands::Stats(period) => stats::run(&mut out, &engine, owner, *period, json),
        Commands::Tags { limit } => stats::recent_tags(&mut out, &engine, owner, *limit, json),
        Commands::Presets => presets::run(&mut out, &config, json),
    }
}

/// Prints a failure: a JSON body on stdout with `--json`, a message on stderr otherwise.
fn report(err: &anyhow::Error, json: bool) {
    tracing::debug!(error = ?err, "command failed");
    if json && write_json(&mut io::stdout().lock(), &ErrorBody::from_error(err)).is_ok() {
        return;
    }
    eprintln!("error: {err:#}");
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, cli.json);
            ExitCode::from(exit_code(&err))
        }
    }
}
