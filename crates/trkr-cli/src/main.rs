use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use trkr_cli::commands::{account, entries, status, summary, util};
use trkr_cli::{Cli, Commands, Config, exit_code};
use trkr_db::Database;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn run(cli: &Cli) -> Result<()> {
    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let token = cli.token.as_deref();
    let mut stdout = std::io::stdout().lock();

    match command {
        Commands::Register(args) => account::register(&mut stdout, &mut db, &config, args)?,
        Commands::Login {
            credentials,
            show_token,
        } => account::login(&mut stdout, &mut db, &config, credentials, *show_token)?,
        Commands::Logout => account::logout(&mut stdout, &mut db, &config)?,
        Commands::Whoami => account::whoami(&mut stdout, &mut db, &config, token)?,
        Commands::Add(args) => {
            let owner = util::current_identity(&mut db, &config, token)?;
            entries::add(&mut stdout, &mut db, &owner, *args)?;
        }
        Commands::List(args) => {
            let owner = util::current_identity(&mut db, &config, token)?;
            entries::list(&mut stdout, &mut db, &owner, args)?;
        }
        Commands::Show { id, json } => {
            let owner = util::current_identity(&mut db, &config, token)?;
            entries::show(&mut stdout, &mut db, &owner, *id, *json)?;
        }
        Commands::Edit { id, entry } => {
            let owner = util::current_identity(&mut db, &config, token)?;
            entries::edit(&mut stdout, &mut db, &owner, *id, *entry)?;
        }
        Commands::Delete { id } => {
            let owner = util::current_identity(&mut db, &config, token)?;
            entries::delete(&mut stdout, &mut db, &owner, *id)?;
        }
        Commands::Summary(args) => {
            let owner = util::current_identity(&mut db, &config, token)?;
            let today = Local::now().date_naive();
            summary::run(&mut stdout, &mut db, &owner, args, today)?;
        }
        Commands::Status => status::run(&mut stdout, &db, &config)?,
    }

    stdout.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Log to stderr so command output on stdout stays parseable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
