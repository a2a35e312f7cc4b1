mod cli;
mod config;
mod db;
mod models;
mod prayer_times;
mod tui;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands};
use cli::handlers::{self, SetupArgs};
use config::AppConfig;
use db::migrations::run_migrations;
use db::repository::MetaRepo;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config_path = AppConfig::config_path()?;
    let mut config = AppConfig::load_from(&config_path).context("Loading config")?;

    // Ensure data directory exists and open DB
    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    run_migrations(&conn)?;

    match cli.command {
        Some(Commands::Setup {
            name,
            lat,
            lng,
            method,
            school,
            list_methods,
            reset,
        }) => {
            let args = SetupArgs {
                name,
                lat,
                lng,
                method,
                school,
                list_methods,
                reset,
            };
            handlers::handle_setup(&conn, &mut config, &config_path, args)?;
        }
        Some(cmd) => {
            warn_if_not_setup(&conn)?;
            let client = handlers::make_client(&config)?;
            match cmd {
                Commands::Times => handlers::handle_times(&conn, &config, &client)?,
                Commands::Month { year, month } => {
                    handlers::handle_month(&conn, &config, &client, year, month)?
                }
                Commands::School { school } => handlers::handle_school(
                    &conn,
                    &mut config,
                    &config_path,
                    school.as_deref(),
                )?,
                Commands::Refresh => handlers::handle_refresh(&conn, &config, &client)?,
                Commands::Setup { .. } => unreachable!(),
            }
        }
        // No subcommand → launch TUI
        None => {
            warn_if_not_setup(&conn)?;
            let client = handlers::make_client(&config)?;
            tui::app::run(conn, config, config_path, client)?;
        }
    }

    Ok(())
}

/// Defaults work out of the box, but point first-time users at `setup`.
fn warn_if_not_setup(conn: &Connection) -> Result<()> {
    let done = MetaRepo::get(conn, "setup_done")?;
    if done.as_deref() != Some("1") {
        eprintln!("Using the default location. Run `waqt setup --lat <LAT> --lng <LNG>` to set yours.");
    }
    Ok(())
}
