//! `catalog` command-line entry point.
//!
//! # Responsibility
//! - Load layered config, start logging, open the database.
//! - Print each command's JSON result on stdout and map failures to a
//!   non-zero exit code.

mod cli;
mod commands;
mod config;

use anyhow::{Context, Result};
use catalog_core::db::open_db;
use catalog_core::{init_logging, SqliteContentStore};
use clap::Parser;
use cli::Cli;
use config::CatalogConfig;

fn main() {
    match run() {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("catalog: {err:#}");
            std::process::exit(commands::EXIT_FAILED);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut config =
        CatalogConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    init_logging(&config.logging.level, config.logging.dir.as_deref())
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;

    let conn = open_db(&config.database.path).with_context(|| {
        format!(
            "failed to open database `{}`",
            config.database.path.display()
        )
    })?;
    let store = SqliteContentStore::try_new(&conn)?;

    let output = commands::dispatch(cli.command, store, &config)?;
    println!("{}", serde_json::to_string_pretty(&output.body)?);
    Ok(output.exit_code)
}
