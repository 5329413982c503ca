//! sindico-sync - Command-line review of App Síndico offline-sync conflicts
//!
//! Detects conflicts between cached and server snapshots, keeps them in a
//! local ledger and settles them by strategy, merge or manual edit.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::clear::run_clear;
use crate::commands::common::{resolve_config_path, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::detect::run_detect;
use crate::commands::diff::run_diff;
use crate::commands::export::run_export;
use crate::commands::list::run_list;
use crate::commands::resolve::{run_resolve, run_resolve_all, ResolveChoice};
use crate::commands::stats::run_stats;
use crate::error::CliError;

fn main() {
    if let Err(error) = run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "sindico=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path)?;
    let config_path = resolve_config_path(cli.config_path)?;

    match cli.command {
        Commands::Detect {
            store,
            local,
            server,
            auto_resolve,
            strategy,
            json,
        } => {
            run_detect(
                &store,
                &local,
                &server,
                auto_resolve,
                strategy,
                json,
                &db_path,
                &config_path,
            )?;
        }
        Commands::List {
            state,
            store,
            limit,
            json,
        } => run_list(state, store.as_deref(), limit, json, &db_path)?,
        Commands::Diff { id, json } => run_diff(id, json, &db_path, &config_path)?,
        Commands::Resolve {
            id,
            all,
            store,
            strategy,
            merge,
            manual,
        } => {
            let choice = ResolveChoice::from_flags(strategy, merge, manual);
            if all {
                run_resolve_all(store.as_deref(), &choice, &db_path, &config_path)?;
            } else if let Some(id) = id {
                run_resolve(id, &choice, &db_path, &config_path)?;
            }
        }
        Commands::Stats { json } => run_stats(json, &db_path)?,
        Commands::Export { output } => run_export(output.as_deref(), &db_path)?,
        Commands::Clear { older_than_days } => {
            run_clear(older_than_days, &db_path, &config_path)?;
        }
        Commands::Config { command } => run_config(command, &config_path)?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
