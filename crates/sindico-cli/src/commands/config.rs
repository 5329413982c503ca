use std::path::Path;

use sindico_core::config::SyncSettings;

use crate::cli::{ConfigCommands, StrategyArg};
use crate::commands::common::{load_settings, strategy_from_arg};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, config_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            strategy,
            auto_resolve,
            prefer_merge,
            retention_days,
        } => run_config_init(
            config_path,
            strategy,
            auto_resolve,
            prefer_merge,
            retention_days,
        ),
        ConfigCommands::Show => run_config_show(config_path),
    }
}

pub fn run_config_init(
    config_path: &Path,
    strategy: Option<StrategyArg>,
    auto_resolve: Option<bool>,
    prefer_merge: Option<bool>,
    retention_days: Option<u32>,
) -> Result<(), CliError> {
    let mut settings = load_settings(config_path)?;
    apply_overrides(
        &mut settings,
        strategy,
        auto_resolve,
        prefer_merge,
        retention_days,
    )?;
    settings.save_to_path(config_path)?;

    println!("Sync settings initialized at {}", config_path.display());
    Ok(())
}

pub fn run_config_show(config_path: &Path) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

pub fn apply_overrides(
    settings: &mut SyncSettings,
    strategy: Option<StrategyArg>,
    auto_resolve: Option<bool>,
    prefer_merge: Option<bool>,
    retention_days: Option<u32>,
) -> Result<(), CliError> {
    if let Some(strategy) = strategy {
        settings.default_strategy = strategy_from_arg(strategy);
    }
    if let Some(auto_resolve) = auto_resolve {
        settings.auto_resolve = auto_resolve;
    }
    if let Some(prefer_merge) = prefer_merge {
        settings.prefer_merge = prefer_merge;
    }
    if let Some(days) = retention_days {
        if days == 0 {
            return Err(CliError::Config(
                "retention_days must be at least 1".to_string(),
            ));
        }
        settings.retention_days = days;
    }
    Ok(())
}
