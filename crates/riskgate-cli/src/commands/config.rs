// Configuration check and display

use anyhow::{Context, Result};
use clap::Subcommand;
use riskgate_core::RiskConfig;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Validate a configuration file
    Check {
        /// Risk configuration TOML file
        path: PathBuf,
    },
    /// Print the effective configuration (defaults when no file is given)
    Show {
        /// Risk configuration TOML file
        path: Option<PathBuf>,
    },
}

pub fn handle_config_command(command: &ConfigSubcommand) -> Result<()> {
    match command {
        ConfigSubcommand::Check { path } => {
            RiskConfig::load_from_file(path)
                .with_context(|| format!("{} is not a valid configuration", path.display()))?;
            println!("{}: ok", path.display());
            Ok(())
        }
        ConfigSubcommand::Show { path } => {
            let config = effective(path.as_ref())?;
            print!("{}", render(&config)?);
            Ok(())
        }
    }
}

fn effective(path: Option<&PathBuf>) -> Result<RiskConfig> {
    let mut config = match path {
        Some(path) => RiskConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RiskConfig::default(),
    };
    config.merge_with_env().context("applying RISKGATE_* overrides")?;
    Ok(config)
}

fn render(config: &RiskConfig) -> Result<String> {
    toml::to_string_pretty(config).context("rendering configuration")
}
