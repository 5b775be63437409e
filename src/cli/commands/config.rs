//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: Option<&str>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Init { force } => {
            let path = resolve_path(config_path);
            if path.exists() && !force {
                Output::warning(&format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ));
                return Ok(());
            }
            Settings::default().save_to(&path)?;
            Output::success(&format!("Wrote default config to {}", path.display()));
        }

        ConfigAction::Path => {
            println!("{}", resolve_path(config_path).display());
        }
    }

    Ok(())
}

fn resolve_path(config_path: Option<&str>) -> PathBuf {
    match config_path {
        Some(path) => Settings::expand_path(path),
        None => Settings::default_config_path(),
    }
}
