//! Config command implementation.

use anyhow::{Result, bail};

use crate::cli::ConfigAction;
use mlx_cli::config::Config;

pub fn cmd_config(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let path = Config::path();
            println!("# {}", path.display());
            if !path.exists() {
                println!("# (file not found, showing defaults)");
            }
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigAction::Path => {
            println!("{}", Config::path().display());
        }
        ConfigAction::Init => {
            let path = Config::path();
            if path.exists() {
                bail!("Config file already exists: {}", path.display());
            }
            Config::template().save_to(&path)?;
            println!("Created {}", path.display());
        }
    }
    Ok(())
}
