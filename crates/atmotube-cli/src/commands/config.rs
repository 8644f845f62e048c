//! Config command implementation.

use anyhow::{Context, Result, bail};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::style;

pub fn cmd_config(action: ConfigAction, no_color: bool) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", Config::path().display());
        }
        ConfigAction::Show => {
            let config = Config::load();
            let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("# {}", Config::path().display());
            print!("{}", content);
        }
        ConfigAction::Get { key } => match Config::load().get(key) {
            Some(value) => println!("{}", value),
            None => println!("(not set)"),
        },
        ConfigAction::Set { key, value } => {
            let mut config = Config::load();
            config.set(key, &value)?;
            config.save()?;
            eprintln!(
                "{}",
                style::format_success(&format!("Set {:?} = {}", key, value), no_color)
            );
        }
        ConfigAction::Unset { key } => {
            let mut config = Config::load();
            config.unset(key);
            config.save()?;
            eprintln!(
                "{}",
                style::format_success(&format!("Unset {:?}", key), no_color)
            );
        }
        ConfigAction::Init => {
            let path = Config::path();
            if path.exists() {
                bail!("Config already exists: {}", path.display());
            }
            Config::default().save()?;
            eprintln!(
                "{}",
                style::format_success(
                    &format!("Created config: {}", path.display()),
                    no_color
                )
            );
        }
    }
    Ok(())
}
