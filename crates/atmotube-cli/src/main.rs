use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod style;
mod util;

use cli::{Cli, Commands};
use commands::{ListArgs, WatchArgs, cmd_config, cmd_list, cmd_watch};
use config::{Config, resolve_no_color};
use format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Logs go to stderr so rendered rows on stdout stay machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load();
    let no_color = resolve_no_color(cli.no_color, &config);
    let opts = FormatOptions::new(no_color);

    match cli.command {
        Commands::Watch {
            input,
            output,
            capacity,
        } => {
            let format = output.resolve_format(cli.json, config.format);
            cmd_watch(WatchArgs {
                input: input.input,
                options: config.session_options(capacity, input.device),
                format,
                output: cli.output.as_ref(),
                quiet: cli.quiet,
                opts,
            })
            .await?;
        }
        Commands::List { input, output } => {
            let format = output.resolve_format(cli.json, config.format);
            cmd_list(ListArgs {
                input: input.input,
                options: config.session_options(None, input.device),
                format,
                output: cli.output.as_ref(),
                quiet: cli.quiet,
                opts,
            })
            .await?;
        }
        Commands::Config { action } => {
            cmd_config(action, no_color)?;
        }
    }

    Ok(())
}
