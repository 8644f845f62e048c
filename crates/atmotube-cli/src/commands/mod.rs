//! Command implementations for the CLI.

mod config;
mod list;
mod watch;

pub use config::cmd_config;
pub use list::{ListArgs, cmd_list};
pub use watch::{WatchArgs, cmd_watch};
