//! Command-line render layer for Atmotube air-quality beacons.
//!
//! The `atmotube` binary consumes decoded readings (one JSON object per line,
//! as recorded from an external payload decoder), keeps the live device list
//! in an [`atmotube_core::DeviceRegistry`] and prints rows the way a list UI
//! would draw them.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `watch` | Follow readings and print each row change as it happens |
//! | `list` | Ingest all readings, then print the deduplicated list |
//! | `config` | Manage CLI configuration |
//!
//! # Output Formats
//!
//! - **Text** (default): Human-readable colored row blocks
//! - **JSON**: One object per change for `watch`, one document for `list`
//!
//! # Configuration
//!
//! The CLI stores configuration in `~/.config/atmotube/config.toml` (or platform equivalent).
//! Configuration options include:
//!
//! - `format`: Default output format
//! - `no_color`: Disable colored output
//! - `channel_capacity`: Render-instruction buffer before a full redraw is needed
//! - `log_rejections`: Trace every rejected advertisement
//!
//! # Environment Variables
//!
//! - `ATMOTUBE_INPUT`: Default input file (overridden by `--input`)
//! - `NO_COLOR`: Disable colored output when set
//! - `RUST_LOG`: Log filter when neither `--verbose` nor `--quiet` is given
//!
//! # Examples
//!
//! Follow a live decoder:
//! ```bash
//! atmotube-decoder | atmotube watch
//! ```
//!
//! Summarize a recording as JSON:
//! ```bash
//! atmotube list --input session.jsonl --format json
//! ```

// This crate is primarily a binary CLI application.
// The main entry point and command implementations are in main.rs.

// Re-export core dependencies for convenience
pub use atmotube_core;
pub use atmotube_types;
