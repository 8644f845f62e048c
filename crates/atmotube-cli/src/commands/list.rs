//! List command implementation.
//!
//! Ingests the whole input, then prints the deduplicated device list in
//! first-seen order.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use atmotube_core::{Clock, JsonDecoder, ScanSession, SessionOptions, SystemClock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_list_json, format_list_text, format_stats};
use crate::style;
use crate::util::{forward_lines, open_input, write_output};

/// Arguments for the list command.
pub struct ListArgs<'a> {
    pub input: Option<PathBuf>,
    pub options: SessionOptions,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub quiet: bool,
    pub opts: FormatOptions,
}

pub async fn cmd_list(args: ListArgs<'_>) -> Result<()> {
    let ListArgs {
        input,
        options,
        format,
        output,
        quiet,
        opts,
    } = args;

    let reader = open_input(input.as_deref()).await?;
    let session = Arc::new(ScanSession::with_decoder(JsonDecoder::new(), options));

    let (tx, rx) = mpsc::channel(64);
    let reader_task = tokio::spawn(forward_lines(reader, tx));
    let stats = session
        .run(rx, CancellationToken::new())
        .await
        .context("Scan session task failed")?;
    reader_task.await.context("Input reader task failed")??;

    let readings = session.registry().snapshot();
    let now = SystemClock.now_epoch_seconds();
    let content = match format {
        OutputFormat::Text => format_list_text(&readings, now, &opts),
        OutputFormat::Json => format_list_json(&readings, now, &stats)?,
    };
    write_output(output, &content)?;

    if !quiet && format == OutputFormat::Text {
        eprintln!(
            "{}",
            style::format_success(&format_stats(&stats, readings.len()), opts.no_color)
        );
    }
    Ok(())
}
