//! Watch command implementation.
//!
//! Reads decoded readings as they arrive, feeds them through a scan session
//! and acts as the render layer: every render instruction redraws only the
//! affected row. A lagging subscriber falls back to a full-list redraw.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use atmotube_core::{
    Clock, JsonDecoder, RenderInstruction, RowView, ScanSession, SessionOptions, SessionStats,
    SystemClock,
};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::OutputFormat;
use crate::format::{
    FormatOptions, format_change_json, format_change_text, format_list_text, format_stats,
};
use crate::style;
use crate::util::{forward_lines, open_input, open_output};

/// Buffered advertisements between the input reader and the session.
const INPUT_BUFFER: usize = 64;

/// Arguments for the watch command.
pub struct WatchArgs<'a> {
    pub input: Option<PathBuf>,
    pub options: SessionOptions,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub quiet: bool,
    pub opts: FormatOptions,
}

struct Renderer<'a> {
    session: &'a ScanSession,
    format: OutputFormat,
    opts: FormatOptions,
    out: Box<dyn Write + Send>,
    clock: SystemClock,
}

impl Renderer<'_> {
    fn change(&mut self, instruction: RenderInstruction) -> Result<()> {
        let reading = self
            .session
            .registry()
            .get(instruction.position())
            .context("Render instruction points past the device list")?;
        let row = RowView::render_with(&reading, &self.clock);
        let text = match self.format {
            OutputFormat::Text => format_change_text(instruction, &reading, &row, &self.opts),
            OutputFormat::Json => format_change_json(instruction, &row)?,
        };
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn full_list(&mut self) -> Result<()> {
        let readings = self.session.registry().snapshot();
        let now = self.clock.now_epoch_seconds();
        match self.format {
            OutputFormat::Text => {
                let text = format_list_text(&readings, now, &self.opts);
                self.out.write_all(text.as_bytes())?;
            }
            OutputFormat::Json => {
                for (position, reading) in readings.iter().enumerate() {
                    let row = RowView::render(reading, now);
                    let line = format_change_json(RenderInstruction::RedrawRow { position }, &row)?;
                    self.out.write_all(line.as_bytes())?;
                }
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn lagged(&mut self, skipped: u64) -> Result<()> {
        warn!(
            "Render layer lagged by {} instruction(s), redrawing full list",
            skipped
        );
        self.full_list()
    }
}

pub async fn cmd_watch(args: WatchArgs<'_>) -> Result<()> {
    let WatchArgs {
        input,
        options,
        format,
        output,
        quiet,
        opts,
    } = args;

    let reader = open_input(input.as_deref()).await?;
    let session = Arc::new(ScanSession::with_decoder(JsonDecoder::new(), options));
    let mut updates = session.subscribe();

    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    let reader_task = tokio::spawn(forward_lines(reader, tx));
    let cancel = CancellationToken::new();
    let mut run = session.run(rx, cancel.clone());

    let mut renderer = Renderer {
        session: session.as_ref(),
        format,
        opts,
        out: open_output(output)?,
        clock: SystemClock,
    };

    let stats: SessionStats = loop {
        tokio::select! {
            biased;
            msg = updates.recv() => match msg {
                Ok(instruction) => renderer.change(instruction)?,
                Err(RecvError::Lagged(skipped)) => renderer.lagged(skipped)?,
                Err(RecvError::Closed) => {
                    break (&mut run).await.context("Scan session task failed")?;
                }
            },
            result = &mut run => {
                let stats = result.context("Scan session task failed")?;
                // Instructions published before the session stopped
                loop {
                    match updates.try_recv() {
                        Ok(instruction) => renderer.change(instruction)?,
                        Err(TryRecvError::Lagged(skipped)) => renderer.lagged(skipped)?,
                        Err(_) => break,
                    }
                }
                break stats;
            }
            _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                eprintln!("\n{}", style::format_warning("Shutting down...", opts.no_color));
                cancel.cancel();
            }
        }
    };

    if cancel.is_cancelled() {
        reader_task.abort();
    } else {
        let lines = reader_task.await.context("Input reader task failed")??;
        tracing::debug!("Read {} input line(s)", lines);
    }

    if !quiet {
        eprintln!(
            "{}",
            style::format_success(
                &format_stats(&stats, session.registry().len()),
                opts.no_color
            )
        );
    }
    Ok(())
}
