//! Input and output plumbing shared by commands.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use atmotube_core::{Advertisement, JsonDecoder};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Open the JSON-lines input: a file, or stdin for `None` and `-`.
pub async fn open_input(path: Option<&Path>) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    match path {
        Some(p) if p != Path::new("-") => {
            let file = tokio::fs::File::open(p)
                .await
                .with_context(|| format!("Failed to open input: {}", p.display()))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(tokio::io::stdin())),
    }
}

/// Turn one recorded reading into an advertisement for the session.
///
/// Returns `None` for blank lines. Malformed lines are logged and skipped.
pub fn line_to_advertisement(line: &str, line_no: usize) -> Option<Advertisement> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match JsonDecoder::parse(trimmed) {
        Ok(reading) => {
            let mut adv = Advertisement::new(reading.device_id, trimmed.as_bytes().to_vec());
            if let Some(rssi) = reading.rssi {
                adv = adv.with_rssi(rssi);
            }
            Some(adv)
        }
        Err(e) => {
            warn!(line = line_no, "Skipping malformed line: {}", e);
            None
        }
    }
}

/// Forward every reading in `reader` to `tx`, one advertisement per line.
///
/// Returns the number of lines read. Stops early if the receiver is gone.
pub async fn forward_lines<R>(reader: R, tx: mpsc::Sender<Advertisement>) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut line_no = 0;
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        line_no += 1;
        let Some(adv) = line_to_advertisement(&line, line_no) else {
            continue;
        };
        if tx.send(adv).await.is_err() {
            debug!("Session stopped, no longer reading input");
            break;
        }
    }
    Ok(line_no)
}

/// Open the output sink: a file, or stdout.
pub fn open_output(output: Option<&PathBuf>) -> Result<Box<dyn Write + Send>> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(io::BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

/// Write output to file or stdout
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}
