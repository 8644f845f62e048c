//! Output formatting for device rows.
//!
//! Text output renders each row as a small block: the identity line with the
//! primary metric, score and icons, followed by the remaining row lines
//! indented underneath. JSON output emits one object per change for `watch`
//! (JSON lines) and one document for `list`.

use anyhow::Result;
use serde::Serialize;

use atmotube_core::{Reading, RenderInstruction, RowView, SessionStats};

use crate::style;

/// Indentation for continuation lines of a row block.
const INDENT: &str = "     ";

/// Format options shared by the renderers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable ANSI colors.
    pub no_color: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self { no_color }
    }
}

/// Render one row as a text block.
///
/// `prefix` is printed before the identity line, e.g. a change marker.
pub fn format_row_text(
    prefix: &str,
    position: usize,
    reading: &Reading,
    row: &RowView,
    opts: &FormatOptions,
) -> String {
    let mut head = vec![
        format!("{}#{}", prefix, position),
        style::format_device_header(&row.line1, opts.no_color),
        style::format_metric(&row.primary_metric, opts.no_color),
        style::format_aqs_colored(row.air_quality_score, opts.no_color),
    ];
    let icons = style::format_icons(row.pairing, row.charge, opts.no_color);
    if !icons.is_empty() {
        head.push(icons);
    }
    if !row.full_packet {
        head.push(style::format_partial(opts.no_color));
    }

    let mut out = head.join("  ");
    out.push('\n');
    for line in [&row.line2, &row.line3] {
        out.push_str(INDENT);
        out.push_str(line);
        out.push('\n');
    }
    if let Some(line4) = &row.line4 {
        out.push_str(INDENT);
        out.push_str(&style::format_pm_line_colored(
            line4,
            reading.pm25,
            opts.no_color,
        ));
        out.push('\n');
    }
    out
}

/// Render a render instruction and the affected row as text.
pub fn format_change_text(
    instruction: RenderInstruction,
    reading: &Reading,
    row: &RowView,
    opts: &FormatOptions,
) -> String {
    let marker = format!("{} ", style::instruction_marker(instruction, opts.no_color));
    format_row_text(&marker, instruction.position(), reading, row, opts)
}

#[derive(Serialize)]
struct ChangeJson<'a> {
    #[serde(flatten)]
    instruction: RenderInstruction,
    row: &'a RowView,
}

/// Render a render instruction and the affected row as one JSON line.
pub fn format_change_json(instruction: RenderInstruction, row: &RowView) -> Result<String> {
    let mut line = serde_json::to_string(&ChangeJson { instruction, row })?;
    line.push('\n');
    Ok(line)
}

/// Render the whole device list as text.
pub fn format_list_text(readings: &[Reading], now: i64, opts: &FormatOptions) -> String {
    if readings.is_empty() {
        return "No Atmotube devices seen.\n".to_string();
    }
    readings
        .iter()
        .enumerate()
        .map(|(position, reading)| {
            let row = RowView::render(reading, now);
            format_row_text("", position, reading, &row, opts)
        })
        .collect()
}

#[derive(Serialize)]
struct ListJson<'a> {
    count: usize,
    devices: Vec<RowView>,
    stats: &'a SessionStats,
}

/// Render the whole device list as a pretty JSON document.
pub fn format_list_json(readings: &[Reading], now: i64, stats: &SessionStats) -> Result<String> {
    let devices: Vec<RowView> = readings.iter().map(|r| RowView::render(r, now)).collect();
    let doc = ListJson {
        count: devices.len(),
        devices,
        stats,
    };
    let mut out = serde_json::to_string_pretty(&doc)?;
    out.push('\n');
    Ok(out)
}

/// One-line session summary.
pub fn format_stats(stats: &SessionStats, devices: usize) -> String {
    format!(
        "{} device(s), {} reading(s) accepted ({} new, {} updates), {} rejected, {} failed",
        devices,
        stats.accepted(),
        stats.inserted,
        stats.updated,
        stats.rejected,
        stats.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use atmotube_core::HardwareVariant;

    fn pro() -> Reading {
        Reading::builder("C2:4E")
            .variant(HardwareVariant::Gen4)
            .activated(true)
            .paired(true)
            .firmware("740102")
            .battery_percent(87)
            .temperature(21.0)
            .humidity(45.0)
            .voc(0.25)
            .pm(3.0, 7.0, 11.0)
            .observed_at_epoch(100)
            .build()
    }

    #[test]
    fn test_format_row_text_plain() {
        let reading = pro();
        let row = RowView::render(&reading, 104);
        let out = format_row_text("", 0, &reading, &row, &FormatOptions::new(true));
        assert_eq!(
            out,
            "#0  C2:4E (Atmotube PRO)  0.25  AQS 85  [paired]\n\
             \x20    FW 74.01.02, bat 87%\n\
             \x20    +21°C, 45%, 4 ago\n\
             \x20    PM1: 3, PM2.5: 7, PM10: 11\n"
        );
    }

    #[test]
    fn test_format_row_text_without_icons_or_pm() {
        let reading = Reading::builder("AA").activated(true).build();
        let row = RowView::render(&reading, 0);
        let out = format_row_text("", 2, &reading, &row, &FormatOptions::new(true));
        assert!(out.starts_with("#2  AA (Atmotube)  0.00  AQS 100  [partial]\n"));
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_format_change_text_marker() {
        let reading = pro();
        let row = RowView::render(&reading, 100);
        let opts = FormatOptions::new(true);

        let inserted = format_change_text(
            RenderInstruction::InsertRow { position: 3 },
            &reading,
            &row,
            &opts,
        );
        assert!(inserted.starts_with("+ #3  "));

        let redrawn = format_change_text(
            RenderInstruction::RedrawRow { position: 3 },
            &reading,
            &row,
            &opts,
        );
        assert!(redrawn.starts_with("~ #3  "));
    }

    #[test]
    fn test_format_change_json() {
        let row = RowView::render(&pro(), 100);
        let line = format_change_json(RenderInstruction::RedrawRow { position: 1 }, &row).unwrap();
        assert!(line.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["action"], "redraw_row");
        assert_eq!(value["position"], 1);
        assert_eq!(value["row"]["device_id"], "C2:4E");
        assert_eq!(value["row"]["line4"], "PM1: 3, PM2.5: 7, PM10: 11");
    }

    #[test]
    fn test_format_list_text_empty() {
        assert_eq!(
            format_list_text(&[], 0, &FormatOptions::new(true)),
            "No Atmotube devices seen.\n"
        );
    }

    #[test]
    fn test_format_list_json() {
        let stats = SessionStats {
            received: 3,
            inserted: 1,
            updated: 1,
            rejected: 1,
            failed: 0,
        };
        let out = format_list_json(&[pro()], 100, &stats).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["devices"][0]["line2"], "FW 74.01.02, bat 87%");
        assert_eq!(value["stats"]["rejected"], 1);
    }

    #[test]
    fn test_format_stats() {
        let stats = SessionStats {
            received: 5,
            rejected: 1,
            inserted: 2,
            updated: 2,
            failed: 0,
        };
        assert_eq!(
            format_stats(&stats, 2),
            "2 device(s), 4 reading(s) accepted (2 new, 2 updates), 1 rejected, 0 failed"
        );
    }
}
