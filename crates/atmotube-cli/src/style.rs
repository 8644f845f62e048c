//! Visual styling utilities for the CLI.
//!
//! Color thresholds and icon labels shared by the watch and list renderers.
//! Every helper takes `no_color` and falls back to plain text.

use owo_colors::OwoColorize;

use atmotube_core::{ChargeIcon, PairingIcon, RenderInstruction};

// ============================================================================
// Thresholds
// ============================================================================

/// Air Quality Score bands (higher is better).
pub mod aqs {
    /// Good air quality threshold.
    pub const GOOD: u8 = 80;
    /// Moderate air quality threshold.
    pub const MODERATE: u8 = 60;
    /// Poor air quality threshold.
    pub const POOR: u8 = 40;
}

/// PM2.5 bands in µg/m³.
pub mod pm25 {
    /// Good PM2.5 threshold.
    pub const GOOD: f32 = 12.0;
    /// Moderate PM2.5 threshold.
    pub const MODERATE: f32 = 35.0;
}

// ============================================================================
// Colored Value Formatting
// ============================================================================

/// Format an Air Quality Score with a color for its band.
pub fn format_aqs_colored(score: u8, no_color: bool) -> String {
    let text = format!("AQS {}", score);
    if no_color {
        return text;
    }

    if score >= aqs::GOOD {
        format!("{}", text.green())
    } else if score >= aqs::MODERATE {
        format!("{}", text.yellow())
    } else if score >= aqs::POOR {
        // Orange color (RGB: 255, 165, 0)
        format!("{}", text.truecolor(255, 165, 0))
    } else {
        format!("{}", text.red())
    }
}

/// Format the primary metric in bold.
pub fn format_metric(metric: &str, no_color: bool) -> String {
    if no_color {
        metric.to_string()
    } else {
        format!("{}", metric.bold())
    }
}

/// Color a PM line by its PM2.5 band.
pub fn format_pm_line_colored(line: &str, pm25: f32, no_color: bool) -> String {
    if no_color || line == "PM: off" {
        return line.to_string();
    }

    if pm25 < pm25::GOOD {
        format!("{}", line.green())
    } else if pm25 < pm25::MODERATE {
        format!("{}", line.yellow())
    } else {
        format!("{}", line.red())
    }
}

// ============================================================================
// Icons
// ============================================================================

/// Text label for icon slot A, `None` when the slot is empty.
pub fn pairing_label(icon: PairingIcon) -> Option<&'static str> {
    match icon {
        PairingIcon::Paired => Some("paired"),
        PairingIcon::Unpaired => Some("unpaired"),
        PairingIcon::Factory => Some("factory"),
        PairingIcon::Hidden => None,
    }
}

/// Text label for icon slot B, `None` when the slot is empty.
pub fn charge_label(icon: ChargeIcon) -> Option<&'static str> {
    match icon {
        ChargeIcon::ChargingCalibrating => Some("charging+calibrating"),
        ChargeIcon::Charging => Some("charging"),
        ChargeIcon::Calibrating => Some("calibrating"),
        ChargeIcon::ChargingTimeout => Some("charge timeout"),
        ChargeIcon::None => None,
    }
}

/// Bracketed icon badges, e.g. `[paired] [charging]`.
pub fn format_icons(pairing: PairingIcon, charge: ChargeIcon, no_color: bool) -> String {
    let mut badges = Vec::new();
    if let Some(label) = pairing_label(pairing) {
        let badge = format!("[{}]", label);
        badges.push(if no_color || pairing == PairingIcon::Paired {
            badge
        } else {
            format!("{}", badge.dimmed())
        });
    }
    if let Some(label) = charge_label(charge) {
        let badge = format!("[{}]", label);
        badges.push(match charge {
            _ if no_color => badge,
            ChargeIcon::ChargingTimeout => format!("{}", badge.red()),
            _ => format!("{}", badge.cyan()),
        });
    }
    badges.join(" ")
}

/// Badge for a row built from a truncated advertisement.
pub fn format_partial(no_color: bool) -> String {
    if no_color {
        "[partial]".to_string()
    } else {
        format!("{}", "[partial]".yellow())
    }
}

/// Marker shown before a row: `+` for a new row, `~` for a redraw.
pub fn instruction_marker(instruction: RenderInstruction, no_color: bool) -> String {
    match instruction {
        RenderInstruction::InsertRow { .. } if no_color => "+".to_string(),
        RenderInstruction::InsertRow { .. } => format!("{}", "+".green()),
        RenderInstruction::RedrawRow { .. } if no_color => "~".to_string(),
        RenderInstruction::RedrawRow { .. } => format!("{}", "~".blue()),
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Format a device header line.
pub fn format_device_header(header: &str, no_color: bool) -> String {
    if no_color {
        header.to_string()
    } else {
        format!("{}", header.bold())
    }
}

/// Format a success message.
pub fn format_success(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[OK] {}", message)
    } else {
        format!("{} {}", "[OK]".green(), message)
    }
}

/// Format a warning message.
pub fn format_warning(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[!!] {}", message)
    } else {
        format!("{} {}", "[!!]".yellow(), message)
    }
}
