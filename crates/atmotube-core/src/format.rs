//! Presentation derivations for one device row.
//!
//! Every function here is a pure function of a [`Reading`]; only
//! [`line3`] additionally takes the current time, because the "seconds ago"
//! term is recomputed on each render rather than cached at capture time.
//! Nothing in this module touches the registry, so it is safe to call after
//! the registry lock has been released.
//!
//! A row is made of four text lines, a primary metric and two icon slots:
//!
//! ```text
//! C2:4E:11:0A:9B:01 (Atmotube PRO), ERR2      | 0.42
//! FW 74.01.02, bat 87%, 3.9V, 1a2b            |
//! +21°C, 45%, 1013 mbar, 4 ago                | [paired] [charging]
//! PM1: 3, PM2.5: 7, PM10: 11                  |
//! ```

use atmotube_types::{HardwareVariant, Reading, round_half_up};
use serde::{Deserialize, Serialize};

/// Marker rendered in place of a missing firmware version.
pub const ABSENT_FIRMWARE: &str = "null";

/// Source of the current time for elapsed-time rendering.
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds.
    fn now_epoch_seconds(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> i64 {
        time::OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// Clock frozen at a given instant, for deterministic rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> i64 {
        self.0
    }
}

/// Render a float the way the device companion apps do: whole numbers keep
/// one decimal (`4.0`), everything else uses the shortest exact form.
pub fn format_float(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e7 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Dotted `AB.CD.EF` form of a six-character firmware version.
///
/// Any other length is returned verbatim; an absent version renders as
/// [`ABSENT_FIRMWARE`].
///
/// ```
/// use atmotube_core::format::format_firmware;
///
/// assert_eq!(format_firmware(Some("123456")), "12.34.56");
/// assert_eq!(format_firmware(Some("12A")), "12A");
/// assert_eq!(format_firmware(None), "null");
/// ```
pub fn format_firmware(firmware: Option<&str>) -> String {
    let Some(fw) = firmware else {
        return ABSENT_FIRMWARE.to_string();
    };
    let chars: Vec<char> = fw.chars().collect();
    if chars.len() != 6 {
        return fw.to_string();
    }
    chars
        .chunks(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(".")
}

/// Identity line: address, model name, error code and, for extended devices
/// still in factory mode, the battery voltage.
pub fn line1(reading: &Reading) -> String {
    let mut line = format!(
        "{} ({})",
        reading.device_id,
        reading.hardware_variant.version_name()
    );
    if reading.error_code > 0 {
        line.push_str(&format!(", ERR{}", reading.error_code));
    }
    if reading.hardware_variant.is_extended() && !reading.activated {
        line.push_str(&format!(", {}V", format_float(reading.battery_voltage)));
    }
    line
}

/// Firmware and power line.
///
/// Extended devices report a true percentage (`bat 80%`); legacy devices a
/// coarse charge value without unit (`bat80`).
pub fn line2(reading: &Reading) -> String {
    let mut line = format!(
        "FW {}",
        format_firmware(reading.firmware_version.as_deref())
    );
    if reading.hardware_variant.is_extended() {
        line.push_str(&format!(", bat {}%", reading.battery_percent));
    } else {
        line.push_str(&format!(", bat{}", reading.battery_percent));
    }
    if reading.activated && reading.battery_voltage > 0.0 {
        line.push_str(&format!(", {}V", format_float(reading.battery_voltage)));
    }
    if reading.crc > 0 {
        line.push_str(&format!(", {:x}", reading.crc));
    }
    line
}

/// Climate line with the time since the reading was captured.
///
/// Values are truncated toward zero. A capture timestamp in the future
/// renders as `0 ago`.
pub fn line3(reading: &Reading, now_epoch_seconds: i64) -> String {
    let mut line = String::new();
    if reading.temperature_c > 0.0 {
        line.push('+');
    }
    line.push_str(&format!(
        "{}°C, {}%",
        reading.temperature_c as i32, reading.humidity_percent as i32
    ));
    if reading.hardware_variant.is_extended() && reading.pressure_millibar > 0.0 {
        line.push_str(&format!(", {} mbar", reading.pressure_millibar as i32));
    }
    line.push_str(&format!(", {} ago", reading.age_seconds(now_epoch_seconds)));
    line
}

/// Particulate-matter line, present only for Gen4 hardware.
pub fn line4(reading: &Reading) -> Option<String> {
    if !reading.hardware_variant.has_pm_sensor() {
        return None;
    }
    let line = if !reading.pm_power_on {
        "PM: off".to_string()
    } else if !reading.activated {
        format!("PM2.5: {}", reading.pm25 as i32)
    } else {
        format!(
            "PM1: {}, PM2.5: {}, PM10: {}",
            reading.pm1 as i32, reading.pm25 as i32, reading.pm10 as i32
        )
    };
    Some(line)
}

/// Headline value of the row.
///
/// VOC with two decimals (ties round up) once the device is activated or on
/// extended hardware; the raw sensor ADC value for legacy devices in factory
/// mode.
pub fn primary_metric(reading: &Reading) -> String {
    if reading.activated || reading.hardware_variant.is_extended() {
        format!("{:.2}", round_half_up(f64::from(reading.voc_index), 2))
    } else {
        reading.adc_raw.to_string()
    }
}

/// Icon slot A: pairing or factory state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingIcon {
    /// Extended device bonded to a phone.
    Paired,
    /// Extended device not bonded.
    Unpaired,
    /// Device has not left factory mode.
    Factory,
    /// Activated legacy device; slot is empty.
    Hidden,
}

/// Derive icon slot A.
pub fn pairing_icon(reading: &Reading) -> PairingIcon {
    if !reading.activated {
        return PairingIcon::Factory;
    }
    match reading.hardware_variant {
        HardwareVariant::Gen3 | HardwareVariant::Gen4 if reading.paired => PairingIcon::Paired,
        HardwareVariant::Gen3 | HardwareVariant::Gen4 => PairingIcon::Unpaired,
        HardwareVariant::Standard => PairingIcon::Hidden,
    }
}

/// Icon slot B: charge and calibration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeIcon {
    /// Charging while the VOC sensor calibrates.
    ChargingCalibrating,
    /// Charging.
    Charging,
    /// VOC sensor calibrating.
    Calibrating,
    /// Charger timed out.
    ChargingTimeout,
    /// Slot is empty.
    None,
}

/// Derive icon slot B.
///
/// Evaluated in priority order; the combined charging and calibrating
/// state wins over either alone.
pub fn charge_icon(reading: &Reading) -> ChargeIcon {
    if reading.charging && reading.calibrating {
        ChargeIcon::ChargingCalibrating
    } else if reading.charging {
        ChargeIcon::Charging
    } else if reading.calibrating {
        ChargeIcon::Calibrating
    } else if reading.charging_timeout {
        ChargeIcon::ChargingTimeout
    } else {
        ChargeIcon::None
    }
}

/// Every derivation for one row, computed in a single pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowView {
    /// Device address.
    pub device_id: String,
    /// Identity line.
    pub line1: String,
    /// Firmware and power line.
    pub line2: String,
    /// Climate line.
    pub line3: String,
    /// Particulate-matter line (Gen4 only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line4: Option<String>,
    /// Headline value.
    pub primary_metric: String,
    /// Air Quality Score derived from VOC.
    pub air_quality_score: u8,
    /// Icon slot A.
    pub pairing: PairingIcon,
    /// Icon slot B.
    pub charge: ChargeIcon,
    /// False for a truncated advertisement; the lines may show placeholders.
    pub full_packet: bool,
}

impl RowView {
    /// Derive a row at the given instant.
    pub fn render(reading: &Reading, now_epoch_seconds: i64) -> Self {
        Self {
            device_id: reading.device_id.clone(),
            line1: line1(reading),
            line2: line2(reading),
            line3: line3(reading, now_epoch_seconds),
            line4: line4(reading),
            primary_metric: primary_metric(reading),
            air_quality_score: reading.air_quality_score(),
            pairing: pairing_icon(reading),
            charge: charge_icon(reading),
            full_packet: reading.is_full_packet(),
        }
    }

    /// Derive a row using `clock` for the current time.
    pub fn render_with(reading: &Reading, clock: &dyn Clock) -> Self {
        Self::render(reading, clock.now_epoch_seconds())
    }

    /// Text lines in display order, skipping an absent line 4.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        [&self.line1, &self.line2, &self.line3]
            .into_iter()
            .map(String::as_str)
            .chain(self.line4.as_deref())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn variant() -> impl Strategy<Value = HardwareVariant> {
        prop_oneof![
            Just(HardwareVariant::Standard),
            Just(HardwareVariant::Gen3),
            Just(HardwareVariant::Gen4),
        ]
    }

    proptest! {
        /// Six-character firmware always renders as three dotted pairs.
        #[test]
        fn six_char_firmware_is_dotted(fw in "[0-9A-F]{6}") {
            let formatted = format_firmware(Some(&fw));
            prop_assert_eq!(formatted.len(), 8);
            prop_assert_eq!(formatted.replace('.', ""), fw);
        }

        /// Any other length is passed through untouched.
        #[test]
        fn other_firmware_is_verbatim(fw in "[0-9A-F]{0,5}|[0-9A-F]{7,10}") {
            prop_assert_eq!(format_firmware(Some(&fw)), fw);
        }

        /// Only Gen4 readings produce line 4.
        #[test]
        fn line4_only_for_gen4(
            v in variant(),
            activated: bool,
            pm_power: bool,
            pm in 0.0f32..1000.0,
        ) {
            let reading = Reading::builder("A")
                .variant(v)
                .activated(activated)
                .pm(pm, pm, pm)
                .pm_power(pm_power)
                .build();
            prop_assert_eq!(line4(&reading).is_some(), v == HardwareVariant::Gen4);
        }

        /// Elapsed time never goes negative and always tracks `now`.
        #[test]
        fn line3_elapsed_is_clamped(observed in 0i64..2_000_000_000, now in 0i64..2_000_000_000) {
            let reading = Reading::builder("A").observed_at_epoch(observed).build();
            let expected = format!(", {} ago", (now - observed).max(0));
            prop_assert!(line3(&reading, now).ends_with(&expected));
        }

        /// Rendering is total over arbitrary finite readings.
        #[test]
        fn render_is_total(
            v in variant(),
            activated: bool,
            paired: bool,
            battery in 0u8..=100,
            voltage in 0.0f32..5.0,
            error_code: u32,
            crc: u32,
            temp in -40.0f32..85.0,
            hum in 0.0f32..100.0,
            voc in 0.0f32..20.0,
            adc: u32,
        ) {
            let reading = Reading::builder("A")
                .variant(v)
                .activated(activated)
                .paired(paired)
                .battery_percent(battery)
                .battery_voltage(voltage)
                .error_code(error_code)
                .crc(crc)
                .temperature(temp)
                .humidity(hum)
                .voc(voc)
                .adc_raw(adc)
                .build();
            let row = RowView::render(&reading, 0);
            prop_assert!(row.line1.starts_with("A ("));
            prop_assert!(row.line2.starts_with("FW "));
            prop_assert!(row.air_quality_score <= 100);
        }
    }
}
