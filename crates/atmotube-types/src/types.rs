//! Core types for Atmotube beacon telemetry.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Hardware generation of an Atmotube device.
///
/// The variant decides which telemetry fields carry meaning and how they
/// are rendered:
/// - **Standard**: Atmotube 1.0 and 2.0 (VOC, temperature, humidity)
/// - **Gen3**: Atmotube PLUS (adds pressure and true battery percentage)
/// - **Gen4**: Atmotube PRO (adds the PM1/PM2.5/PM10 particulate sensor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HardwareVariant {
    /// Atmotube 1.0 / 2.0.
    #[default]
    Standard,
    /// Atmotube PLUS.
    Gen3,
    /// Atmotube PRO.
    Gen4,
}

impl HardwareVariant {
    /// Infer the variant from a firmware version string.
    ///
    /// Firmware builds starting with `73` ship on PLUS hardware and builds
    /// starting with `74` on PRO hardware. Everything else, including an
    /// absent version, is treated as a legacy device.
    ///
    /// ```
    /// use atmotube_types::HardwareVariant;
    ///
    /// assert_eq!(HardwareVariant::from_firmware(Some("730211")), HardwareVariant::Gen3);
    /// assert_eq!(HardwareVariant::from_firmware(Some("740102")), HardwareVariant::Gen4);
    /// assert_eq!(HardwareVariant::from_firmware(Some("720305")), HardwareVariant::Standard);
    /// assert_eq!(HardwareVariant::from_firmware(None), HardwareVariant::Standard);
    /// ```
    #[must_use]
    pub fn from_firmware(firmware: Option<&str>) -> Self {
        match firmware {
            Some(fw) if fw.starts_with("73") => HardwareVariant::Gen3,
            Some(fw) if fw.starts_with("74") => HardwareVariant::Gen4,
            _ => HardwareVariant::Standard,
        }
    }

    /// Whether this is a Gen3 or Gen4 device.
    ///
    /// Extended devices report true battery percentage, battery voltage
    /// and barometric pressure.
    #[must_use]
    pub fn is_extended(&self) -> bool {
        matches!(self, HardwareVariant::Gen3 | HardwareVariant::Gen4)
    }

    /// Whether the device carries the particulate-matter subsystem.
    #[must_use]
    pub fn has_pm_sensor(&self) -> bool {
        matches!(self, HardwareVariant::Gen4)
    }

    /// Marketing name shown next to the device address.
    #[must_use]
    pub fn version_name(&self) -> &'static str {
        match self {
            HardwareVariant::Standard => "Atmotube",
            HardwareVariant::Gen3 => "Atmotube PLUS",
            HardwareVariant::Gen4 => "Atmotube PRO",
        }
    }
}

impl fmt::Display for HardwareVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version_name())
    }
}

/// Status bits carried in the beacon info byte.
///
/// Decoders use [`StatusFlags::from_info_byte`] to populate the boolean
/// fields of a [`Reading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusFlags {
    /// Device has left factory/demo mode.
    pub activated: bool,
    /// Device is bonded to a phone.
    pub paired: bool,
    /// Battery is charging.
    pub charging: bool,
    /// VOC sensor is calibrating.
    pub calibrating: bool,
    /// Charger timed out.
    pub charging_timeout: bool,
    /// Device reports an internal error.
    pub has_error: bool,
    /// Slow sampling mode (30 s on PLUS/PRO hardware).
    pub slow_mode: bool,
    /// Legacy battery level (1 to 8), 0 for Gen3/Gen4 firmware.
    pub battery_level: u8,
}

/// Firmware build whose info byte never reports calibration.
const NO_CALIBRATION_FIRMWARE: &str = "700305";

impl StatusFlags {
    /// Decode the info byte of an advertisement.
    ///
    /// Several bits are active-low. Firmware families `73` and `74` repurpose
    /// the low three bits as error and bond flags instead of a battery level.
    ///
    /// ```
    /// use atmotube_types::StatusFlags;
    ///
    /// // 0x20 set: still in factory mode
    /// let flags = StatusFlags::from_info_byte(0x60, Some("720305"));
    /// assert!(!flags.activated);
    /// assert!(!flags.calibrating);
    /// assert_eq!(flags.battery_level, 1);
    /// ```
    #[must_use]
    pub fn from_info_byte(info: u8, firmware: Option<&str>) -> Self {
        let extended_fw = firmware.is_some_and(|fw| fw.starts_with("73") || fw.starts_with("74"));

        let calibrating = if firmware == Some(NO_CALIBRATION_FIRMWARE) {
            false
        } else {
            info & 0x40 == 0
        };

        let (has_error, paired, battery_level) = if extended_fw {
            (info & 0x04 == 0, info & 0x02 == 0, 0)
        } else {
            (false, false, (info & 0x07) + 1)
        };

        Self {
            activated: info & 0x20 == 0,
            paired,
            charging: info & 0x08 != 0,
            calibrating,
            charging_timeout: info & 0x10 != 0,
            has_error,
            slow_mode: info & 0x80 != 0,
            battery_level,
        }
    }
}

/// Minimum believable temperature for a consumer air-quality sensor.
pub const MIN_TEMPERATURE_C: f32 = -40.0;

/// Maximum believable temperature for a consumer air-quality sensor.
pub const MAX_TEMPERATURE_C: f32 = 85.0;

/// Decoded telemetry from one Atmotube advertisement.
///
/// A reading is a snapshot: it is produced by a decoder, handed to the
/// registry, and retired as soon as a newer reading for the same
/// `device_id` arrives. Which fields carry meaning depends on
/// [`HardwareVariant`]; fields that do not apply stay at zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// Hardware address; identity key of the device.
    pub device_id: String,
    /// Hardware generation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hardware_variant: HardwareVariant,
    /// Device has left factory/demo mode.
    #[cfg_attr(feature = "serde", serde(default))]
    pub activated: bool,
    /// Device is bonded to a phone.
    #[cfg_attr(feature = "serde", serde(default))]
    pub paired: bool,
    /// Firmware version, normally six hex digits such as `740102`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub firmware_version: Option<String>,
    /// Charge level. True percentage on Gen3/Gen4, a coarse charge value on
    /// legacy hardware.
    #[cfg_attr(feature = "serde", serde(default))]
    pub battery_percent: u8,
    /// Battery voltage in volts.
    #[cfg_attr(feature = "serde", serde(default))]
    pub battery_voltage: f32,
    /// Device error code, 0 when healthy.
    #[cfg_attr(feature = "serde", serde(default))]
    pub error_code: u32,
    /// Payload checksum, 0 when absent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub crc: u32,
    /// Temperature in degrees Celsius.
    #[cfg_attr(feature = "serde", serde(default))]
    pub temperature_c: f32,
    /// Relative humidity percentage.
    #[cfg_attr(feature = "serde", serde(default))]
    pub humidity_percent: f32,
    /// Barometric pressure in millibar (Gen3/Gen4).
    #[cfg_attr(feature = "serde", serde(default))]
    pub pressure_millibar: f32,
    /// VOC index in ppm.
    #[cfg_attr(feature = "serde", serde(default))]
    pub voc_index: f32,
    /// Raw VOC sensor ADC value (non-activated legacy devices).
    #[cfg_attr(feature = "serde", serde(default))]
    pub adc_raw: u32,
    /// Battery is charging.
    #[cfg_attr(feature = "serde", serde(default))]
    pub charging: bool,
    /// VOC sensor is calibrating.
    #[cfg_attr(feature = "serde", serde(default))]
    pub calibrating: bool,
    /// Charger timed out.
    #[cfg_attr(feature = "serde", serde(default))]
    pub charging_timeout: bool,
    /// Particulate-matter subsystem is powered (Gen4).
    #[cfg_attr(feature = "serde", serde(default))]
    pub pm_power_on: bool,
    /// PM1 concentration in µg/m³ (Gen4).
    #[cfg_attr(feature = "serde", serde(default))]
    pub pm1: f32,
    /// PM2.5 concentration in µg/m³ (Gen4).
    #[cfg_attr(feature = "serde", serde(default))]
    pub pm25: f32,
    /// PM10 concentration in µg/m³ (Gen4).
    #[cfg_attr(feature = "serde", serde(default))]
    pub pm10: f32,
    /// Unix timestamp (seconds) when the advertisement was received.
    #[cfg_attr(feature = "serde", serde(default))]
    pub observed_at_epoch_seconds: i64,
    /// Signal strength in dBm, if the scanner reported it.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub rssi: Option<i16>,
    /// Lowercase hex dump of the advertisement payload.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub raw: Option<String>,
    /// Status info byte as received, if the advertisement carried one.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub info_byte: Option<u8>,
    /// Where the phone was when the reading was captured.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub location: Option<GeoTag>,
}

/// Phone position attached to a reading for upload.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoTag {
    pub latitude: f64,
    pub longitude: f64,
}

/// One reading flattened for upload.
///
/// Serializes as a JSON array
/// `[lat, lon, aqs, voc, temperature, humidity, time]`; the coordinates are
/// `null` when the reading carries no [`GeoTag`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UploadRow(
    pub Option<f64>,
    pub Option<f64>,
    pub u8,
    pub f64,
    pub f32,
    pub f32,
    pub i64,
);

impl Reading {
    /// Create a reading for a device with every measurement zeroed.
    pub fn new(device_id: impl Into<String>, hardware_variant: HardwareVariant) -> Self {
        Self {
            device_id: device_id.into(),
            hardware_variant,
            activated: false,
            paired: false,
            firmware_version: None,
            battery_percent: 0,
            battery_voltage: 0.0,
            error_code: 0,
            crc: 0,
            temperature_c: 0.0,
            humidity_percent: 0.0,
            pressure_millibar: 0.0,
            voc_index: 0.0,
            adc_raw: 0,
            charging: false,
            calibrating: false,
            charging_timeout: false,
            pm_power_on: false,
            pm1: 0.0,
            pm25: 0.0,
            pm10: 0.0,
            observed_at_epoch_seconds: 0,
            rssi: None,
            raw: None,
            info_byte: None,
            location: None,
        }
    }

    /// Create a builder for a reading from the given device.
    pub fn builder(device_id: impl Into<String>) -> ReadingBuilder {
        ReadingBuilder {
            reading: Self::new(device_id, HardwareVariant::Standard),
        }
    }

    /// The capture time as an `OffsetDateTime`, if the timestamp is in range.
    #[must_use]
    pub fn observed_at(&self) -> Option<time::OffsetDateTime> {
        time::OffsetDateTime::from_unix_timestamp(self.observed_at_epoch_seconds).ok()
    }

    /// Seconds elapsed between capture and `now_epoch_seconds`.
    ///
    /// Clamped at zero when the capture timestamp lies in the future.
    #[must_use]
    pub fn age_seconds(&self, now_epoch_seconds: i64) -> i64 {
        now_epoch_seconds
            .saturating_sub(self.observed_at_epoch_seconds)
            .max(0)
    }

    /// Air Quality Score derived from the VOC index.
    #[must_use]
    pub fn air_quality_score(&self) -> u8 {
        air_quality_score(self.voc_index)
    }

    /// Whether the VOC value is known.
    ///
    /// Decoders mark a measurement the payload did not carry as NaN.
    #[must_use]
    pub fn has_voc(&self) -> bool {
        self.voc_index.is_finite()
    }

    /// Whether the advertisement carried the full packet.
    ///
    /// Some devices send truncated payloads without the firmware version.
    #[must_use]
    pub fn is_full_packet(&self) -> bool {
        self.firmware_version
            .as_deref()
            .is_some_and(|fw| !fw.is_empty())
    }

    /// Whether every climate value and the info byte are present, with a
    /// positive VOC.
    #[must_use]
    pub fn is_valid_all_data(&self) -> bool {
        self.has_voc()
            && self.temperature_c.is_finite()
            && self.humidity_percent.is_finite()
            && self.info_byte.is_some()
            && self.voc_index > 0.0
    }

    /// Flatten the reading into an upload row.
    ///
    /// VOC is rounded half-up to two decimals.
    ///
    /// ```
    /// use atmotube_types::{Reading, UploadRow};
    ///
    /// let reading = Reading::builder("AA")
    ///     .voc(0.125)
    ///     .temperature(21.5)
    ///     .humidity(40.0)
    ///     .observed_at_epoch(1_700_000_000)
    ///     .location(52.37, 4.89)
    ///     .build();
    /// assert_eq!(
    ///     reading.upload_row(),
    ///     UploadRow(Some(52.37), Some(4.89), 92, 0.13, 21.5, 40.0, 1_700_000_000)
    /// );
    /// ```
    #[must_use]
    pub fn upload_row(&self) -> UploadRow {
        UploadRow(
            self.location.map(|g| g.latitude),
            self.location.map(|g| g.longitude),
            self.air_quality_score(),
            round_half_up(f64::from(self.voc_index), 2),
            self.temperature_c,
            self.humidity_percent,
            self.observed_at_epoch_seconds,
        )
    }
}

/// Round `value` to `decimals` places, ties away from zero.
///
/// Works on the shortest decimal representation of the value so that
/// `0.125` rounds to `0.13` even though its binary form sits just below.
#[must_use]
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    let shifted: f64 = format!("{}e{}", value, decimals)
        .parse()
        .unwrap_or(value * factor);
    shifted.round() / factor
}

/// Map a VOC concentration in ppm onto a 0 to 100 Air Quality Score.
///
/// The curve is piecewise linear: steep below 0.5 ppm, flatter up to 2 ppm,
/// then falling to zero around 8.5 ppm.
///
/// ```
/// use atmotube_types::air_quality_score;
///
/// assert_eq!(air_quality_score(0.0), 100);
/// assert_eq!(air_quality_score(1.0), 61);
/// assert_eq!(air_quality_score(10.0), 0);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn air_quality_score(voc: f32) -> u8 {
    let score = if voc < 0.5 {
        100.0 - 60.0 * voc
    } else if voc < 2.0 {
        (118.0 - 26.0 * voc) / 1.5
    } else {
        (374.0 - 44.0 * voc) / 6.5
    };
    score.clamp(0.0, 100.0) as u8
}

/// Builder for constructing a [`Reading`].
///
/// Use [`build`](Self::build) for unchecked construction, or
/// [`try_build`](Self::try_build) to validate field values first.
#[derive(Debug, Clone)]
#[must_use]
pub struct ReadingBuilder {
    reading: Reading,
}

impl ReadingBuilder {
    /// Set the hardware variant.
    pub fn variant(mut self, variant: HardwareVariant) -> Self {
        self.reading.hardware_variant = variant;
        self
    }

    /// Set the activation state.
    pub fn activated(mut self, activated: bool) -> Self {
        self.reading.activated = activated;
        self
    }

    /// Set the pairing state.
    pub fn paired(mut self, paired: bool) -> Self {
        self.reading.paired = paired;
        self
    }

    /// Copy status booleans from decoded info-byte flags.
    pub fn status_flags(mut self, flags: StatusFlags) -> Self {
        self.reading.activated = flags.activated;
        self.reading.paired = flags.paired;
        self.reading.charging = flags.charging;
        self.reading.calibrating = flags.calibrating;
        self.reading.charging_timeout = flags.charging_timeout;
        if flags.battery_level > 0 {
            self.reading.battery_percent = flags.battery_level;
        }
        self
    }

    /// Decode and apply the status info byte.
    ///
    /// Set the firmware first: the bit layout depends on it.
    pub fn info(self, info: u8) -> Self {
        let flags = StatusFlags::from_info_byte(info, self.reading.firmware_version.as_deref());
        let mut builder = self.status_flags(flags);
        builder.reading.info_byte = Some(info);
        builder
    }

    /// Attach the phone position.
    pub fn location(mut self, latitude: f64, longitude: f64) -> Self {
        self.reading.location = Some(GeoTag {
            latitude,
            longitude,
        });
        self
    }

    /// Set the firmware version.
    pub fn firmware(mut self, firmware: impl Into<String>) -> Self {
        self.reading.firmware_version = Some(firmware.into());
        self
    }

    /// Set the battery charge value.
    pub fn battery_percent(mut self, percent: u8) -> Self {
        self.reading.battery_percent = percent;
        self
    }

    /// Set the battery voltage.
    pub fn battery_voltage(mut self, volts: f32) -> Self {
        self.reading.battery_voltage = volts;
        self
    }

    /// Set the device error code.
    pub fn error_code(mut self, code: u32) -> Self {
        self.reading.error_code = code;
        self
    }

    /// Set the payload checksum.
    pub fn crc(mut self, crc: u32) -> Self {
        self.reading.crc = crc;
        self
    }

    /// Set temperature.
    pub fn temperature(mut self, celsius: f32) -> Self {
        self.reading.temperature_c = celsius;
        self
    }

    /// Set humidity.
    pub fn humidity(mut self, percent: f32) -> Self {
        self.reading.humidity_percent = percent;
        self
    }

    /// Set pressure.
    pub fn pressure(mut self, millibar: f32) -> Self {
        self.reading.pressure_millibar = millibar;
        self
    }

    /// Set the VOC index.
    pub fn voc(mut self, voc: f32) -> Self {
        self.reading.voc_index = voc;
        self
    }

    /// Set the raw ADC value.
    pub fn adc_raw(mut self, adc: u32) -> Self {
        self.reading.adc_raw = adc;
        self
    }

    /// Set the charging state.
    pub fn charging(mut self, charging: bool) -> Self {
        self.reading.charging = charging;
        self
    }

    /// Set the calibration state.
    pub fn calibrating(mut self, calibrating: bool) -> Self {
        self.reading.calibrating = calibrating;
        self
    }

    /// Set the charging-timeout state.
    pub fn charging_timeout(mut self, timeout: bool) -> Self {
        self.reading.charging_timeout = timeout;
        self
    }

    /// Set particulate-matter values and mark the PM subsystem as powered.
    pub fn pm(mut self, pm1: f32, pm25: f32, pm10: f32) -> Self {
        self.reading.pm_power_on = true;
        self.reading.pm1 = pm1;
        self.reading.pm25 = pm25;
        self.reading.pm10 = pm10;
        self
    }

    /// Set whether the PM subsystem is powered.
    pub fn pm_power(mut self, on: bool) -> Self {
        self.reading.pm_power_on = on;
        self
    }

    /// Set the capture timestamp in Unix seconds.
    pub fn observed_at_epoch(mut self, seconds: i64) -> Self {
        self.reading.observed_at_epoch_seconds = seconds;
        self
    }

    /// Set the capture timestamp.
    pub fn observed_at(mut self, timestamp: time::OffsetDateTime) -> Self {
        self.reading.observed_at_epoch_seconds = timestamp.unix_timestamp();
        self
    }

    /// Set the signal strength.
    pub fn rssi(mut self, rssi: i16) -> Self {
        self.reading.rssi = Some(rssi);
        self
    }

    /// Attach the raw payload, stored as lowercase hex.
    pub fn raw_payload(mut self, payload: &[u8]) -> Self {
        self.reading.raw = Some(to_hex(payload));
        self
    }

    /// Build the reading without validation.
    #[must_use]
    pub fn build(self) -> Reading {
        self.reading
    }

    /// Build the reading with validation.
    ///
    /// Validates:
    /// - `device_id` is not empty
    /// - `battery_percent` is 0-100
    /// - `humidity_percent` is 0-100
    /// - `temperature_c` is within the sensor range (-40 to 85°C)
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingField`] for an empty device id and
    /// [`ParseError::InvalidValue`] for out-of-range measurements.
    pub fn try_build(self) -> Result<Reading, ParseError> {
        let r = &self.reading;

        if r.device_id.is_empty() {
            return Err(ParseError::MissingField("device_id"));
        }

        if r.battery_percent > 100 {
            return Err(ParseError::InvalidValue(format!(
                "battery {} exceeds maximum of 100",
                r.battery_percent
            )));
        }

        if !(0.0..=100.0).contains(&r.humidity_percent) {
            return Err(ParseError::InvalidValue(format!(
                "humidity {} is outside valid range (0-100%)",
                r.humidity_percent
            )));
        }

        if !(MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&r.temperature_c) {
            return Err(ParseError::InvalidValue(format!(
                "temperature {} is outside valid range ({} to {}°C)",
                r.temperature_c, MIN_TEMPERATURE_C, MAX_TEMPERATURE_C
            )));
        }

        Ok(self.reading)
    }
}

const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

/// Render bytes as a lowercase hex string.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX_CHARS[usize::from(b >> 4)] as char);
        out.push(HEX_CHARS[usize::from(b & 0x0f)] as char);
    }
    out
}
