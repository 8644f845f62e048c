//! Decoder seam between a scanner and the registry.
//!
//! Payload decoding is provided from outside this crate: a scanner hands
//! every received [`Advertisement`] to a [`Decoder`], which either produces a
//! fully populated [`Reading`] or rejects the advertisement as coming from an
//! unrelated device. Rejection is the normal case in a busy radio
//! environment and is not an error.
//!
//! [`JsonDecoder`] replays readings that an external decoder recorded as JSON,
//! which is what the `atmotube` CLI feeds from files or pipes.

use bytes::Bytes;
use tracing::trace;

use atmotube_types::Reading;

use crate::error::Result;

/// One raw beacon advertisement as delivered by a scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Hardware address of the sender.
    pub address: String,
    /// Advertised local name, if any.
    pub name: Option<String>,
    /// Signal strength in dBm.
    pub rssi: Option<i16>,
    /// Manufacturer payload.
    pub payload: Bytes,
    /// Unix timestamp (seconds) at which the advertisement was received.
    pub received_at_epoch_seconds: i64,
}

impl Advertisement {
    /// Create an advertisement received now.
    pub fn new(address: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            address: address.into(),
            name: None,
            rssi: None,
            payload: payload.into(),
            received_at_epoch_seconds: time::OffsetDateTime::now_utc().unix_timestamp(),
        }
    }

    /// Set the advertised name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the signal strength.
    #[must_use]
    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }

    /// Set the receive timestamp.
    #[must_use]
    pub fn received_at(mut self, epoch_seconds: i64) -> Self {
        self.received_at_epoch_seconds = epoch_seconds;
        self
    }
}

/// Turns advertisements into readings.
///
/// Implementations must be cheap and non-blocking; they run on the
/// scanner's delivery path. Returning `None` means "not an Atmotube".
/// Output is trusted without revalidation.
pub trait Decoder: Send + Sync {
    /// Decode one advertisement.
    fn decode(&self, advertisement: &Advertisement) -> Option<Reading>;
}

impl<F> Decoder for F
where
    F: Fn(&Advertisement) -> Option<Reading> + Send + Sync,
{
    fn decode(&self, advertisement: &Advertisement) -> Option<Reading> {
        self(advertisement)
    }
}

/// Decoder for readings recorded as JSON objects.
///
/// The payload must be a UTF-8 JSON [`Reading`]. Fields the recording left
/// unset are completed from the advertisement: an empty `device_id` takes
/// the sender address, a zero timestamp takes the receive time, and a
/// missing RSSI takes the scanner's value.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    /// Create a JSON decoder.
    pub fn new() -> Self {
        Self
    }

    /// Parse one recorded reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`](crate::Error::InvalidData) if the text
    /// is not a JSON reading.
    pub fn parse(text: &str) -> Result<Reading> {
        Ok(serde_json::from_str(text.trim())?)
    }
}

impl Decoder for JsonDecoder {
    fn decode(&self, advertisement: &Advertisement) -> Option<Reading> {
        let mut reading: Reading = match serde_json::from_slice(&advertisement.payload) {
            Ok(reading) => reading,
            Err(e) => {
                trace!(address = %advertisement.address, error = %e, "Rejected advertisement");
                return None;
            }
        };
        if reading.device_id.is_empty() {
            reading.device_id = advertisement.address.clone();
        }
        if reading.observed_at_epoch_seconds == 0 {
            reading.observed_at_epoch_seconds = advertisement.received_at_epoch_seconds;
        }
        if reading.rssi.is_none() {
            reading.rssi = advertisement.rssi;
        }
        Some(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atmotube_types::HardwareVariant;

    #[test]
    fn test_advertisement_builder() {
        let adv = Advertisement::new("AA:BB", vec![1u8, 2, 3])
            .with_name("ATMOTUBE")
            .with_rssi(-61)
            .received_at(1_000);
        assert_eq!(adv.address, "AA:BB");
        assert_eq!(adv.name.as_deref(), Some("ATMOTUBE"));
        assert_eq!(adv.rssi, Some(-61));
        assert_eq!(adv.payload.as_ref(), &[1, 2, 3]);
        assert_eq!(adv.received_at_epoch_seconds, 1_000);
    }

    #[test]
    fn test_closure_decoder() {
        let decoder = |adv: &Advertisement| {
            (adv.name.as_deref() == Some("ATMOTUBE"))
                .then(|| Reading::new(adv.address.clone(), HardwareVariant::Gen3))
        };

        let hit = Advertisement::new("AA:BB", Bytes::new()).with_name("ATMOTUBE");
        let miss = Advertisement::new("CC:DD", Bytes::new()).with_name("Headphones");

        assert_eq!(decoder.decode(&hit).unwrap().device_id, "AA:BB");
        assert!(decoder.decode(&miss).is_none());
    }

    #[test]
    fn test_json_decoder_fills_from_advertisement() {
        let payload = r#"{"device_id":"","hardware_variant":"Gen4","voc_index":0.4}"#;
        let adv = Advertisement::new("AA:BB", payload.as_bytes().to_vec())
            .with_rssi(-70)
            .received_at(1_234);

        let reading = JsonDecoder::new().decode(&adv).unwrap();
        assert_eq!(reading.device_id, "AA:BB");
        assert_eq!(reading.hardware_variant, HardwareVariant::Gen4);
        assert_eq!(reading.observed_at_epoch_seconds, 1_234);
        assert_eq!(reading.rssi, Some(-70));
    }

    #[test]
    fn test_json_decoder_keeps_recorded_values() {
        let payload = r#"{"device_id":"CC:DD","observed_at_epoch_seconds":50,"rssi":-40}"#;
        let adv = Advertisement::new("AA:BB", payload.as_bytes().to_vec())
            .with_rssi(-70)
            .received_at(1_234);

        let reading = JsonDecoder.decode(&adv).unwrap();
        assert_eq!(reading.device_id, "CC:DD");
        assert_eq!(reading.observed_at_epoch_seconds, 50);
        assert_eq!(reading.rssi, Some(-40));
    }

    #[test]
    fn test_json_decoder_rejects_garbage() {
        let adv = Advertisement::new("AA:BB", vec![0x02, 0x01, 0x06]);
        assert!(JsonDecoder.decode(&adv).is_none());
    }

    #[test]
    fn test_json_parse() {
        let reading = JsonDecoder::parse("  {\"device_id\":\"AA\"}\n").unwrap();
        assert_eq!(reading.device_id, "AA");

        let err = JsonDecoder::parse("{not json").unwrap_err();
        assert!(matches!(err, crate::Error::InvalidData(_)));
    }
}
