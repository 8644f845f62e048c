//! Mock decoder for testing.
//!
//! [`MockDecoder`] stands in for a real payload decoder: it answers from a
//! table of canned readings keyed by sender address and rejects everything
//! else, the way a real decoder ignores non-Atmotube advertisements.
//!
//! # Features
//!
//! - **Canned readings**: register per-address readings, replace them at any time
//! - **Call accounting**: count decode calls and rejections
//! - **Advertisement factory**: build advertisements for registered devices

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;

use atmotube_types::{HardwareVariant, Reading};

use crate::decoder::{Advertisement, Decoder};

/// A table-driven decoder for tests and demos.
///
/// # Example
///
/// ```
/// use atmotube_core::{Advertisement, Decoder, MockDecoder};
/// use atmotube_types::HardwareVariant;
///
/// let decoder = MockDecoder::new();
/// let address = decoder.add_device(HardwareVariant::Gen4);
///
/// assert!(decoder.decode(&decoder.advertisement(&address)).is_some());
/// assert!(decoder.decode(&Advertisement::new("00:00:00:00:00:00", vec![])).is_none());
/// assert_eq!(decoder.decode_count(), 2);
/// assert_eq!(decoder.reject_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockDecoder {
    readings: RwLock<HashMap<String, Reading>>,
    decode_count: AtomicU32,
    reject_count: AtomicU32,
}

impl MockDecoder {
    /// Create a decoder that rejects everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a random hardware address.
    pub fn random_address() -> String {
        let bytes: [u8; 6] = rand::random();
        bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Register a device with a random address and a default reading.
    ///
    /// Returns the generated address.
    pub fn add_device(&self, variant: HardwareVariant) -> String {
        let address = Self::random_address();
        self.set_reading(Reading::new(address.clone(), variant));
        address
    }

    /// Register or replace the canned reading for `reading.device_id`.
    pub fn set_reading(&self, reading: Reading) {
        self.readings
            .write()
            .expect("mock decoder lock poisoned - a thread panicked while holding the lock")
            .insert(reading.device_id.clone(), reading);
    }

    /// Stop decoding advertisements from `address`.
    pub fn remove(&self, address: &str) -> Option<Reading> {
        self.readings
            .write()
            .expect("mock decoder lock poisoned - a thread panicked while holding the lock")
            .remove(address)
    }

    /// Build an advertisement from `address` with an empty payload.
    pub fn advertisement(&self, address: &str) -> Advertisement {
        Advertisement::new(address, Bytes::new())
    }

    /// Number of decode calls so far.
    pub fn decode_count(&self) -> u32 {
        self.decode_count.load(Ordering::Relaxed)
    }

    /// Number of rejected advertisements so far.
    pub fn reject_count(&self) -> u32 {
        self.reject_count.load(Ordering::Relaxed)
    }

    /// Reset both counters.
    pub fn reset_counts(&self) {
        self.decode_count.store(0, Ordering::Relaxed);
        self.reject_count.store(0, Ordering::Relaxed);
    }
}

impl Decoder for MockDecoder {
    fn decode(&self, advertisement: &Advertisement) -> Option<Reading> {
        self.decode_count.fetch_add(1, Ordering::Relaxed);
        let reading = self
            .readings
            .read()
            .expect("mock decoder lock poisoned - a thread panicked while holding the lock")
            .get(&advertisement.address)
            .cloned();

        match reading {
            Some(mut reading) => {
                reading.observed_at_epoch_seconds = advertisement.received_at_epoch_seconds;
                if advertisement.rssi.is_some() {
                    reading.rssi = advertisement.rssi;
                }
                Some(reading)
            }
            None => {
                self.reject_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_address_format() {
        let address = MockDecoder::random_address();
        assert_eq!(address.len(), 17);
        assert_eq!(address.matches(':').count(), 5);
        assert!(
            address
                .split(':')
                .all(|octet| u8::from_str_radix(octet, 16).is_ok())
        );
    }

    #[test]
    fn test_decode_stamps_advertisement_metadata() {
        let decoder = MockDecoder::new();
        decoder.set_reading(Reading::builder("AA:BB").voc(1.5).build());

        let adv = decoder
            .advertisement("AA:BB")
            .with_rssi(-55)
            .received_at(500);
        let reading = decoder.decode(&adv).unwrap();
        assert_eq!(reading.voc_index, 1.5);
        assert_eq!(reading.observed_at_epoch_seconds, 500);
        assert_eq!(reading.rssi, Some(-55));
    }

    #[test]
    fn test_set_reading_replaces() {
        let decoder = MockDecoder::new();
        decoder.set_reading(Reading::builder("AA:BB").voc(1.0).build());
        decoder.set_reading(Reading::builder("AA:BB").voc(2.0).build());

        let reading = decoder.decode(&decoder.advertisement("AA:BB")).unwrap();
        assert_eq!(reading.voc_index, 2.0);
    }

    #[test]
    fn test_remove_and_counters() {
        let decoder = MockDecoder::new();
        let address = decoder.add_device(HardwareVariant::Gen3);
        assert!(decoder.decode(&decoder.advertisement(&address)).is_some());

        assert!(decoder.remove(&address).is_some());
        assert!(decoder.decode(&decoder.advertisement(&address)).is_none());

        assert_eq!(decoder.decode_count(), 2);
        assert_eq!(decoder.reject_count(), 1);

        decoder.reset_counts();
        assert_eq!(decoder.decode_count(), 0);
        assert_eq!(decoder.reject_count(), 0);
    }
}
