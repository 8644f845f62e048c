//! Platform-agnostic telemetry types for Atmotube air-quality beacons.
//!
//! This crate holds the data model shared by decoders, the device registry
//! (atmotube-core) and render layers such as the `atmotube` CLI.
//!
//! # Features
//!
//! - [`Reading`]: one decoded advertisement from one device
//! - [`HardwareVariant`]: Standard (1.0/2.0), Gen3 (PLUS) and Gen4 (PRO)
//! - [`StatusFlags`]: info-byte decoding helper for decoder implementers
//! - [`air_quality_score`]: VOC to Air Quality Score mapping
//!
//! # Example
//!
//! ```
//! use atmotube_types::{HardwareVariant, Reading};
//!
//! let reading = Reading::builder("C2:4E:11:0A:9B:01")
//!     .variant(HardwareVariant::Gen4)
//!     .activated(true)
//!     .voc(0.42)
//!     .pm(3.0, 7.5, 11.0)
//!     .build();
//!
//! assert!(reading.hardware_variant.has_pm_sensor());
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    GeoTag, HardwareVariant, Reading, ReadingBuilder, StatusFlags, UploadRow, air_quality_score,
    round_half_up, to_hex,
};


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The score always lands in 0..=100 for finite input.
        #[test]
        fn air_quality_score_is_bounded(voc in -100.0f32..100.0) {
            let score = air_quality_score(voc);
            prop_assert!(score <= 100);
        }

        /// Legacy battery level stays within the three-bit range; extended firmware reports 0.
        #[test]
        fn status_flags_battery_scale(info: u8) {
            let flags = StatusFlags::from_info_byte(info, Some("720305"));
            prop_assert!((1..=8).contains(&flags.battery_level));
            let flags = StatusFlags::from_info_byte(info, Some("740102"));
            prop_assert_eq!(flags.battery_level, 0);
        }
    }
}
