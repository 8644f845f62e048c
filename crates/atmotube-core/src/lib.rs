//! Device registry and presentation engine for Atmotube air-quality beacons.
//!
//! This crate sits between a BLE scanner and a render layer. It keeps a
//! deduplicated, order-stable list of the latest [`Reading`] per device,
//! tells render layers which row changed, and derives the text shown for
//! each row.
//!
//! # Features
//!
//! - **Registry**: identity-keyed upsert with stable positions, safe under concurrent producers
//! - **Change events**: one `Inserted`/`Updated` event per upsert, broadcast as render instructions
//! - **Formatter**: variant-aware row text, primary metric and status icons
//! - **Ingest session**: decode → upsert → notify pipeline with counters and cancellation
//! - **Mock decoder**: canned readings for tests and demos
//!
//! # Supported Devices
//!
//! | Variant | Models | Extra fields |
//! |---------|--------|--------------|
//! | Standard | Atmotube 1.0, 2.0 | |
//! | Gen3 | Atmotube PLUS | Pressure, true battery %, voltage |
//! | Gen4 | Atmotube PRO | Gen3 fields plus PM1/PM2.5/PM10 |
//!
//! # Quick Start
//!
//! ```
//! use atmotube_core::{ChangeNotifier, DeviceRegistry, RenderInstruction, RowView};
//! use atmotube_types::{HardwareVariant, Reading};
//!
//! let registry = DeviceRegistry::new();
//! let notifier = ChangeNotifier::default();
//! let mut rx = notifier.subscribe();
//!
//! let reading = Reading::builder("C2:4E:11:0A:9B:01")
//!     .variant(HardwareVariant::Gen4)
//!     .activated(true)
//!     .firmware("740102")
//!     .pm(3.0, 7.5, 11.0)
//!     .build();
//! registry.upsert_and_notify(reading, &notifier)?;
//!
//! // Render layer side
//! if let Ok(RenderInstruction::InsertRow { position }) = rx.try_recv() {
//!     let row = RowView::render(&registry.get(position)?, 0);
//!     assert_eq!(row.line2, "FW 74.01.02, bat 0%");
//! }
//! # Ok::<(), atmotube_core::Error>(())
//! ```

pub mod decoder;
pub mod error;
pub mod events;
pub mod format;
pub mod mock;
pub mod registry;
pub mod session;

pub use atmotube_types::{HardwareVariant, Reading, ReadingBuilder, StatusFlags};

pub use decoder::{Advertisement, Decoder, JsonDecoder};
pub use error::{Error, Result};
pub use events::{
    ChangeEvent, ChangeNotifier, DEFAULT_CHANNEL_CAPACITY, RenderInstruction, RenderReceiver,
    RenderSender,
};
pub use format::{ChargeIcon, Clock, FixedClock, PairingIcon, RowView, SystemClock};
pub use mock::MockDecoder;
pub use registry::DeviceRegistry;
pub use session::{ScanSession, SessionOptions, SessionStats};

/// Type alias for a registry shared between producers and a render layer.
pub type SharedRegistry = std::sync::Arc<DeviceRegistry>;
