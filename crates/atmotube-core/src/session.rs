//! Ingest session tying a decoder to the registry and notifier.
//!
//! A [`ScanSession`] is what the owner of a scan subscription holds. It
//! receives advertisements from any number of producer tasks or threads,
//! decodes them with the injected [`Decoder`], upserts accepted readings and
//! publishes one [`RenderInstruction`](crate::RenderInstruction) per accepted
//! reading. Nothing in the session reaches into global state; the registry
//! and notifier are built independently and handed in.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use atmotube_core::{
//!     ChangeNotifier, DeviceRegistry, MockDecoder, ScanSession, SessionOptions,
//! };
//! use atmotube_types::HardwareVariant;
//!
//! let decoder = Arc::new(MockDecoder::new());
//! let address = decoder.add_device(HardwareVariant::Gen3);
//!
//! let session = ScanSession::new(
//!     decoder.clone(),
//!     Arc::new(DeviceRegistry::new()),
//!     ChangeNotifier::default(),
//!     SessionOptions::default(),
//! );
//!
//! let event = session.ingest(&decoder.advertisement(&address))?;
//! assert!(event.is_some_and(|e| e.is_insert()));
//! assert_eq!(session.stats().inserted, 1);
//! # Ok::<(), atmotube_core::Error>(())
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use crate::decoder::{Advertisement, Decoder};
use crate::error::{Error, Result};
use crate::events::{ChangeEvent, ChangeNotifier, DEFAULT_CHANNEL_CAPACITY, RenderReceiver};
use crate::registry::DeviceRegistry;

/// Options for a [`ScanSession`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Broadcast capacity used by [`ScanSession::with_decoder`].
    pub channel_capacity: usize,
    /// Emit a trace event for every rejected advertisement.
    pub log_rejections: bool,
    /// Only accept advertisements from these addresses (empty = all).
    pub device_filter: Vec<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            log_rejections: false,
            device_filter: Vec::new(),
        }
    }
}

impl SessionOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the broadcast channel capacity.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Enable or disable tracing of rejected advertisements.
    pub fn log_rejections(mut self, enable: bool) -> Self {
        self.log_rejections = enable;
        self
    }

    /// Restrict the session to specific addresses.
    pub fn filter_devices(mut self, device_ids: Vec<String>) -> Self {
        self.device_filter = device_ids;
        self
    }
}

/// Counter snapshot for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Advertisements handed to the session.
    pub received: u64,
    /// Advertisements rejected by the filter or the decoder.
    pub rejected: u64,
    /// Readings that added a new device.
    pub inserted: u64,
    /// Readings that replaced a known device's state.
    pub updated: u64,
    /// Readings the registry refused.
    pub failed: u64,
}

impl SessionStats {
    /// Readings that reached the registry.
    pub fn accepted(&self) -> u64 {
        self.inserted + self.updated
    }
}

#[derive(Debug, Default)]
struct AtomicSessionStats {
    received: AtomicU64,
    rejected: AtomicU64,
    inserted: AtomicU64,
    updated: AtomicU64,
    failed: AtomicU64,
}

impl AtomicSessionStats {
    fn record(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SessionStats {
        SessionStats {
            received: self.received.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            inserted: self.inserted.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Decode → upsert → notify pipeline for one scanning session.
pub struct ScanSession {
    decoder: Arc<dyn Decoder>,
    registry: Arc<DeviceRegistry>,
    notifier: ChangeNotifier,
    options: SessionOptions,
    stats: AtomicSessionStats,
    closed: AtomicBool,
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("devices", &self.registry.len())
            .field("subscribers", &self.notifier.subscriber_count())
            .field("options", &self.options)
            .field("stats", &self.stats.snapshot())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl ScanSession {
    /// Create a session from independently constructed parts.
    pub fn new(
        decoder: Arc<dyn Decoder>,
        registry: Arc<DeviceRegistry>,
        notifier: ChangeNotifier,
        options: SessionOptions,
    ) -> Self {
        Self {
            decoder,
            registry,
            notifier,
            options,
            stats: AtomicSessionStats::default(),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a session with a fresh registry and notifier.
    pub fn with_decoder(decoder: impl Decoder + 'static, options: SessionOptions) -> Self {
        let notifier = ChangeNotifier::new(options.channel_capacity);
        Self::new(
            Arc::new(decoder),
            Arc::new(DeviceRegistry::new()),
            notifier,
            options,
        )
    }

    /// Registry backing this session.
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    /// Notifier publishing this session's render instructions.
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Subscribe to render instructions.
    pub fn subscribe(&self) -> RenderReceiver {
        self.notifier.subscribe()
    }

    /// Current counters.
    pub fn stats(&self) -> SessionStats {
        self.stats.snapshot()
    }

    /// Stop accepting advertisements.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::Relaxed) {
            info!("Scan session closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    fn accepts(&self, address: &str) -> bool {
        self.options.device_filter.is_empty()
            || self.options.device_filter.iter().any(|id| id == address)
    }

    /// Process one advertisement.
    ///
    /// Returns `Ok(None)` when the advertisement was rejected by the device
    /// filter or the decoder; rejections are not errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] after [`close`](Self::close), or the
    /// registry's error if the decoded reading is unusable.
    pub fn ingest(&self, advertisement: &Advertisement) -> Result<Option<ChangeEvent>> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        self.stats.record(&self.stats.received);

        let decoded = if self.accepts(&advertisement.address) {
            self.decoder.decode(advertisement)
        } else {
            None
        };
        let Some(reading) = decoded else {
            self.stats.record(&self.stats.rejected);
            if self.options.log_rejections {
                trace!(address = %advertisement.address, "Ignoring advertisement");
            }
            return Ok(None);
        };

        match self.registry.upsert_and_notify(reading, &self.notifier) {
            Ok((event, _)) => {
                let counter = if event.is_insert() {
                    &self.stats.inserted
                } else {
                    &self.stats.updated
                };
                self.stats.record(counter);
                Ok(Some(event))
            }
            Err(e) => {
                self.stats.record(&self.stats.failed);
                Err(e)
            }
        }
    }

    /// Ingest every advertisement of `stream` until it ends or `cancel`
    /// fires.
    ///
    /// Per-advertisement failures are logged and do not stop the session.
    pub async fn drive<S>(&self, stream: S, cancel: &CancellationToken) -> SessionStats
    where
        S: Stream<Item = Advertisement>,
    {
        info!("Starting scan session");
        let mut stream = std::pin::pin!(stream);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Scan session cancelled");
                    break;
                }
                next = stream.next() => {
                    let Some(advertisement) = next else {
                        info!("Advertisement source closed");
                        break;
                    };
                    match self.ingest(&advertisement) {
                        Ok(_) => {}
                        Err(Error::SessionClosed) => break,
                        Err(e) => warn!(address = %advertisement.address, "Dropped reading: {}", e),
                    }
                }
            }
        }

        let stats = self.stats();
        info!(
            received = stats.received,
            devices = self.registry.len(),
            "Scan session stopped"
        );
        stats
    }

    /// Spawn a task that ingests from `rx` until the channel closes or
    /// `cancel` fires.
    ///
    /// The task resolves to the final counters.
    pub fn run(
        self: &Arc<Self>,
        rx: mpsc::Receiver<Advertisement>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<SessionStats> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let stream = futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|adv| (adv, rx))
            });
            session.drive(stream, &cancel).await
        })
    }
}
