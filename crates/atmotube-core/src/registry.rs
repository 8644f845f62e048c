//! Deduplicated, insertion-ordered store of the latest reading per device.
//!
//! The registry is shared between the producer side (decoder callbacks,
//! possibly several at once) and a render layer that enumerates rows by
//! position. All operations go through one [`RwLock`]; the position index is
//! only ever touched while the write guard is held, so readers never see a
//! sequence and index that disagree.
//!
//! # Example
//!
//! ```
//! use atmotube_core::{ChangeEvent, DeviceRegistry};
//! use atmotube_types::{HardwareVariant, Reading};
//!
//! let registry = DeviceRegistry::new();
//!
//! let first = Reading::new("AA:01", HardwareVariant::Gen4);
//! assert_eq!(registry.upsert(first)?, ChangeEvent::Inserted { position: 0 });
//!
//! let newer = Reading::builder("AA:01").voc(0.8).build();
//! assert_eq!(registry.upsert(newer)?, ChangeEvent::Updated { position: 0 });
//! assert_eq!(registry.len(), 1);
//! # Ok::<(), atmotube_core::Error>(())
//! ```

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use atmotube_types::Reading;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::events::{ChangeEvent, ChangeNotifier, RenderInstruction};

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<Reading>,
    index: HashMap<String, usize>,
}

impl Inner {
    fn upsert(&mut self, reading: Reading) -> ChangeEvent {
        if let Some(&position) = self.index.get(&reading.device_id) {
            trace!(device_id = %reading.device_id, position, "Updated device");
            self.entries[position] = reading;
            ChangeEvent::Updated { position }
        } else {
            let position = self.entries.len();
            debug!(device_id = %reading.device_id, position, "Discovered new device");
            self.index.insert(reading.device_id.clone(), position);
            self.entries.push(reading);
            ChangeEvent::Inserted { position }
        }
    }
}

/// Thread-safe registry holding one current [`Reading`] per device.
///
/// Devices keep the position at which they were first seen for the lifetime
/// of the registry. Identity is exact string equality on `device_id`; no
/// case or whitespace normalization is applied.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    inner: RwLock<Inner>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner
            .read()
            .expect("registry lock poisoned - a thread panicked while holding the lock")
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner
            .write()
            .expect("registry lock poisoned - a thread panicked while holding the lock")
    }

    /// Insert a new device or replace the reading of a known one.
    ///
    /// Returns exactly one [`ChangeEvent`]: `Inserted` at the new last
    /// position for a first sighting, `Updated` at the original position
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDeviceId`] if the reading has no identity. The
    /// registry is left untouched.
    pub fn upsert(&self, reading: Reading) -> Result<ChangeEvent> {
        if reading.device_id.is_empty() {
            return Err(Error::EmptyDeviceId);
        }
        Ok(self.write().upsert(reading))
    }

    /// Upsert and publish the resulting render instruction.
    ///
    /// The instruction is sent before the write guard is released, so
    /// subscribers observe instructions in the same order the registry was
    /// mutated even with several concurrent producers.
    pub fn upsert_and_notify(
        &self,
        reading: Reading,
        notifier: &ChangeNotifier,
    ) -> Result<(ChangeEvent, RenderInstruction)> {
        if reading.device_id.is_empty() {
            return Err(Error::EmptyDeviceId);
        }
        let mut inner = self.write();
        let event = inner.upsert(reading);
        let instruction = notifier.notify(event);
        drop(inner);
        Ok((event, instruction))
    }

    /// Number of distinct devices seen.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Alias of [`len`](Self::len).
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Whether no device has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Latest reading at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `position >= len()` at the instant of
    /// the call.
    pub fn get(&self, position: usize) -> Result<Reading> {
        let inner = self.read();
        inner
            .entries
            .get(position)
            .cloned()
            .ok_or_else(|| Error::out_of_range(position, inner.entries.len()))
    }

    /// Latest reading for `device_id`, if the device is known.
    pub fn get_by_id(&self, device_id: &str) -> Option<Reading> {
        let inner = self.read();
        inner
            .index
            .get(device_id)
            .map(|&position| inner.entries[position].clone())
    }

    /// Position of `device_id`, if the device is known.
    pub fn position_of(&self, device_id: &str) -> Option<usize> {
        self.read().index.get(device_id).copied()
    }

    /// Consistent copy of every entry in insertion order.
    ///
    /// Used for full-list renders such as initial population or recovery
    /// after a lagged subscription.
    pub fn snapshot(&self) -> Vec<Reading> {
        self.read().entries.clone()
    }

    /// Device ids in insertion order.
    pub fn device_ids(&self) -> Vec<String> {
        self.read()
            .entries
            .iter()
            .map(|r| r.device_id.clone())
            .collect()
    }
}
