//! Property and concurrency tests for the device registry.
//!
//! Run with: `cargo test --package atmotube-core --test registry_properties`

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use atmotube_core::{ChangeEvent, ChangeNotifier, DeviceRegistry, RenderInstruction};
use atmotube_types::{HardwareVariant, Reading};
use proptest::prelude::*;

fn reading(id: &str, voc: f32) -> Reading {
    Reading::builder(id)
        .variant(HardwareVariant::Gen3)
        .voc(voc)
        .build()
}

/// Sequences of upserts drawn from a small id pool so repeats are common.
fn upsert_sequence() -> impl Strategy<Value = Vec<(String, f32)>> {
    prop::collection::vec(("[A-F]{1,2}", 0.0f32..10.0), 0..200)
}

proptest! {
    /// One entry per distinct id, and size equals the distinct count.
    #[test]
    fn upsert_keeps_one_entry_per_device(seq in upsert_sequence()) {
        let registry = DeviceRegistry::new();
        for (id, voc) in &seq {
            registry.upsert(reading(id, *voc)).unwrap();
        }

        let mut distinct: Vec<&String> = seq.iter().map(|(id, _)| id).collect();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(registry.len(), distinct.len());

        let mut ids = registry.device_ids();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), registry.len());
    }

    /// First sighting inserts at the end; every later sighting updates at
    /// the original position.
    #[test]
    fn events_match_first_sighting(seq in upsert_sequence()) {
        let registry = DeviceRegistry::new();
        let mut first_position: HashMap<String, usize> = HashMap::new();

        for (id, voc) in &seq {
            let event = registry.upsert(reading(id, *voc)).unwrap();
            match first_position.get(id) {
                None => {
                    prop_assert_eq!(event, ChangeEvent::Inserted { position: first_position.len() });
                    first_position.insert(id.clone(), event.position());
                }
                Some(&position) => {
                    prop_assert_eq!(event, ChangeEvent::Updated { position });
                }
            }
        }

        for (id, position) in &first_position {
            prop_assert_eq!(registry.position_of(id), Some(*position));
            prop_assert_eq!(&registry.get(*position).unwrap().device_id, id);
        }
    }

    /// The stored reading is always the most recent one for that id.
    #[test]
    fn latest_reading_wins(seq in upsert_sequence()) {
        let registry = DeviceRegistry::new();
        let mut latest: HashMap<String, f32> = HashMap::new();
        for (id, voc) in &seq {
            registry.upsert(reading(id, *voc)).unwrap();
            latest.insert(id.clone(), *voc);
        }

        for (id, voc) in latest {
            prop_assert_eq!(registry.get_by_id(&id).unwrap().voc_index, voc);
        }
    }

    /// Positions outside `[0, len)` always fail.
    #[test]
    fn get_out_of_range_fails(count in 0usize..20, extra in 0usize..5) {
        let registry = DeviceRegistry::new();
        for i in 0..count {
            registry.upsert(reading(&format!("dev-{i}"), 0.0)).unwrap();
        }
        prop_assert!(registry.get(count + extra).is_err());
        if count > 0 {
            prop_assert!(registry.get(count - 1).is_ok());
        }
    }
}

#[test]
fn concurrent_distinct_upserts_all_land() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;

    let registry = Arc::new(DeviceRegistry::new());
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let event = registry
                        .upsert(reading(&format!("T{t}-{i}"), 0.0))
                        .unwrap();
                    assert!(event.is_insert());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), THREADS * PER_THREAD);
    let mut ids = registry.device_ids();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), THREADS * PER_THREAD);
}

#[test]
fn concurrent_updates_never_duplicate() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 100;
    let shared_ids = ["AA", "BB", "CC", "DD"];

    let registry = Arc::new(DeviceRegistry::new());
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    let id = shared_ids[(t + round) % shared_ids.len()];
                    registry.upsert(reading(id, round as f32)).unwrap();
                    // Reader interleaved with writers
                    let len = registry.len();
                    assert!(len <= shared_ids.len());
                    for position in 0..len {
                        registry.get(position).unwrap();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), shared_ids.len());
    for id in shared_ids {
        assert!(registry.position_of(id).is_some());
    }
}

#[test]
fn concurrent_notifications_follow_mutation_order() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 25;

    let registry = Arc::new(DeviceRegistry::new());
    let notifier = ChangeNotifier::new(THREADS * PER_THREAD * 2);
    let mut rx = notifier.subscribe();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let notifier = notifier.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    registry
                        .upsert_and_notify(reading(&format!("T{t}-{i}"), 0.0), &notifier)
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Inserts must arrive with strictly increasing positions
    for expected in 0..THREADS * PER_THREAD {
        assert_eq!(
            rx.try_recv().unwrap(),
            RenderInstruction::InsertRow { position: expected }
        );
    }
    assert!(rx.try_recv().is_err());
}
