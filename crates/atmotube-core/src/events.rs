//! Change events and render notifications.
//!
//! Every successful [`DeviceRegistry::upsert`](crate::DeviceRegistry::upsert)
//! returns exactly one [`ChangeEvent`]. A [`ChangeNotifier`] turns those
//! events into [`RenderInstruction`]s and broadcasts them to any number of
//! render layers, so a list view only has to touch the affected row.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Kind and position of a registry mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A device was seen for the first time and appended at `position`.
    Inserted { position: usize },
    /// A known device's reading was replaced in place at `position`.
    Updated { position: usize },
}

impl ChangeEvent {
    /// Row affected by the mutation.
    pub fn position(&self) -> usize {
        match self {
            ChangeEvent::Inserted { position } | ChangeEvent::Updated { position } => *position,
        }
    }

    /// Whether the mutation added a new row.
    pub fn is_insert(&self) -> bool {
        matches!(self, ChangeEvent::Inserted { .. })
    }
}

/// What a render layer has to do in response to a [`ChangeEvent`].
///
/// There is intentionally no removal instruction: devices are kept for the
/// whole scanning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RenderInstruction {
    /// A new row appeared at `position`. Rows at and after `position` shift;
    /// no replace animation.
    InsertRow { position: usize },
    /// Re-derive and redraw the row at `position`. Row identity and
    /// position are unchanged.
    RedrawRow { position: usize },
}

impl RenderInstruction {
    /// Row the instruction applies to.
    pub fn position(&self) -> usize {
        match self {
            RenderInstruction::InsertRow { position }
            | RenderInstruction::RedrawRow { position } => *position,
        }
    }

    /// Whether the render layer may animate a content replacement.
    pub fn animates_replace(&self) -> bool {
        matches!(self, RenderInstruction::RedrawRow { .. })
    }
}

impl From<ChangeEvent> for RenderInstruction {
    fn from(event: ChangeEvent) -> Self {
        match event {
            ChangeEvent::Inserted { position } => RenderInstruction::InsertRow { position },
            ChangeEvent::Updated { position } => RenderInstruction::RedrawRow { position },
        }
    }
}

/// Sender for render instructions.
pub type RenderSender = broadcast::Sender<RenderInstruction>;

/// Receiver for render instructions.
pub type RenderReceiver = broadcast::Receiver<RenderInstruction>;

/// Default broadcast capacity for a notifier.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Broadcasts render instructions to subscribed render layers.
///
/// Publishing never blocks and succeeds with zero subscribers. A subscriber
/// that falls more than `capacity` instructions behind receives
/// `RecvError::Lagged` and should re-render the full list from
/// [`DeviceRegistry::snapshot`](crate::DeviceRegistry::snapshot).
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: RenderSender,
}

impl ChangeNotifier {
    /// Create a notifier with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to render instructions.
    pub fn subscribe(&self) -> RenderReceiver {
        self.sender.subscribe()
    }

    /// Translate a change event and publish it.
    ///
    /// Returns the instruction that was published.
    pub fn notify(&self, event: ChangeEvent) -> RenderInstruction {
        let instruction = RenderInstruction::from(event);
        // Ignore error if no receivers
        let _ = self.sender.send(instruction);
        instruction
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_event_accessors() {
        let inserted = ChangeEvent::Inserted { position: 3 };
        let updated = ChangeEvent::Updated { position: 1 };
        assert_eq!(inserted.position(), 3);
        assert_eq!(updated.position(), 1);
        assert!(inserted.is_insert());
        assert!(!updated.is_insert());
    }

    #[test]
    fn test_instruction_from_event() {
        let insert = RenderInstruction::from(ChangeEvent::Inserted { position: 2 });
        assert_eq!(insert, RenderInstruction::InsertRow { position: 2 });
        assert!(!insert.animates_replace());

        let redraw = RenderInstruction::from(ChangeEvent::Updated { position: 0 });
        assert_eq!(redraw, RenderInstruction::RedrawRow { position: 0 });
        assert!(redraw.animates_replace());
        assert_eq!(redraw.position(), 0);
    }

    #[test]
    fn test_notify_without_subscribers() {
        let notifier = ChangeNotifier::default();
        assert_eq!(notifier.subscriber_count(), 0);
        let instruction = notifier.notify(ChangeEvent::Inserted { position: 0 });
        assert_eq!(instruction, RenderInstruction::InsertRow { position: 0 });
    }

    #[tokio::test]
    async fn test_notify_reaches_all_subscribers() {
        let notifier = ChangeNotifier::new(8);
        let mut rx1 = notifier.subscribe();
        let mut rx2 = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 2);

        notifier.notify(ChangeEvent::Inserted { position: 0 });
        notifier.notify(ChangeEvent::Updated { position: 0 });

        for rx in [&mut rx1, &mut rx2] {
            assert_eq!(
                rx.recv().await.unwrap(),
                RenderInstruction::InsertRow { position: 0 }
            );
            assert_eq!(
                rx.recv().await.unwrap(),
                RenderInstruction::RedrawRow { position: 0 }
            );
        }
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let notifier = ChangeNotifier::new(0);
        let mut rx = notifier.subscribe();
        notifier.notify(ChangeEvent::Inserted { position: 0 });
        assert_eq!(
            rx.try_recv().unwrap(),
            RenderInstruction::InsertRow { position: 0 }
        );
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&ChangeEvent::Updated { position: 4 }).unwrap();
        assert_eq!(json, r#"{"kind":"updated","position":4}"#);

        let json = serde_json::to_string(&RenderInstruction::InsertRow { position: 1 }).unwrap();
        assert_eq!(json, r#"{"action":"insert_row","position":1}"#);
    }
}
