//! Broadcast channel for achievement recomputation requests.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel and is the
//! production [`AchievementNotifier`]: every notification becomes a
//! [`ProgressEvent`] delivered to all subscribers.

use chrono::Utc;
use tokio::sync::broadcast;

use super::{AchievementNotifier, GameId, PlayerId, ProgressEvent};

/// Broadcast bus for [`ProgressEvent`]s.
///
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers. Publishing with no receivers silently drops the event.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    pub fn publish(&self, event: ProgressEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl AchievementNotifier for EventBus {
    fn selected_progress(&self, game: GameId, player: PlayerId) {
        let delivered = self.publish(ProgressEvent::SelectedProgress {
            game,
            player,
            timestamp: Utc::now(),
        });
        log_delivery(delivered, "selected progress requested");
        tracing::debug!(%game, %player, delivered, "selected progress requested");
    }

    fn total_progress(&self, game: GameId) {
        let delivered = self.publish(ProgressEvent::TotalProgress {
            game,
            timestamp: Utc::now(),
        });
        log_delivery(delivered, "total progress requested");
        tracing::debug!(%game, delivered, "total progress requested");
    }
}

fn log_delivery(delivered: usize, request: &'static str) {
    if delivered == 0 {
        tracing::warn!(request, "no achievement subscriber; request dropped");
    }
}
