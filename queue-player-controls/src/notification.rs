use queue_player_models::{QueueState, TrackRef};
use tokio::sync::broadcast::{self, Receiver, Sender};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Dispatched { track: TrackRef },
    Started { track: TrackRef },
    Ended { track: TrackRef, forced: bool },
    Status { state: QueueState },
    QueueChanged { size: usize },
    Error(String),
}

const CAPACITY: usize = 20;

/// Fan-out of [`Notification`]s to any number of observers. Slow observers
/// lag and skip ahead; nothing blocks the coordinator.
#[derive(Debug)]
pub struct NotificationBroadcast {
    sender: Sender<Notification>,
    // Held so that sends succeed while nobody is subscribed.
    keepalive: Receiver<Notification>,
}

impl NotificationBroadcast {
    pub fn new() -> Self {
        let (sender, keepalive) = broadcast::channel(CAPACITY);
        Self { sender, keepalive }
    }

    pub fn subscribe(&self) -> Receiver<Notification> {
        self.keepalive.resubscribe()
    }

    pub(crate) fn notify(&self, notification: Notification) {
        if let Err(error) = self.sender.send(notification) {
            tracing::debug!(notification = ?error.0, "dropped notification");
        }
    }

    pub(crate) fn send_error(&self, message: String) {
        self.notify(Notification::Error(message));
    }
}

impl Default for NotificationBroadcast {
    fn default() -> Self {
        Self::new()
    }
}
