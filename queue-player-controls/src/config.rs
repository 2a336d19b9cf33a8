use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Start playing as soon as something is queued onto an idle queue.
    pub auto_play: bool,
    /// How long the control loop waits for an advance before polling again.
    pub advance_poll_interval: Duration,
    pub namespace: String,
    pub queue_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            auto_play: true,
            advance_poll_interval: Duration::from_secs(100),
            namespace: "queue-player".into(),
            queue_name: "default".into(),
        }
    }
}
