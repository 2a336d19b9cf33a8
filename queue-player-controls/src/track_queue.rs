use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use queue_player_models::{QueuedTrack, TrackRef};
use uuid::Uuid;

/// Unbounded FIFO of tracks waiting to be played.
///
/// Every operation takes the internal lock once, so each call is atomic on
/// its own. Nothing spans more than one call.
#[derive(Debug, Default)]
pub struct TrackQueue {
    entries: Mutex<VecDeque<QueuedTrack>>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Default::default()
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<QueuedTrack>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, track: QueuedTrack) {
        self.entries().push_back(track);
    }

    /// Appends all tracks in order and returns the queue size afterwards.
    pub fn enqueue_all(&self, tracks: impl IntoIterator<Item = QueuedTrack>) -> usize {
        let mut entries = self.entries();
        entries.extend(tracks);
        entries.len()
    }

    pub fn peek_next(&self) -> Option<QueuedTrack> {
        self.entries().front().cloned()
    }

    pub fn dequeue(&self) -> Option<QueuedTrack> {
        self.entries().pop_front()
    }

    pub fn size(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Removes every entry matching `predicate`, returning how many went.
    pub fn remove(&self, mut predicate: impl FnMut(&QueuedTrack) -> bool) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|entry| !predicate(entry));
        before - entries.len()
    }

    pub fn snapshot(&self) -> Vec<QueuedTrack> {
        self.entries().iter().cloned().collect()
    }
}

/// Builds queue entry ids of the form `<namespace>:queue:<name>:<uuid>`.
#[derive(Debug, Clone)]
pub(crate) struct EntryIds {
    prefix: String,
}

impl EntryIds {
    pub(crate) fn new(namespace: &str, queue_name: &str) -> Self {
        Self {
            prefix: format!("{namespace}:queue:{queue_name}"),
        }
    }

    pub(crate) fn entry(&self, track: TrackRef) -> QueuedTrack {
        QueuedTrack {
            id: format!("{}:{}", self.prefix, Uuid::new_v4()),
            track,
        }
    }
}
