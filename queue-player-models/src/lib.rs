use std::fmt;

use chrono::{DateTime, Utc};

mod track_ref;

pub use track_ref::{ParseTrackRefError, RefKind, TrackRef};

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct QueuedTrack {
    pub id: String,
    pub track: TrackRef,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueueState::Stopped => "stopped",
            QueueState::Playing => "playing",
            QueueState::Paused => "paused",
        };

        f.write_str(name)
    }
}

#[derive(Default, Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct QueueStatus {
    pub state: QueueState,
    pub tracks_played: u32,
    pub tracks_completed: u32,
    pub tracks_skipped: u32,
    pub total_play_time_seconds: u64,
    pub current_queue_size: usize,
    pub max_queue_size: usize,
    pub current_track_started_at: Option<DateTime<Utc>>,
}

#[derive(Default, Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CurrentQueue {
    pub current_track: Option<TrackRef>,
    pub pending: Vec<QueuedTrack>,
}

impl CurrentQueue {
    pub fn pending_tracks(&self) -> impl Iterator<Item = &TrackRef> {
        self.pending.iter().map(|queued| &queued.track)
    }
}
