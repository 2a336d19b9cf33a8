use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use queue_player_models::TrackRef;

/// Play time of the track in progress. Stops accumulating while paused.
#[derive(Debug, Default)]
pub(crate) struct PlayTimer {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl PlayTimer {
    pub(crate) fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
        self.start_time = Some(Instant::now());
    }

    pub(crate) fn resume(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
    }

    pub(crate) fn pause(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        match self.start_time {
            Some(start) => self.elapsed + start.elapsed(),
            None => self.elapsed,
        }
    }

    /// Resets the timer, returning what had accumulated.
    pub(crate) fn finish(&mut self) -> Duration {
        let elapsed = self.elapsed();
        self.start_time = None;
        self.elapsed = Duration::ZERO;
        elapsed
    }
}

/// Counters only ever grow. `tracks_skipped` is bumped together with
/// `tracks_played`, so it can never overtake it.
///
/// The timer belongs to whichever track started last. Ends reported for any
/// other track are counted but leave the timer running.
#[derive(Debug, Default)]
pub(crate) struct Statistics {
    pub(crate) tracks_played: u32,
    pub(crate) tracks_skipped: u32,
    pub(crate) max_queue_size: usize,
    total_play_time: Duration,
    timer: PlayTimer,
    timed_track: Option<TrackRef>,
    started_at: Option<DateTime<Utc>>,
}

impl Statistics {
    pub(crate) fn track_started(&mut self, track: &TrackRef) {
        self.total_play_time += self.timer.finish();
        self.timer.restart();
        self.timed_track = Some(track.clone());
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn track_ended(&mut self, track: &TrackRef, forced: bool) {
        self.tracks_played += 1;
        if forced {
            self.tracks_skipped += 1;
        }

        if self.timed_track.as_ref() == Some(track) {
            self.total_play_time += self.timer.finish();
            self.timed_track = None;
            self.started_at = None;
        }
    }

    pub(crate) fn paused(&mut self) {
        self.timer.pause();
    }

    pub(crate) fn resumed(&mut self) {
        self.timer.resume();
    }

    pub(crate) fn observe_queue_size(&mut self, size: usize) {
        self.max_queue_size = self.max_queue_size.max(size);
    }

    pub(crate) fn tracks_completed(&self) -> u32 {
        self.tracks_played - self.tracks_skipped
    }

    /// Finished play time plus whatever the current track has accumulated.
    pub(crate) fn total_play_time(&self) -> Duration {
        self.total_play_time + self.timer.elapsed()
    }

    pub(crate) fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }
}
