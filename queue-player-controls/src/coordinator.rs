use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use queue_player_models::{CurrentQueue, QueueState, QueueStatus, QueuedTrack, TrackRef};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, instrument, warn};

use crate::{
    Result,
    advance::AdvanceSignal,
    config::QueueConfig,
    control_loop::ControlLoop,
    engine::{PlaybackEngine, PlaybackListener},
    error::{AlreadyStartedSnafu, InvalidTransitionSnafu},
    notification::{Notification, NotificationBroadcast},
    resolver::TrackResolver,
    statistics::Statistics,
    track_queue::{EntryIds, TrackQueue},
};

/// Everything the listener, the control loop and the public operations
/// share. Lock order is always this state first, then the track queue.
#[derive(Debug, Default)]
struct PlaybackState {
    state: QueueState,
    current_track: Option<TrackRef>,
    statistics: Statistics,
}

enum Dispatch {
    Play(QueuedTrack),
    Stop(TrackRef),
    Idle,
}

/// Owns the pending queue and the playback state machine, and sits between
/// clients and the playback engine.
///
/// Construction has no side effects. [`QueueCoordinator::start`] registers
/// the coordinator as the engine's listener and spawns the control loop.
#[derive(Debug)]
pub struct QueueCoordinator {
    config: QueueConfig,
    engine: Arc<dyn PlaybackEngine>,
    resolver: Arc<dyn TrackResolver>,
    queue: TrackQueue,
    advance: AdvanceSignal,
    playback: Mutex<PlaybackState>,
    entry_ids: EntryIds,
    broadcast: NotificationBroadcast,
    running: AtomicBool,
}

impl QueueCoordinator {
    pub fn new(
        engine: Arc<dyn PlaybackEngine>,
        resolver: Arc<dyn TrackResolver>,
        config: QueueConfig,
    ) -> Self {
        let entry_ids = EntryIds::new(&config.namespace, &config.queue_name);

        Self {
            config,
            engine,
            resolver,
            queue: TrackQueue::new(),
            advance: AdvanceSignal::new(),
            playback: Default::default(),
            entry_ids,
            broadcast: NotificationBroadcast::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Registers with the engine and starts the control loop.
    pub fn start(self: &Arc<Self>) -> Result<ControlLoop> {
        if self.running.swap(true, Ordering::AcqRel) {
            return AlreadyStartedSnafu.fail();
        }

        let listener: Arc<dyn PlaybackListener> = self.clone();
        self.engine.set_listener(Arc::downgrade(&listener));

        Ok(ControlLoop::spawn(self.clone()))
    }

    pub(crate) fn stopped(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn subscribe(&self) -> Receiver<Notification> {
        self.broadcast.subscribe()
    }

    pub(crate) fn advance(&self) -> &AdvanceSignal {
        &self.advance
    }

    fn playback(&self) -> MutexGuard<'_, PlaybackState> {
        self.playback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ignored(&self, action: &'static str, state: QueueState) -> Result<()> {
        debug!(action, %state, "ignoring transition");
        InvalidTransitionSnafu { action, state }.fail()
    }

    /// Queues `refs` in order, expanding albums and playlists in place.
    ///
    /// Expansion happens before anything is queued, so a resolver failure
    /// rejects the whole batch. Returns the number of tracks queued.
    #[instrument(skip(self))]
    pub async fn enqueue(&self, refs: &[TrackRef]) -> Result<usize> {
        let tracks = self.expand(refs).await?;
        let added = tracks.len();

        let size = self
            .queue
            .enqueue_all(tracks.into_iter().map(|track| self.entry_ids.entry(track)));

        let idle = {
            let mut playback = self.playback();
            playback.statistics.observe_queue_size(size);
            playback.current_track.is_none()
        };

        debug!(added, size, "tracks queued");
        self.broadcast.notify(Notification::QueueChanged { size });

        if self.config.auto_play && idle {
            self.advance.signal_advance();
        }

        Ok(added)
    }

    async fn expand(&self, refs: &[TrackRef]) -> Result<Vec<TrackRef>> {
        let mut tracks = Vec::with_capacity(refs.len());

        for track_ref in refs {
            if track_ref.is_track() {
                tracks.push(track_ref.clone());
                continue;
            }

            debug!(%track_ref, kind = %track_ref.kind(), "expanding into tracks");
            let expanded = self.resolver.resolve(track_ref).await?;

            for track in expanded {
                if track.is_track() {
                    tracks.push(track);
                } else {
                    warn!(%track, parent = %track_ref, "resolver returned a non-track, skipping");
                }
            }
        }

        Ok(tracks)
    }

    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<()> {
        let state = self.queue_state();
        if state != QueueState::Playing {
            return self.ignored("pause", state);
        }

        self.engine.pause().await?;

        let paused = {
            let mut playback = self.playback();
            let paused = playback.state == QueueState::Playing;
            if paused {
                playback.state = QueueState::Paused;
                playback.statistics.paused();
            }
            paused
        };

        if paused {
            self.broadcast.notify(Notification::Status {
                state: QueueState::Paused,
            });
        }

        Ok(())
    }

    /// Resumes a paused track, or starts the next one when stopped.
    #[instrument(skip(self))]
    pub async fn play(&self) -> Result<()> {
        match self.queue_state() {
            QueueState::Paused => {
                self.engine.resume().await?;

                let resumed = {
                    let mut playback = self.playback();
                    let resumed = playback.state == QueueState::Paused;
                    if resumed {
                        playback.state = QueueState::Playing;
                        playback.statistics.resumed();
                    }
                    resumed
                };

                if resumed {
                    self.broadcast.notify(Notification::Status {
                        state: QueueState::Playing,
                    });
                }

                Ok(())
            }
            QueueState::Stopped => {
                self.advance.signal_advance();
                Ok(())
            }
            state @ QueueState::Playing => self.ignored("play", state),
        }
    }

    /// Moves on to the next queued track without waiting for the current one
    /// to end. The engine cuts the current track short once told to play the
    /// next one.
    #[instrument(skip(self))]
    pub async fn skip(&self) -> Result<()> {
        match self.queue_state() {
            QueueState::Playing | QueueState::Paused => {
                self.advance.signal_advance();
                Ok(())
            }
            state @ QueueState::Stopped => self.ignored("skip", state),
        }
    }

    /// Removes every pending entry for `track`. Only track references can
    /// match; the current track is never touched.
    #[instrument(skip(self))]
    pub fn delete_queued_track(&self, track: &TrackRef) -> usize {
        if !track.is_track() {
            return 0;
        }

        let removed = self.queue.remove(|queued| queued.track == *track);

        if removed > 0 {
            debug!(removed, "removed queued entries");
            self.broadcast.notify(Notification::QueueChanged {
                size: self.queue.size(),
            });
        }

        removed
    }

    pub fn queue_state(&self) -> QueueState {
        self.playback().state
    }

    pub fn queue_status(&self) -> QueueStatus {
        let playback = self.playback();
        let statistics = &playback.statistics;

        QueueStatus {
            state: playback.state,
            tracks_played: statistics.tracks_played,
            tracks_completed: statistics.tracks_completed(),
            tracks_skipped: statistics.tracks_skipped,
            total_play_time_seconds: statistics.total_play_time().as_secs(),
            current_queue_size: self.queue.size(),
            max_queue_size: statistics.max_queue_size,
            current_track_started_at: statistics.started_at(),
        }
    }

    pub fn current_queue(&self) -> CurrentQueue {
        let playback = self.playback();

        CurrentQueue {
            current_track: playback.current_track.clone(),
            pending: self.queue.snapshot(),
        }
    }

    /// One pass of the control loop after a wake-up.
    ///
    /// The advance token is consumed under the same lock that dequeues and
    /// sets the current track, so an end-of-track callback either lands
    /// before (and coalesces with the pending token) or after (and sees the
    /// new current track).
    pub(crate) async fn dispatch_next(&self) {
        let dispatch = {
            let mut playback = self.playback();

            if !self.advance.take() {
                return;
            }

            match self.queue.dequeue() {
                Some(next) => {
                    playback.current_track = Some(next.track.clone());
                    Dispatch::Play(next)
                }
                None => match playback.current_track.take() {
                    Some(current) => Dispatch::Stop(current),
                    None => Dispatch::Idle,
                },
            }
        };

        match dispatch {
            Dispatch::Play(next) => self.start_track(next).await,
            Dispatch::Stop(current) => {
                debug!(track = %current, "queue drained, stopping playback");
                if let Err(error) = self.engine.stop().await {
                    warn!(%error, "unable to stop playback");
                    self.broadcast.send_error(error.to_string());
                }
            }
            Dispatch::Idle => debug!("queue is empty, waiting for tracks"),
        }
    }

    async fn start_track(&self, next: QueuedTrack) {
        let track = next.track;
        debug!(%track, id = %next.id, "initiating play");

        self.broadcast.notify(Notification::Dispatched {
            track: track.clone(),
        });

        if let Err(error) = self.engine.play(&track).await {
            warn!(%track, %error, "unable to start track, moving on");

            {
                let mut playback = self.playback();
                if playback.current_track.as_ref() == Some(&track) {
                    playback.current_track = None;
                }
            }

            self.broadcast.send_error(error.to_string());
            self.advance.signal_advance();
        }
    }
}

impl PlaybackListener for QueueCoordinator {
    fn on_track_started(&self, track: &TrackRef) {
        debug!(%track, "track started");

        {
            let mut playback = self.playback();
            playback.state = QueueState::Playing;
            playback.statistics.track_started(track);
        }

        self.broadcast.notify(Notification::Started {
            track: track.clone(),
        });
        self.broadcast.notify(Notification::Status {
            state: QueueState::Playing,
        });
    }

    fn on_track_ended(&self, track: &TrackRef, forced: bool) {
        let state = {
            let mut playback = self.playback();
            playback.statistics.track_ended(track, forced);

            if !forced {
                match playback.current_track.as_ref() {
                    None => {
                        debug!(%track, "current track already cleared, not advancing");
                        return;
                    }
                    Some(current) if current != track => {
                        debug!(%track, %current, "ended track is not the current track, not advancing");
                        return;
                    }
                    Some(_) => {}
                }
            }

            if forced {
                // A skipped track may end after its successor was dispatched.
                let ended_current = playback
                    .current_track
                    .as_ref()
                    .is_none_or(|current| current == track);
                if ended_current {
                    playback.state = QueueState::Stopped;
                }
            } else {
                playback.state = QueueState::Stopped;
                playback.current_track = None;
                self.advance.signal_advance();
            }

            playback.state
        };

        debug!(%track, forced, "end of track");

        self.broadcast.notify(Notification::Ended {
            track: track.clone(),
            forced,
        });
        self.broadcast.notify(Notification::Status { state });
    }

    fn next_track_to_preload(&self) -> Option<TrackRef> {
        self.queue.peek_next().map(|queued| queued.track)
    }
}
