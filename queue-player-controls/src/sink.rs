use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use async_trait::async_trait;
use queue_player_models::TrackRef;
use tokio::{
    sync::watch::{self, Sender},
    task::JoinHandle,
};
use tracing::{debug, instrument};

use crate::{
    Result,
    engine::{PlaybackEngine, PlaybackListener},
};

const TICK: Duration = Duration::from_millis(50);

struct Playback {
    track: TrackRef,
    generation: u64,
    paused_tx: Sender<bool>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SinkState {
    playback: Option<Playback>,
    generation: u64,
}

#[derive(Default)]
struct Shared {
    listener: Mutex<Option<Weak<dyn PlaybackListener>>>,
    state: Mutex<SinkState>,
}

impl Shared {
    fn listener(&self) -> Option<Arc<dyn PlaybackListener>> {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    fn state(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stand-in playback engine that "plays" every track for a fixed length.
///
/// Reports the same callbacks a real engine would: a start as soon as a
/// track is handed over, a natural end when its time is up, and a forced
/// end for a track replaced by `play` or cut by `stop`. Once less than the
/// preload window remains it asks the listener for the next track.
pub struct Sink {
    track_length: Duration,
    preload_window: Duration,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("track_length", &self.track_length)
            .field("preload_window", &self.preload_window)
            .finish_non_exhaustive()
    }
}

impl Sink {
    pub fn new(track_length: Duration) -> Self {
        Self {
            track_length,
            preload_window: (track_length / 4).min(Duration::from_secs(10)),
            shared: Default::default(),
        }
    }

    pub fn with_preload_window(mut self, preload_window: Duration) -> Self {
        self.preload_window = preload_window;
        self
    }

    /// The track currently loaded, playing or paused.
    pub fn current_track(&self) -> Option<TrackRef> {
        self.shared
            .state()
            .playback
            .as_ref()
            .map(|playback| playback.track.clone())
    }

    /// Cuts the loaded track short, reporting a forced end.
    fn interrupt(&self) {
        let interrupted = self.shared.state().playback.take();

        if let Some(playback) = interrupted {
            playback.handle.abort();
            debug!(track = %playback.track, "interrupting track");

            if let Some(listener) = self.shared.listener() {
                listener.on_track_ended(&playback.track, true);
            }
        }
    }

    fn set_paused(&self, paused: bool) {
        if let Some(playback) = &self.shared.state().playback {
            playback.paused_tx.send_replace(paused);
        }
    }
}

#[async_trait]
impl PlaybackEngine for Sink {
    #[instrument(skip(self))]
    async fn play(&self, track: &TrackRef) -> Result<()> {
        self.interrupt();

        let (paused_tx, paused_rx) = watch::channel(false);
        let mut state = self.shared.state();
        state.generation += 1;
        let generation = state.generation;

        let handle = tokio::spawn(play_track(
            self.shared.clone(),
            track.clone(),
            generation,
            self.track_length,
            self.preload_window,
            paused_rx,
        ));

        state.playback = Some(Playback {
            track: track.clone(),
            generation,
            paused_tx,
            handle,
        });

        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.set_paused(true);
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.set_paused(false);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.interrupt();
        Ok(())
    }

    fn set_listener(&self, listener: Weak<dyn PlaybackListener>) {
        *self
            .shared
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }
}

async fn play_track(
    shared: Arc<Shared>,
    track: TrackRef,
    generation: u64,
    length: Duration,
    preload_window: Duration,
    paused: watch::Receiver<bool>,
) {
    if let Some(listener) = shared.listener() {
        listener.on_track_started(&track);
    }

    let mut remaining = length;
    let mut preloaded = false;
    let mut interval = tokio::time::interval(TICK);

    while !remaining.is_zero() {
        interval.tick().await;

        if *paused.borrow() {
            continue;
        }

        remaining = remaining.saturating_sub(TICK);

        if !preloaded && remaining <= preload_window {
            preloaded = true;
            let next = shared
                .listener()
                .and_then(|listener| listener.next_track_to_preload());
            match next {
                Some(next) => debug!(%next, "preloading next track"),
                None => debug!("nothing to preload"),
            }
        }
    }

    let finished = {
        let mut state = shared.state();
        let is_current = state
            .playback
            .as_ref()
            .is_some_and(|playback| playback.generation == generation);
        if is_current {
            state.playback = None;
        }
        is_current
    };

    if finished {
        debug!(%track, "track finished");
        if let Some(listener) = shared.listener() {
            listener.on_track_ended(&track, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

    #[derive(Debug, PartialEq)]
    enum Event {
        Started(String),
        Ended(String, bool),
        Preload,
    }

    struct RecordingListener {
        tx: UnboundedSender<Event>,
    }

    impl PlaybackListener for RecordingListener {
        fn on_track_started(&self, track: &TrackRef) {
            self.tx.send(Event::Started(track.to_string())).unwrap();
        }

        fn on_track_ended(&self, track: &TrackRef, forced: bool) {
            self.tx.send(Event::Ended(track.to_string(), forced)).unwrap();
        }

        fn next_track_to_preload(&self) -> Option<TrackRef> {
            self.tx.send(Event::Preload).unwrap();
            None
        }
    }

    fn sink_with_listener(
        length: Duration,
    ) -> (Sink, Arc<dyn PlaybackListener>, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener: Arc<dyn PlaybackListener> = Arc::new(RecordingListener { tx });
        let sink = Sink::new(length);
        sink.set_listener(Arc::downgrade(&listener));
        (sink, listener, rx)
    }

    async fn next_event(rx: &mut UnboundedReceiver<Event>) -> Event {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for sink event")
            .expect("listener dropped")
    }

    #[tokio::test]
    async fn reports_start_preload_and_natural_end() {
        let (sink, _listener, mut rx) = sink_with_listener(Duration::from_millis(200));
        let track: TrackRef = "test:track:a".parse().unwrap();

        sink.play(&track).await.unwrap();

        assert_eq!(next_event(&mut rx).await, Event::Started("test:track:a".into()));
        assert_eq!(next_event(&mut rx).await, Event::Preload);
        assert_eq!(
            next_event(&mut rx).await,
            Event::Ended("test:track:a".into(), false)
        );
        assert!(sink.current_track().is_none());
    }

    #[tokio::test]
    async fn replacing_a_track_forces_its_end() {
        let (sink, _listener, mut rx) = sink_with_listener(Duration::from_secs(60));
        let first: TrackRef = "test:track:a".parse().unwrap();
        let second: TrackRef = "test:track:b".parse().unwrap();

        sink.play(&first).await.unwrap();
        assert_eq!(next_event(&mut rx).await, Event::Started("test:track:a".into()));

        sink.play(&second).await.unwrap();
        assert_eq!(
            next_event(&mut rx).await,
            Event::Ended("test:track:a".into(), true)
        );
        assert_eq!(next_event(&mut rx).await, Event::Started("test:track:b".into()));
        assert_eq!(sink.current_track(), Some(second));

        sink.stop().await.unwrap();
        assert_eq!(
            next_event(&mut rx).await,
            Event::Ended("test:track:b".into(), true)
        );
        assert!(sink.current_track().is_none());
    }

    #[tokio::test]
    async fn paused_track_does_not_finish() {
        let (sink, _listener, mut rx) = sink_with_listener(Duration::from_millis(150));
        let track: TrackRef = "test:track:a".parse().unwrap();

        sink.play(&track).await.unwrap();
        assert_eq!(next_event(&mut rx).await, Event::Started("test:track:a".into()));
        sink.pause().await.unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event, Event::Preload);
        }
        assert_eq!(sink.current_track(), Some(track));

        sink.resume().await.unwrap();
        loop {
            match next_event(&mut rx).await {
                Event::Preload => continue,
                event => {
                    assert_eq!(event, Event::Ended("test:track:a".into(), false));
                    break;
                }
            }
        }
    }
}
