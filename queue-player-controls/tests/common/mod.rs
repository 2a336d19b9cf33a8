#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use queue_player_controls::{
    CatalogResolver, ControlLoop, Error, PlaybackEngine, PlaybackListener, QueueConfig,
    QueueCoordinator, Result, TrackRef,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play(TrackRef),
    Pause,
    Resume,
    Stop,
}

/// Engine that records every command and never calls back on its own.
/// Tests drive the listener callbacks by hand.
#[derive(Debug)]
pub struct MockEngine {
    tx: UnboundedSender<Command>,
    unplayable: Mutex<HashSet<TrackRef>>,
    fail_pause: AtomicBool,
    listener_registered: AtomicBool,
}

impl MockEngine {
    pub fn new() -> (Arc<Self>, UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Self {
            tx,
            unplayable: Default::default(),
            fail_pause: AtomicBool::new(false),
            listener_registered: AtomicBool::new(false),
        };
        (Arc::new(engine), rx)
    }

    pub fn refuse(&self, track: &TrackRef) {
        self.unplayable.lock().unwrap().insert(track.clone());
    }

    pub fn fail_pause(&self) {
        self.fail_pause.store(true, Ordering::SeqCst);
    }

    pub fn listener_registered(&self) -> bool {
        self.listener_registered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaybackEngine for MockEngine {
    async fn play(&self, track: &TrackRef) -> Result<()> {
        self.tx.send(Command::Play(track.clone())).unwrap();

        if self.unplayable.lock().unwrap().contains(track) {
            return Err(Error::Engine {
                command: "play",
                message: format!("{track} is unavailable"),
            });
        }

        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        if self.fail_pause.load(Ordering::SeqCst) {
            return Err(Error::Engine {
                command: "pause",
                message: "device lost".into(),
            });
        }

        self.tx.send(Command::Pause).unwrap();
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.tx.send(Command::Resume).unwrap();
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.tx.send(Command::Stop).unwrap();
        Ok(())
    }

    fn set_listener(&self, _listener: Weak<dyn PlaybackListener>) {
        self.listener_registered.store(true, Ordering::SeqCst);
    }
}

pub fn track(id: &str) -> TrackRef {
    format!("test:track:{id}").parse().unwrap()
}

pub fn album(id: &str) -> TrackRef {
    format!("test:album:{id}").parse().unwrap()
}

pub fn playlist(id: &str) -> TrackRef {
    format!("test:user:tester:playlist:{id}").parse().unwrap()
}

pub fn catalog() -> CatalogResolver {
    CatalogResolver::new()
        .with_collection(album("two"), vec![track("2a"), track("2b")])
        .with_collection(playlist("mix"), vec![track("m1"), track("m2"), track("m3")])
}

pub fn config(auto_play: bool) -> QueueConfig {
    QueueConfig {
        auto_play,
        advance_poll_interval: Duration::from_secs(1),
        ..Default::default()
    }
}

pub struct Harness {
    pub coordinator: Arc<QueueCoordinator>,
    pub engine: Arc<MockEngine>,
    commands: UnboundedReceiver<Command>,
    control_loop: Option<ControlLoop>,
}

impl Harness {
    pub fn new(auto_play: bool) -> Self {
        let (engine, commands) = MockEngine::new();
        let coordinator = Arc::new(QueueCoordinator::new(
            engine.clone(),
            Arc::new(catalog()),
            config(auto_play),
        ));

        Self {
            coordinator,
            engine,
            commands,
            control_loop: None,
        }
    }

    pub fn started(auto_play: bool) -> Self {
        let mut harness = Self::new(auto_play);
        harness.control_loop = Some(harness.coordinator.start().unwrap());
        harness
    }

    pub async fn stop(&mut self) {
        if let Some(control_loop) = self.control_loop.take() {
            control_loop.stop().await.unwrap();
        }
    }

    pub async fn next_command(&mut self) -> Command {
        tokio::time::timeout(Duration::from_secs(2), self.commands.recv())
            .await
            .expect("timed out waiting for an engine command")
            .expect("engine dropped")
    }

    /// Gives the control loop time to act, then checks the engine was left
    /// alone.
    pub async fn assert_no_command(&mut self) {
        tokio::time::sleep(Duration::from_millis(200)).await;
        match self.commands.try_recv() {
            Err(TryRecvError::Empty) => {}
            other => panic!("unexpected engine command: {other:?}"),
        }
    }

    pub fn pending(&self) -> Vec<TrackRef> {
        self.coordinator
            .current_queue()
            .pending
            .into_iter()
            .map(|queued| queued.track)
            .collect()
    }
}
