use std::{fmt::Debug, sync::Weak};

use async_trait::async_trait;
use queue_player_models::TrackRef;

use crate::Result;

/// The component that actually decodes and renders audio.
///
/// Commands either succeed or fail with [`crate::Error::Engine`]. Playback
/// progress is reported back through the registered [`PlaybackListener`],
/// possibly from a different thread.
#[async_trait]
pub trait PlaybackEngine: Send + Sync + Debug {
    /// Starts playing `track`, ending whatever was playing before.
    async fn play(&self, track: &TrackRef) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn resume(&self) -> Result<()>;
    /// Ends the current track without starting another one.
    async fn stop(&self) -> Result<()>;
    fn set_listener(&self, listener: Weak<dyn PlaybackListener>);
}

/// Callbacks delivered by a [`PlaybackEngine`].
pub trait PlaybackListener: Send + Sync {
    fn on_track_started(&self, track: &TrackRef);
    /// `forced` is set when the track was cut short by a skip or a stop.
    fn on_track_ended(&self, track: &TrackRef, forced: bool);
    /// Lets the engine buffer the upcoming track ahead of time.
    fn next_track_to_preload(&self) -> Option<TrackRef>;
}
