pub mod advance;
pub mod config;
pub mod control_loop;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod notification;
pub mod resolver;
pub mod sink;
pub mod track_queue;

mod statistics;

pub use config::QueueConfig;
pub use control_loop::ControlLoop;
pub use coordinator::QueueCoordinator;
pub use engine::{PlaybackEngine, PlaybackListener};
pub use error::Error;
pub use queue_player_models::{
    CurrentQueue, QueueState, QueueStatus, QueuedTrack, RefKind, TrackRef,
};
pub use resolver::{CatalogResolver, TrackResolver};

pub type Result<T, E = Error> = std::result::Result<T, E>;
