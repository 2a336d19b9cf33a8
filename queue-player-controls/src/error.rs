use std::path::PathBuf;

use queue_player_models::{ParseTrackRefError, QueueState};
use snafu::prelude::*;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("cannot {action} while {state}"))]
    InvalidTransition {
        action: &'static str,
        state: QueueState,
    },
    #[snafu(display("unable to resolve {uri}: {message}"))]
    Resolve {
        uri: String,
        message: String,
    },
    #[snafu(display("playback engine failed to {command}: {message}"))]
    Engine {
        command: &'static str,
        message: String,
    },
    #[snafu(display("queue coordinator is already running"))]
    AlreadyStarted,
    #[snafu(display("control loop stopped abnormally: {message}"))]
    ControlLoop {
        message: String,
    },
    #[snafu(display("{source}"))]
    ParseTrackRef {
        source: ParseTrackRefError,
    },
    #[snafu(display("Unable to read catalog {}: {source}", path.display()))]
    CatalogRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Unable to parse catalog: {source}"))]
    CatalogParse {
        source: serde_json::Error,
    },
}

impl From<ParseTrackRefError> for Error {
    fn from(source: ParseTrackRefError) -> Self {
        Self::ParseTrackRef { source }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::ControlLoop {
            message: value.to_string(),
        }
    }
}
