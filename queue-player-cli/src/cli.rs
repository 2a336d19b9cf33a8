use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{ArgAction, Parser, Subcommand};
use queue_player_controls::{
    CatalogResolver, QueueConfig, QueueCoordinator, TrackRef, TrackResolver,
    notification::Notification, sink::Sink,
};
use snafu::prelude::*;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};

use crate::commands::{self, Command};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(short, long)]
    /// Log level
    verbosity: Option<tracing::Level>,

    #[clap(short, long, env = "QUEUE_PLAYER_CATALOG")]
    /// Catalog used to expand albums and playlists.
    /// Defaults to <config dir>/queue-player/catalog.json when present.
    catalog: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the player and read queue commands from stdin
    Open {
        #[clap(long, env = "QUEUE_PLAYER_AUTO_PLAY", default_value_t = true, action = ArgAction::Set)]
        /// Start playing when tracks are added to an idle queue.
        auto_play: bool,

        #[clap(long, env = "QUEUE_PLAYER_TRACK_SECONDS", default_value_t = 30)]
        /// How long the simulated sink plays each track.
        track_seconds: u64,
    },
    /// Print the tracks a reference expands to
    Resolve {
        #[clap(value_parser)]
        uri: String,
    },
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{error}"))]
    PlayerError { error: String },
    #[snafu(display("{error}"))]
    TerminalError { error: String },
    #[snafu(display("{message}"))]
    InvalidCommand { message: String },
}

impl From<queue_player_controls::Error> for Error {
    fn from(error: queue_player_controls::Error) -> Self {
        Error::PlayerError {
            error: error.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::TerminalError {
            error: error.to_string(),
        }
    }
}

pub async fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_target(false)
        .compact()
        .init();

    let catalog = load_catalog(cli.catalog).await?;

    match cli.command {
        Commands::Open {
            auto_play,
            track_seconds,
        } => {
            let config = QueueConfig {
                auto_play,
                ..Default::default()
            };

            let sink = Arc::new(Sink::new(Duration::from_secs(track_seconds)));
            let coordinator = Arc::new(QueueCoordinator::new(sink, Arc::new(catalog), config));

            let notifications = coordinator.clone();
            tokio::spawn(async move {
                log_notifications(notifications).await;
            });

            let control_loop = coordinator.start()?;
            let result = command_loop(&coordinator).await;
            control_loop.stop().await?;

            result
        }
        Commands::Resolve { uri } => {
            let track_ref: TrackRef = uri.parse().map_err(queue_player_controls::Error::from)?;

            let tracks = if track_ref.is_track() {
                vec![track_ref]
            } else {
                catalog.resolve(&track_ref).await?
            };

            for track in tracks {
                println!("{track}");
            }

            Ok(())
        }
    }
}

async fn load_catalog(path: Option<PathBuf>) -> Result<CatalogResolver, Error> {
    let path = path.or_else(|| {
        let mut path = dirs::config_dir()?;
        path.push("queue-player");
        path.push("catalog.json");
        path.exists().then_some(path)
    });

    match path {
        Some(path) => Ok(CatalogResolver::load(&path).await?),
        None => {
            tracing::debug!("no catalog, albums and playlists will not resolve");
            Ok(CatalogResolver::new())
        }
    }
}

async fn command_loop(coordinator: &QueueCoordinator) -> Result<(), Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", commands::HELP);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(error) => {
                println!("{error}");
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        if let Err(error) = commands::execute(coordinator, command).await {
            println!("{error}");
        }
    }

    Ok(())
}

async fn log_notifications(coordinator: Arc<QueueCoordinator>) {
    let mut receiver = coordinator.subscribe();
    drop(coordinator);

    loop {
        match receiver.recv().await {
            Ok(Notification::Dispatched { track }) => tracing::info!(%track, "dispatched"),
            Ok(Notification::Started { track }) => tracing::info!(%track, "now playing"),
            Ok(Notification::Ended { track, forced }) => {
                tracing::info!(%track, forced, "track ended")
            }
            Ok(Notification::Status { state }) => tracing::debug!(%state, "state changed"),
            Ok(Notification::QueueChanged { size }) => tracing::debug!(size, "queue changed"),
            Ok(Notification::Error(message)) => tracing::warn!("{message}"),
            Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "notifications lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
