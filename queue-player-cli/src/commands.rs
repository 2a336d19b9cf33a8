use std::str::FromStr;

use queue_player_controls::{QueueCoordinator, TrackRef};

use crate::cli::Error;

pub(crate) const HELP: &str = "\
commands:
  add <uri>...   queue tracks, albums or playlists
  play           resume playback
  pause          pause playback
  skip           end the current track
  delete <uri>   remove a track from the pending queue
  status         print queue statistics
  queue          print the current track and pending queue
  help           print this message
  quit           stop the player";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Add(Vec<TrackRef>),
    Play,
    Pause,
    Skip,
    Delete(TrackRef),
    Status,
    Queue,
    Help,
    Quit,
}

fn parse_ref(uri: &str) -> Result<TrackRef, Error> {
    uri.parse().map_err(|error| Error::InvalidCommand {
        message: format!("{error}"),
    })
}

fn no_arguments(name: &str, command: Command, rest: &[&str]) -> Result<Command, Error> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(Error::InvalidCommand {
            message: format!("{name} takes no arguments"),
        })
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((name, rest)) = words.split_first() else {
            return Err(Error::InvalidCommand {
                message: "empty command".to_string(),
            });
        };

        let name = name.to_lowercase();
        match name.as_str() {
            "add" => {
                if rest.is_empty() {
                    return Err(Error::InvalidCommand {
                        message: "add needs at least one uri".to_string(),
                    });
                }
                let refs = rest
                    .iter()
                    .map(|uri| parse_ref(uri))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Command::Add(refs))
            }
            "delete" => match rest {
                [uri] => Ok(Command::Delete(parse_ref(uri)?)),
                _ => Err(Error::InvalidCommand {
                    message: "delete needs exactly one uri".to_string(),
                }),
            },
            "play" | "resume" => no_arguments(&name, Command::Play, rest),
            "pause" => no_arguments(&name, Command::Pause, rest),
            "skip" | "next" => no_arguments(&name, Command::Skip, rest),
            "status" => no_arguments(&name, Command::Status, rest),
            "queue" => no_arguments(&name, Command::Queue, rest),
            "help" | "?" => no_arguments(&name, Command::Help, rest),
            "quit" | "exit" => no_arguments(&name, Command::Quit, rest),
            other => Err(Error::InvalidCommand {
                message: format!("unknown command `{other}`, try `help`"),
            }),
        }
    }
}

pub(crate) async fn execute(coordinator: &QueueCoordinator, command: Command) -> Result<(), Error> {
    match command {
        Command::Add(refs) => {
            let queued = coordinator.enqueue(&refs).await?;
            println!("queued {queued} track(s)");
        }
        Command::Play => coordinator.play().await?,
        Command::Pause => coordinator.pause().await?,
        Command::Skip => coordinator.skip().await?,
        Command::Delete(track) => {
            let removed = coordinator.delete_queued_track(&track);
            println!("removed {removed} queued track(s)");
        }
        Command::Status => print_json(&coordinator.queue_status())?,
        Command::Queue => print_json(&coordinator.current_queue())?,
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(value).map_err(|error| Error::TerminalError {
        error: error.to_string(),
    })?;
    println!("{json}");
    Ok(())
}
