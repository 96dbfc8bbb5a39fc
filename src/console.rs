//! Operator console on stdin.
//!
//! One command per line:
//!
//! | Line       | Action                                        |
//! |------------|-----------------------------------------------|
//! | `stop`     | emergency stop, back to `Waiting`             |
//! | `pkaisetu` | Pkaisetu on a fresh frame (no cooldown)       |
//! | `replay`   | resubmit the most recent homework artifact    |
//! | `teach`    | present the prepared lesson                   |
//! | `status`   | print the session status                      |
//! | `quit`     | shut the coordinator down                     |

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use crate::coordinator::Coordinator;
use crate::ingest::SubmitOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Stop,
    Pkaisetu,
    Replay,
    Teach,
    Status,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Case-insensitive; blank lines and unknown words yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "stop" | "s" => Some(Self::Stop),
            "pkaisetu" | "p" => Some(Self::Pkaisetu),
            "replay" | "r" => Some(Self::Replay),
            "teach" | "t" => Some(Self::Teach),
            "status" => Some(Self::Status),
            "help" | "?" => Some(Self::Help),
            "quit" | "exit" | "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Read operator commands from `input` until EOF, `quit`, or `shutdown`.
///
/// `quit` cancels `quit`; the caller owns the actual shutdown.
pub async fn run_console<R>(
    input: R,
    coordinator: Arc<Coordinator>,
    quit: CancellationToken,
    shutdown: CancellationToken,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    log::info!("console: ready (type `help`)");

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                log::debug!("console: stdin closed");
                break;
            }
            Err(e) => {
                log::warn!("console: read error: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let Some(command) = ConsoleCommand::parse(&line) else {
            println!("unknown command {:?}; type `help`", line.trim());
            continue;
        };

        match command {
            ConsoleCommand::Stop => {
                let previous = coordinator.emergency_stop();
                println!("stopped ({previous})");
            }
            ConsoleCommand::Pkaisetu => {
                if coordinator.manual_interrupt() {
                    println!("Pkaisetu started");
                } else {
                    println!("Pkaisetu already running");
                }
            }
            ConsoleCommand::Replay => match coordinator.replay_latest() {
                Some(SubmitOutcome::Started(id)) => println!("replaying as {id}"),
                Some(SubmitOutcome::Busy) => println!("busy, replay dropped"),
                None => println!("nothing to replay"),
            },
            ConsoleCommand::Teach => {
                if !coordinator.start_teaching() {
                    println!("no lesson ready ({})", coordinator.status().phase);
                }
            }
            ConsoleCommand::Status => println!("{}", coordinator.status()),
            ConsoleCommand::Help => {
                println!("commands: stop, pkaisetu, replay, teach, status, quit");
            }
            ConsoleCommand::Quit => {
                log::info!("console: quit requested");
                quit.cancel();
                break;
            }
        }
    }
}
