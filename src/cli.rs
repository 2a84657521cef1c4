use std::io::BufRead;
use std::time::Duration;

use clap::Parser;
use git_version::git_version;
use tracing::warn;

use crate::api::Command;
use crate::config::{Backlog, SimConfig};
use crate::curtain::Curtain;
use crate::limit::{Travel, FULLY_CLOSED, FULLY_OPEN};

const GIT_VERSION: &str = git_version!(
    args = ["--always", "--dirty=-modified"],
    fallback = "unknown"
);

/// Simulated curtain controller.
#[derive(Parser, Debug)]
#[clap(name = "Curtains", version = GIT_VERSION)]
pub struct Opts {
    /// Milliseconds between two simulated motor steps
    #[clap(long, default_value = "250")]
    pub tick_ms: u64,

    /// Position the curtain starts at
    #[clap(long, default_value = "0")]
    pub at: i32,

    /// Let targets leave the 0-100 range
    #[clap(long)]
    pub unbounded: bool,

    /// Cap on undelivered updates per subscription
    #[clap(long)]
    pub backlog: Option<usize>,

    #[clap(short, long)]
    pub verbose: bool,

    /// the position to move to
    pub target: Option<i32>,
}

impl Opts {
    pub fn config(&self) -> SimConfig {
        SimConfig::default()
            .with_tick(Duration::from_millis(self.tick_ms))
            .with_initial_position(self.at)
            .with_travel(if self.unbounded {
                Travel::Unbounded
            } else {
                Travel::Clamped
            })
            .with_backlog(self.backlog.map_or(Backlog::Unbounded, Backlog::Bounded))
    }
}

/// Applies operator commands, one per line, until `quit` or end of input.
///
/// End of input only stops reading; the curtain keeps running until `quit`
/// or an explicit shutdown.
pub fn read_commands(curtain: &impl Curtain, input: impl BufRead) {
    for line in input.lines() {
        let line = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => line,
            Err(_) => return,
        };

        match line.parse::<Command>() {
            Ok(Command::Move(p)) => curtain.set_target_position(p),
            Ok(Command::Open) => curtain.set_target_position(FULLY_OPEN),
            Ok(Command::Close) => curtain.set_target_position(FULLY_CLOSED),
            Ok(Command::Query) => curtain.query(),
            Ok(Command::Quit) => {
                curtain.shutdown();
                return;
            }
            Err(e) => warn!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use tokio::time::timeout;

    use super::*;
    use crate::{CurtainState, SimConfig, SimulatedCurtain};

    #[test]
    fn defaults_match_sim_config() {
        let opts = Opts::parse_from(["curtains"]);
        let config = opts.config();
        assert_eq!(config.tick, Duration::from_millis(250));
        assert_eq!(config.initial_position, 0);
        assert_eq!(config.travel, Travel::Clamped);
        assert_eq!(config.backlog, Backlog::Unbounded);
        assert_eq!(opts.target, None);
    }

    #[test]
    fn maps_options() {
        let opts = Opts::parse_from([
            "curtains",
            "--tick-ms",
            "10",
            "--at",
            "100",
            "--unbounded",
            "--backlog",
            "8",
            "40",
        ]);
        let config = opts.config();
        assert_eq!(config.tick, Duration::from_millis(10));
        assert_eq!(config.initial_position, 100);
        assert_eq!(config.travel, Travel::Unbounded);
        assert_eq!(config.backlog, Backlog::Bounded(8));
        assert_eq!(opts.target, Some(40));
    }

    fn fast() -> SimulatedCurtain {
        SimulatedCurtain::new(SimConfig::default().with_tick(Duration::from_millis(1)))
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_input_keeps_curtain_running() {
        let curtain = fast();
        let done = curtain.init();

        read_commands(&curtain, "3\nbogus\n\nquery\n".as_bytes());

        let position = curtain.position();
        // query lands before the first tick
        assert_eq!(position.recv().await, Some(0));
        assert_eq!(position.recv().await, Some(1));
        assert_eq!(position.recv().await, Some(2));
        assert_eq!(position.recv().await, Some(3));
        assert_eq!(done.peek(), None);

        curtain.shutdown();
        assert_eq!(done.await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn quit_shuts_down_and_stops_reading() {
        let curtain = fast();
        let done = curtain.init();

        read_commands(&curtain, "close\nquit\nopen\n".as_bytes());

        assert_eq!(timeout(Duration::from_secs(1), done).await.unwrap(), Ok(()));
        let states: Vec<CurtainState> = curtain.state().into_stream().collect().await;
        assert!(states.len() <= 1);
    }
}
