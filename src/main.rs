use clap::Parser;
use futures_util::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use curtains::cli::{read_commands, Opts};
use curtains::{Curtain, Error, Result, SimulatedCurtain};

/// # Curtains
/// Runs a simulated curtain controller in the foreground.
///
/// Position and state updates are logged as they arrive. Commands are read
/// from stdin, one per line: a position, `open`, `close`, `query` or `quit`.
/// Ctrl+C requests a graceful shutdown.
#[tokio::main]
async fn main() -> Result<()> {
    let opts: Opts = Opts::parse();

    let default_level = if opts.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let curtain = SimulatedCurtain::new(opts.config());
    let done = curtain.init();

    let handle = curtain.clone();
    ctrlc::set_handler(move || {
        info!("received Ctrl+C");
        handle.shutdown();
    })
    .map_err(|e| Error::SignalHandler(e.to_string()))?;

    let mut positions = curtain.position().into_stream();
    tokio::task::spawn(async move {
        while let Some(position) = positions.next().await {
            info!(position, "position");
        }
    });

    let mut states = curtain.state().into_stream();
    tokio::task::spawn(async move {
        while let Some(state) = states.next().await {
            info!(%state, "state");
        }
    });

    if let Some(target) = opts.target {
        curtain.set_target_position(target);
    }

    let handle = curtain.clone();
    std::thread::spawn(move || read_commands(&handle, std::io::stdin().lock()));

    info!("curtain ready");
    done.await
}
