mod config;
mod dispatch;
mod filter;
mod grab;
mod key;
mod platform;
mod resolver;
mod session;
mod transport;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use config::{ConfigStore, PlayAction};
use platform::x11::{EventReader, X11WindowSystem};
use session::Session;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tracing::{Level, error, info, trace, warn};
use tracing_subscriber::EnvFilter;
use transport::mpris::MprisTransport;

#[derive(Parser)]
#[command(
    name = "audiokeys",
    version,
    about = "Control a media player with the XF86Audio keys of multimedia keyboards",
    long_about = "Grabs the XF86Audio key symbols produced by multimedia keyboards on every \
                  screen and translates key releases into MPRIS player commands.\n\n\
                  The key symbols must already be mapped to physical keys; use xmodmap or \
                  your desktop's keyboard settings for that."
)]
struct Args {
    /// Path to config file (default: ~/.config/audiokeys/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Grab the media keys and control the player (default)
    Run {
        /// Only control the MPRIS player whose bus name starts with this (e.g. "vlc")
        #[arg(long)]
        player: Option<String>,
    },
    /// Change the stored settings; send SIGHUP to a running daemon to apply them
    Configure {
        /// What Play does while a track is already playing
        #[arg(long, value_enum)]
        play_action: Option<PlayActionArg>,

        /// Volume change per key press, in percent
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        volume_increment: Option<u8>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PlayActionArg {
    /// Pause playback
    Pause,
    /// Restart the current track
    Restart,
}

impl From<PlayActionArg> for PlayAction {
    fn from(arg: PlayActionArg) -> Self {
        match arg {
            PlayActionArg::Pause => PlayAction::Pause,
            PlayActionArg::Restart => PlayAction::Restart,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = ConfigStore::new(args.config.unwrap_or_else(ConfigStore::default_path));

    match args.command.unwrap_or(Command::Run { player: None }) {
        Command::Run { player } => {
            if let Err(err) = run(&store, player).await {
                error!("{err:#}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Command::Configure {
            play_action,
            volume_increment,
        } => configure(&store, play_action, volume_increment),
    }
}

/// Grab the keys and handle events until interrupted
async fn run(store: &ConfigStore, player: Option<String>) -> anyhow::Result<()> {
    let (config_tx, config_rx) = watch::channel(store.read());

    let transport = MprisTransport::connect(player).await?;
    let ws = X11WindowSystem::connect()?;
    let conn = Arc::clone(ws.conn());

    // Grabs complete before the first event is read
    let mut session = Session::activate(ws, transport, config_rx);
    let (reader, mut events) = EventReader::spawn(conn)?;

    let mut hangup = signal(SignalKind::hangup()).context("failed to watch SIGHUP")?;
    let mut terminate = signal(SignalKind::terminate()).context("failed to watch SIGTERM")?;
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    info!("waiting for media keys");
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    warn!("X11 event stream closed");
                    break;
                };
                let response = session.handle_event(event).await;
                trace!(?event, ?response, "handled event");
            }
            _ = hangup.recv() => {
                info!(path = %store.path().display(), "reloading config");
                config_tx.send_replace(store.read());
            }
            _ = terminate.recv() => {
                info!("terminated, shutting down");
                break;
            }
            _ = &mut interrupt => {
                info!("interrupted, shutting down");
                break;
            }
        }
    }

    session.deactivate();
    reader.stop();
    Ok(())
}

/// Edit the stored settings
fn configure(
    store: &ConfigStore,
    play_action: Option<PlayActionArg>,
    volume_increment: Option<u8>,
) -> ExitCode {
    let mut edited = store.read();
    if let Some(play_action) = play_action {
        edited.play_action = play_action.into();
    }
    if let Some(volume_increment) = volume_increment {
        edited.volume_increment = volume_increment;
    }

    if let Err(err) = store.write(&edited) {
        eprintln!("{:?}", miette::Report::new(err));
        return ExitCode::FAILURE;
    }

    info!(path = %store.path().display(), config = ?edited, "saved config");
    println!(
        "play_action = {:?}, volume_increment = {}",
        edited.play_action, edited.volume_increment
    );
    ExitCode::SUCCESS
}
