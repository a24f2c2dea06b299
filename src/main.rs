//! Penmap - stylus pen button gesture mapper
//!
//! Reads gesture keycodes from a stylus input device and maps each gesture
//! onto virtual stylus buttons, with per-gesture press or toggle behavior
//! configured from a JSON settings file.

use anyhow::Result;
use clap::Parser;
use penmap_core::PenSettings;
use penmap_gesture::{GestureTable, LogNotifier, MapperSession, SessionEvent};
use penmap_input::{PenReader, VirtualPenButtons};
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Penmap - map pen button gestures onto virtual stylus buttons
#[derive(Parser, Debug)]
#[command(name = "penmap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Pen input device node (e.g. /dev/input/event5)
    #[arg(short, long)]
    device: PathBuf,

    /// Settings file (JSON)
    #[arg(short, long, default_value = "/etc/penmap/settings.json")]
    settings: PathBuf,

    /// Name of the virtual output device
    #[arg(short, long, default_value = "Penmap Pen Buttons")]
    output_name: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("penmap v{}", env!("CARGO_PKG_VERSION"));

    let settings = PenSettings::load(&args.settings)?;
    let table = GestureTable::rebuild(&settings);
    let sink = VirtualPenButtons::new(&args.output_name)?;

    let (tx, rx) = mpsc::channel(64);
    let session = MapperSession::new(table, sink, LogNotifier, tx.clone());

    // Pen reader feeds the session; if the device goes away, so do we.
    let reader = PenReader::open(&args.device, tx.clone())?;
    let reader_tx = tx.clone();
    tokio::spawn(async move {
        if let Err(e) = reader.run().await {
            warn!("Pen reader stopped: {}", e);
            let _ = reader_tx.send(SessionEvent::Shutdown).await;
        }
    });

    // SIGHUP rereads the settings file and rebuilds the gesture table.
    let mut hangup = signal(SignalKind::hangup())?;
    let settings_path = args.settings.clone();
    let reload_tx = tx.clone();
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("SIGHUP received, reloading {}", settings_path.display());
            match PenSettings::load(&settings_path) {
                Ok(settings) => {
                    let _ = reload_tx.send(SessionEvent::Reload(settings)).await;
                }
                Err(e) => warn!("Settings reload failed: {}", e),
            }
        }
    });

    let shutdown_tx = tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
        let _ = shutdown_tx.send(SessionEvent::Shutdown).await;
    });

    session.run(rx).await?;

    info!("Goodbye!");
    Ok(())
}
