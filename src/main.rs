use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tomato_timer::audio::{AudioCue, DesktopCue, SilentCue};
use tomato_timer::config::Config;
use tomato_timer::pomodoro::{EventReceiver, SessionController, create_event_channel, phase};
use tomato_timer::{terminal, ws};

fn init_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter()));

    match config.log_path() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_logging(&config)?;

    let cue: Arc<dyn AudioCue> = if config.mute {
        Arc::new(SilentCue)
    } else {
        Arc::new(DesktopCue::new())
    };

    let (event_tx, event_rx) = create_event_channel();
    let controller = SessionController::new(event_tx, cue);

    if config.daemon {
        return run_daemon_mode(&config, controller, event_rx).await;
    }

    terminal::run(controller, event_rx).await?;
    Ok(())
}

/// Run in daemon mode - the session is driven by WebSocket clients
async fn run_daemon_mode(
    config: &Config,
    controller: SessionController,
    events: EventReceiver,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🍅 Tomato Timer - Daemon Mode");
    println!("======================================================");
    println!(
        "Pomodoro settings: {}min work / {}min break / {}min long break",
        phase::WORK_SECONDS / 60,
        phase::SHORT_BREAK_SECONDS / 60,
        phase::LONG_BREAK_SECONDS / 60
    );
    println!("Running WebSocket server on ws://{}", config.addr);
    if let Some(path) = config.log_path() {
        println!("Logging to: {}", path.display());
    }

    let broadcast = ws::websocket_server::spawn_event_fanout(events);
    let server = ws::websocket_server::start_websocket_server(
        config.addr,
        controller.clone(),
        broadcast,
    );

    tokio::select! {
        result = server => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            controller.reset();
        }
    }
    Ok(())
}
