use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_WS_ADDR: &str = "127.0.0.1:8765";

/// Pomodoro timer: 25 minute work phases, 5 minute breaks, a 15 minute break every fourth.
#[derive(Debug, Clone, Parser)]
#[command(name = "tomato_timer", version, about)]
pub struct Config {
    /// Run as a WebSocket daemon instead of the interactive terminal
    #[arg(long)]
    pub daemon: bool,

    /// Address the daemon listens on
    #[arg(long, default_value = DEFAULT_WS_ADDR)]
    pub addr: SocketAddr,

    /// Append logs to this file instead of stderr
    #[arg(short, long)]
    pub log: Option<PathBuf>,

    /// Do not play a cue when a break starts
    #[arg(long)]
    pub mute: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Where logs go. The daemon logs to a file by default; the terminal keeps stderr.
    pub fn log_path(&self) -> Option<PathBuf> {
        if self.log.is_some() || !self.daemon {
            return self.log.clone();
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Some(PathBuf::from(home).join(".local/share/tomato_timer/daemon.log"))
    }

    /// Baseline filter when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        match (self.verbose, self.daemon || self.log.is_some()) {
            (true, _) => "tomato_timer=debug",
            (false, true) => "tomato_timer=info",
            // Keep the countdown line readable.
            (false, false) => "tomato_timer=warn",
        }
    }
}
