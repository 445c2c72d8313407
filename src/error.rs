use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// `start` was called while a countdown loop is already active.
    #[error("session is already running")]
    AlreadyRunning,
}

#[derive(Error, Debug)]
pub enum AudioCueError {
    #[error("failed to show cue notification: {0}")]
    Notification(#[from] notify_rust::error::Error),

    #[error("failed to start cue worker: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
