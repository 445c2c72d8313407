use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::thread;

use notify_rust::Notification;
use tracing::warn;

use crate::error::AudioCueError;

const CUE_SOUND: &str = "alarm-clock-elapsed";

/// The sound played when a break begins. Calls are fire-and-forget from the
/// session's point of view: an error is reported back but never retried.
pub trait AudioCue: Send + Sync {
    fn play(&self) -> Result<(), AudioCueError>;
    fn stop(&self) -> Result<(), AudioCueError>;
}

/// Desktop notification carrying a sound hint. The notification stays up until
/// `stop` closes it.
#[derive(Default)]
pub struct DesktopCue {
    active: Mutex<Option<mpsc::Sender<()>>>,
}

impl DesktopCue {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The notification shown while a break cue plays.
fn cue_notification() -> Notification {
    Notification::new()
        .summary("Tomato Timer")
        .body("Break time! Step away for a bit.")
        .sound_name(CUE_SOUND)
        .timeout(0) // No auto-dismiss
        .finalize()
}

impl AudioCue for DesktopCue {
    /// Returns as soon as the worker is running; a failed `show` is logged there.
    fn play(&self) -> Result<(), AudioCueError> {
        self.stop()?;

        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        // The handle is closed on the thread that opened it.
        thread::Builder::new()
            .name("break-cue".to_string())
            .spawn(move || match cue_notification().show() {
                Ok(handle) => {
                    // Returns on an explicit stop or when the sender is dropped.
                    let _ = stop_rx.recv();
                    handle.close();
                }
                Err(e) => warn!("{}", AudioCueError::Notification(e)),
            })?;

        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(stop_tx);
        Ok(())
    }

    fn stop(&self) -> Result<(), AudioCueError> {
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(stop_tx) = previous {
            let _ = stop_tx.send(());
        }
        Ok(())
    }
}

/// Used with `--mute`, and wherever no sound device is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentCue;

impl AudioCue for SilentCue {
    fn play(&self) -> Result<(), AudioCueError> {
        Ok(())
    }

    fn stop(&self) -> Result<(), AudioCueError> {
        Ok(())
    }
}
