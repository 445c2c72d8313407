use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak, mpsc};
use std::thread;

use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, warn};

use super::events::{CueAction, EventSender, SessionEvent};
use super::phase::{CUE_LEAD_IN_MS, Phase, TICK_INTERVAL_MS};
use super::session::{Session, SessionSnapshot, TickOutcome, Transition};
use crate::audio::AudioCue;
use crate::error::SessionError;

struct State {
    session: Session,
    // Bumped on every reset; a countdown only mutates while its generation is current.
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    state: Mutex<State>,
    events: EventSender,
    cues: mpsc::Sender<CueAction>,
}

/// Owns one [`Session`] and the countdown loop that drives it.
///
/// `start` and `reset` are the only commands. Everything the host should do in
/// response arrives as [`SessionEvent`]s, and break cues go to the [`AudioCue`].
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(events: EventSender, cue: Arc<dyn AudioCue>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    session: Session::new(),
                    generation: 0,
                    task: None,
                }),
                events,
                cues: spawn_cue_worker(cue),
            }),
        }
    }

    /// Begins the phase loop. A second call while running is rejected and
    /// leaves the existing loop untouched.
    pub fn start(&self) -> Result<(), SessionError> {
        let mut state = self.inner.lock();
        let transition = state.session.begin()?;
        let generation = state.generation;

        info!(
            "Session started in {} (rep {})",
            transition.phase.display().title,
            transition.rep_count
        );
        self.inner.announce(&state.session, transition);

        state.task = Some(tokio::spawn(run_countdown(
            Arc::downgrade(&self.inner),
            generation,
            transition.mark_appended,
        )));
        Ok(())
    }

    /// Cancels the loop and returns to Idle. Always succeeds; a no-op when
    /// already idle.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        state.generation += 1;
        if let Some(task) = state.task.take() {
            task.abort();
        }

        if !state.session.reset() {
            debug!("Reset ignored, session already idle");
            return;
        }

        info!("Session reset");
        self.inner
            .emit(SessionEvent::phase_changed(Phase::Idle, 0, state.session.rep_count()));
        self.inner.emit(SessionEvent::MarksChanged { marks: Vec::new() });
        self.inner.stop_cue();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().session.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().session.is_running()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine; the session keeps its own state.
        let _ = self.events.send(event);
    }

    /// Host side effects of entering a phase.
    fn announce(&self, session: &Session, transition: Transition) {
        self.emit(SessionEvent::phase_changed(
            transition.phase,
            transition.duration_secs,
            transition.rep_count,
        ));

        if transition.mark_appended {
            self.emit(SessionEvent::MarksChanged {
                marks: session.completed_marks().to_vec(),
            });
            self.play_cue();
        } else {
            self.stop_cue();
        }
    }

    fn play_cue(&self) {
        self.request_cue(CueAction::Play);
    }

    fn stop_cue(&self) {
        self.request_cue(CueAction::Stop);
    }

    // Queued while the lock is held so requests keep session order; the
    // worker runs them after the lock is gone.
    fn request_cue(&self, action: CueAction) {
        self.emit(SessionEvent::AudioCue { action });
        let _ = self.cues.send(action);
    }
}

/// Runs cue requests one at a time, in request order, off the session lock.
/// Exits once the controller is dropped.
fn spawn_cue_worker(cue: Arc<dyn AudioCue>) -> mpsc::Sender<CueAction> {
    let (tx, rx) = mpsc::channel::<CueAction>();
    thread::spawn(move || {
        while let Ok(action) = rx.recv() {
            let result = match action {
                CueAction::Play => cue.play(),
                CueAction::Stop => cue.stop(),
            };
            if let Err(e) = result {
                warn!("Audio cue {:?} failed: {}", action, e);
            }
        }
    });
    tx
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }
}

/// The countdown for one generation of the session.
///
/// Entering a break emits its `phase_changed`, the new mark and the cue request
/// together at the moment the previous phase hits zero. The lead-in then only
/// holds back the break's first tick, so the reported phase always matches
/// `Session::phase`.
async fn run_countdown(weak: Weak<Inner>, generation: u64, mut lead_in: bool) {
    let period = Duration::from_millis(TICK_INTERVAL_MS);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if lead_in {
            sleep(Duration::from_millis(CUE_LEAD_IN_MS)).await;
            ticker.reset();
            lead_in = false;
        }
        ticker.tick().await;

        let Some(inner) = weak.upgrade() else {
            return;
        };
        let mut state = inner.lock();
        if state.generation != generation {
            debug!("Stale countdown (generation {}) stopped", generation);
            return;
        }

        let phase = state.session.phase();
        match state.session.tick() {
            TickOutcome::Counted(remaining) => {
                inner.emit(SessionEvent::tick(remaining, phase));
            }
            TickOutcome::Advanced(transition) => {
                inner.emit(SessionEvent::tick(0, phase));
                info!(
                    "{} finished, entering {} (rep {})",
                    phase.display().title,
                    transition.phase.display().title,
                    transition.rep_count
                );
                inner.announce(&state.session, transition);
                lead_in = transition.mark_appended;
            }
            TickOutcome::Idle => return,
        }
    }
}
