use serde::Serialize;

use super::phase::{CHECK_MARK, Phase, format_time};
use crate::error::SessionError;

/// What entering a phase asks of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub phase: Phase,
    pub duration_secs: u32,
    pub rep_count: u32,
    /// A break appended a mark and wants the cue played before it counts down.
    pub mark_appended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown moved; carries the seconds left.
    Counted(u32),
    /// The countdown hit zero and the next phase began.
    Advanced(Transition),
    /// Nothing to count down.
    Idle,
}

/// In-memory Pomodoro session. Every mutation goes through the methods below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    phase: Phase,
    rep_count: u32,
    remaining_seconds: u32,
    completed_marks: Vec<String>,
    running: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub title: &'static str,
    pub rep_count: u32,
    pub remaining_seconds: u32,
    pub clock: String,
    pub marks: Vec<String>,
    pub running: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            rep_count: 1,
            remaining_seconds: 0,
            completed_marks: Vec::new(),
            running: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn completed_marks(&self) -> &[String] {
        &self.completed_marks
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Marks the session as running and enters the phase for the current rep.
    pub fn begin(&mut self) -> Result<Transition, SessionError> {
        if self.running {
            return Err(SessionError::AlreadyRunning);
        }
        self.running = true;
        Ok(self.advance_phase())
    }

    /// Enters the phase the scheduling rule assigns to `rep_count`.
    pub fn advance_phase(&mut self) -> Transition {
        let phase = Phase::for_rep(self.rep_count);
        let duration_secs = phase.duration_secs();

        let mark_appended = phase.is_break();
        if mark_appended {
            self.completed_marks.push(CHECK_MARK.to_string());
        }

        self.phase = phase;
        self.remaining_seconds = duration_secs;

        Transition {
            phase,
            duration_secs,
            rep_count: self.rep_count,
            mark_appended,
        }
    }

    /// One second of countdown. Reaching zero completes the rep and enters the next phase.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running || self.remaining_seconds == 0 {
            return TickOutcome::Idle;
        }

        self.remaining_seconds -= 1;
        if self.remaining_seconds > 0 {
            return TickOutcome::Counted(self.remaining_seconds);
        }

        self.rep_count += 1;
        TickOutcome::Advanced(self.advance_phase())
    }

    /// Back to the post-load state. Returns whether anything changed.
    pub fn reset(&mut self) -> bool {
        let was_idle = *self == Session::new();
        *self = Session::new();
        !was_idle
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            title: self.phase.display().title,
            rep_count: self.rep_count,
            remaining_seconds: self.remaining_seconds,
            clock: format_time(self.remaining_seconds),
            marks: self.completed_marks.clone(),
            running: self.running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn tick_n(session: &mut Session, n: u32) -> Vec<TickOutcome> {
        (0..n).map(|_| session.tick()).collect()
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.rep_count(), 1);
        assert_eq!(session.remaining_seconds(), 0);
        assert!(session.completed_marks().is_empty());
        assert!(!session.is_running());
    }

    #[test]
    fn test_begin_enters_work() {
        let mut session = Session::new();
        let transition = session.begin().unwrap();
        assert_eq!(transition.phase, Phase::Work);
        assert_eq!(transition.duration_secs, 1500);
        assert!(!transition.mark_appended);
        assert_eq!(session.remaining_seconds(), 1500);
        assert!(session.is_running());
    }

    #[test]
    fn test_begin_twice_is_rejected() {
        let mut session = Session::new();
        session.begin().unwrap();
        let before = session.clone();
        assert_matches!(session.begin(), Err(SessionError::AlreadyRunning));
        assert_eq!(session, before);
    }

    #[test]
    fn test_work_then_short_break() {
        let mut session = Session::new();
        session.begin().unwrap();

        let outcomes = tick_n(&mut session, 1500);
        assert_matches!(outcomes[0], TickOutcome::Counted(1499));
        assert_matches!(outcomes[1498], TickOutcome::Counted(1));
        assert_matches!(
            outcomes[1499],
            TickOutcome::Advanced(Transition {
                phase: Phase::ShortBreak,
                duration_secs: 300,
                rep_count: 2,
                mark_appended: true,
            })
        );
        assert_eq!(session.completed_marks().to_vec(), vec!["✔ ".to_string()]);
    }

    #[test]
    fn test_exactly_one_advance_per_zero() {
        let mut session = Session::new();
        session.begin().unwrap();

        let advances = tick_n(&mut session, 1500 + 300)
            .into_iter()
            .filter(|o| matches!(o, TickOutcome::Advanced(_)))
            .count();
        assert_eq!(advances, 2);
        assert_eq!(session.phase(), Phase::Work);
        assert_eq!(session.rep_count(), 3);
    }

    #[test]
    fn test_eighth_rep_is_long_break() {
        let mut session = Session::new();
        session.begin().unwrap();

        while session.rep_count() < 8 {
            session.tick();
        }
        assert_eq!(session.phase(), Phase::LongBreak);
        assert_eq!(session.remaining_seconds(), 900);
        assert_eq!(session.completed_marks().len(), 4);
    }

    #[test]
    fn test_marks_count_completed_breaks_only() {
        let mut session = Session::new();
        session.begin().unwrap();

        let mut breaks = 0;
        for _ in 0..20_000 {
            if let TickOutcome::Advanced(t) = session.tick() {
                if t.phase.is_break() {
                    breaks += 1;
                }
                assert_eq!(t.phase, Phase::for_rep(t.rep_count));
            }
        }
        assert_eq!(session.completed_marks().len(), breaks);
    }

    #[test]
    fn test_tick_when_stopped_is_ignored() {
        let mut session = Session::new();
        assert_matches!(session.tick(), TickOutcome::Idle);
        assert_eq!(session, Session::new());
    }

    #[test]
    fn test_reset_mid_countdown() {
        let mut session = Session::new();
        session.begin().unwrap();
        tick_n(&mut session, 1700);

        assert!(session.reset());
        assert_eq!(session, Session::new());
        assert_matches!(session.tick(), TickOutcome::Idle);
    }

    #[test]
    fn test_reset_when_idle_is_noop() {
        let mut session = Session::new();
        assert!(!session.reset());
        assert_eq!(session, Session::new());
    }

    #[test]
    fn test_snapshot() {
        let mut session = Session::new();
        session.begin().unwrap();
        session.tick();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::Work);
        assert_eq!(snapshot.title, "Work");
        assert_eq!(snapshot.clock, "24:59");
        assert!(snapshot.running);
    }
}
