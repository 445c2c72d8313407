use serde::Serialize;

pub const WORK_SECONDS: u32 = 25 * 60; // Work phase, 25 minutes
pub const SHORT_BREAK_SECONDS: u32 = 5 * 60; // Short break, 5 minutes
pub const LONG_BREAK_SECONDS: u32 = 15 * 60; // Long break, 15 minutes
pub const LONG_BREAK_EVERY_REPS: u32 = 8; // Every 4th break is a long one

pub const TICK_INTERVAL_MS: u64 = 1000; // Countdown resolution
pub const CUE_LEAD_IN_MS: u64 = 1000; // Let the cue start before a break counts down

/// Token appended to the session history for every break that begins.
pub const CHECK_MARK: &str = "✔ ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Work,
    ShortBreak,
    LongBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseColor {
    Green,
    Red,
    Magenta,
}

/// What a host shows while a phase is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseDisplay {
    pub title: &'static str,
    pub color: PhaseColor,
    pub image: &'static str,
}

impl Phase {
    /// Scheduling rule: odd reps work, even reps rest, every 8th rep rests longer.
    pub fn for_rep(rep: u32) -> Phase {
        if rep % 2 == 1 {
            Phase::Work
        } else if rep % LONG_BREAK_EVERY_REPS == 0 {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        }
    }

    pub fn duration_secs(&self) -> u32 {
        match self {
            Phase::Idle => 0,
            Phase::Work => WORK_SECONDS,
            Phase::ShortBreak => SHORT_BREAK_SECONDS,
            Phase::LongBreak => LONG_BREAK_SECONDS,
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Phase::ShortBreak | Phase::LongBreak)
    }

    pub fn display(&self) -> PhaseDisplay {
        match self {
            Phase::Idle => PhaseDisplay {
                title: "Timer",
                color: PhaseColor::Green,
                image: "green_tomato",
            },
            Phase::Work => PhaseDisplay {
                title: "Work",
                color: PhaseColor::Green,
                image: "green_tomato",
            },
            Phase::ShortBreak => PhaseDisplay {
                title: "Short Break",
                color: PhaseColor::Red,
                image: "red_tomato",
            },
            Phase::LongBreak => PhaseDisplay {
                title: "Long Break",
                color: PhaseColor::Magenta,
                image: "magenta_tomato",
            },
        }
    }

    pub(crate) fn emoji(&self) -> &str {
        match self {
            Phase::Idle => "⏸",
            Phase::Work => "💼",
            Phase::ShortBreak => "☕",
            Phase::LongBreak => "🌴",
        }
    }
}

/// Renders seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
