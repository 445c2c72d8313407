use serde::Serialize;
use tokio::sync::mpsc;

use super::phase::{Phase, PhaseColor, format_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CueAction {
    Play,
    Stop,
}

/// Notifications a session sends to whatever hosts it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Tick {
        remaining_seconds: u32,
        phase: Phase,
        clock: String,
    },
    PhaseChanged {
        phase: Phase,
        title: &'static str,
        color: PhaseColor,
        image: &'static str,
        remaining_seconds: u32,
        rep_count: u32,
    },
    MarksChanged {
        marks: Vec<String>,
    },
    AudioCue {
        action: CueAction,
    },
}

impl SessionEvent {
    pub fn tick(remaining_seconds: u32, phase: Phase) -> Self {
        SessionEvent::Tick {
            remaining_seconds,
            phase,
            clock: format_time(remaining_seconds),
        }
    }

    pub fn phase_changed(phase: Phase, remaining_seconds: u32, rep_count: u32) -> Self {
        let display = phase.display();
        SessionEvent::PhaseChanged {
            phase,
            title: display.title,
            color: display.color,
            image: display.image,
            remaining_seconds,
            rep_count,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_serialization() {
        let json = serde_json::to_string(&SessionEvent::tick(299, Phase::ShortBreak)).unwrap();
        assert!(json.contains("\"type\":\"tick\""));
        assert!(json.contains("\"remaining_seconds\":299"));
        assert!(json.contains("\"phase\":\"short_break\""));
        assert!(json.contains("\"clock\":\"04:59\""));
    }

    #[test]
    fn test_phase_changed_carries_display() {
        let event = SessionEvent::phase_changed(Phase::LongBreak, 900, 8);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "phase_changed");
        assert_eq!(value["title"], "Long Break");
        assert_eq!(value["color"], "magenta");
        assert_eq!(value["image"], "magenta_tomato");
        assert_eq!(value["rep_count"], 8);
    }

    #[test]
    fn test_audio_cue_serialization() {
        let json = serde_json::to_string(&SessionEvent::AudioCue {
            action: CueAction::Play,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"audio_cue","action":"play"}"#);
    }
}
