use std::io::{self, Write};

use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::error::SessionError;
use crate::pomodoro::{CueAction, EventReceiver, SessionController, SessionEvent, SessionSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Status,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Option<Command> {
        match input.trim().to_lowercase().as_str() {
            "start" | "s" => Some(Command::Start),
            "reset" | "r" => Some(Command::Reset),
            "status" | "st" => Some(Command::Status),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// One piece of terminal output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Redrawn in place on the countdown line.
    Inline(String),
    Line(String),
}

pub fn render_event(event: &SessionEvent, timestamp: &str) -> Option<Output> {
    match event {
        SessionEvent::Tick { phase, clock, .. } => Some(Output::Inline(format!(
            "{} {} {}",
            phase.emoji(),
            phase.display().title,
            clock
        ))),
        SessionEvent::PhaseChanged {
            phase,
            title,
            remaining_seconds,
            rep_count,
            ..
        } => Some(Output::Line(format!(
            "{} [{}] Switched to {} (rep {}, {})",
            phase.emoji(),
            timestamp,
            title,
            rep_count,
            crate::pomodoro::format_time(*remaining_seconds)
        ))),
        SessionEvent::MarksChanged { marks } if marks.is_empty() => None,
        SessionEvent::MarksChanged { marks } => {
            Some(Output::Line(format!("Completed: {}", marks.concat().trim_end())))
        }
        SessionEvent::AudioCue {
            action: CueAction::Play,
        } => Some(Output::Line("Break started, step away for a bit.".to_string())),
        SessionEvent::AudioCue {
            action: CueAction::Stop,
        } => None,
    }
}

pub fn render_status(snapshot: &SessionSnapshot) -> String {
    let state = if snapshot.running { "running" } else { "stopped" };
    let marks = if snapshot.marks.is_empty() {
        "-".to_string()
    } else {
        snapshot.marks.concat().trim_end().to_string()
    };
    format!(
        "{} {} | rep {} | {} | marks: {}",
        snapshot.title, snapshot.clock, snapshot.rep_count, state, marks
    )
}

fn print_output(output: Output) {
    match output {
        Output::Inline(text) => {
            print!("\r{}   ", text);
            let _ = io::stdout().flush();
        }
        Output::Line(text) => println!("\n{}", text),
    }
}

/// Interactive host: commands from stdin, countdown on stdout.
pub async fn run(controller: SessionController, mut events: EventReceiver) -> io::Result<()> {
    println!("🍅 Tomato Timer");
    println!("======================================================");
    println!("Commands: start (s), reset (r), status, quit (q)\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Some(Command::Start) => {
                        if let Err(SessionError::AlreadyRunning) = controller.start() {
                            debug!("Start ignored, already running");
                        }
                    }
                    Some(Command::Reset) => controller.reset(),
                    Some(Command::Status) => println!("{}", render_status(&controller.snapshot())),
                    Some(Command::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => println!("Unknown command. Try: start, reset, status, quit"),
                }
            }
            Some(event) = events.recv() => {
                let timestamp = Local::now().format("%H:%M:%S").to_string();
                if let Some(output) = render_event(&event, &timestamp) {
                    print_output(output);
                }
            }
        }
    }

    controller.reset();
    println!();
    Ok(())
}
