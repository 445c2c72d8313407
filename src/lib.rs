pub mod audio;
pub mod config;
pub mod error;
pub mod pomodoro;
pub mod terminal;
pub mod ws;
