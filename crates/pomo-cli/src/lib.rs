//! Pomodoro timer CLI library.
//!
//! This crate provides the CLI interface for the pomodoro timer.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, StatsCommand};
pub use config::{Config, LogFormat};
