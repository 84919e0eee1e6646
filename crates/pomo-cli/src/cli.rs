//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pomo_core::SessionId;
use pomo_engine::DEFAULT_RECENT_TAGS_LIMIT;

use crate::commands::session::StartArgs;

/// Pomodoro timer.
///
/// Runs focus and break sessions, tracks daily totals and suggests a long
/// break after every fourth completed focus session.
#[derive(Debug, Parser)]
#[command(name = "pomo", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Act on behalf of this owner (required in multi-user mode).
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Print JSON instead of human-readable output.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a focus session.
    Start(StartArgs),

    /// Start a short break.
    Break(StartArgs),

    /// Start a 15-minute long break and reset today's cycle.
    LongBreak,

    /// Decline the suggested long break and reset today's cycle.
    Decline,

    /// Stop the running session, if any.
    Stop,

    /// Mark a running session as completed.
    Complete {
        /// Session ID.
        id: SessionId,
    },

    /// Show the current timer state.
    State,

    /// Show one session.
    Show {
        /// Session ID.
        id: SessionId,
    },

    /// Show rollups of completed focus sessions.
    #[command(subcommand)]
    Stats(StatsCommand),

    /// List recently used tags.
    Tags {
        /// Maximum number of tags to list.
        #[arg(long, default_value_t = DEFAULT_RECENT_TAGS_LIMIT)]
        limit: usize,
    },

    /// List configured presets.
    Presets,
}

/// Rollup periods.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum StatsCommand {
    /// The last 7 days.
    Week,
    /// The last 30 days.
    Month,
    /// Totals per tag.
    Tags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_start_with_options() {
        let cli = Cli::try_parse_from([
            "pomo", "--json", "start", "--minutes", "30", "--tag", "Writing",
        ])
        .unwrap();
        assert!(cli.json);
        let Some(Commands::Start(args)) = cli.command else {
            panic!("expected start");
        };
        assert_eq!(args.minutes.as_deref(), Some("30"));
        assert_eq!(args.tag.as_deref(), Some("Writing"));
        assert_eq!(args.preset, None);
    }

    #[test]
    fn minutes_and_preset_conflict() {
        let result = Cli::try_parse_from(["pomo", "break", "--minutes", "5", "--preset", "long"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_stats_and_tags() {
        let cli = Cli::try_parse_from(["pomo", "stats", "month"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Stats(StatsCommand::Month))));

        let cli = Cli::try_parse_from(["pomo", "tags"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Tags { limit: 10 })));
    }
}
