//! CLI subcommand implementations.

pub mod output;
pub mod presets;
pub mod session;
pub mod state;
pub mod stats;
