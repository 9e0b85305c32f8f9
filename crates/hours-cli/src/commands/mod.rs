//! CLI subcommand implementations.

pub mod dump;
pub mod scan;
pub mod status;
pub mod watch;
