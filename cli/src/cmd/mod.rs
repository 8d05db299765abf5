//! Subcommand implementations.

pub mod check;
pub mod folders;
pub mod scan;
pub mod watch;
pub mod workspace;
