//! CLI subcommand implementations

pub mod generate;
pub mod validate;
