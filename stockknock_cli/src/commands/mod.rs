//! CLI subcommand implementations.

pub mod history;
pub mod price;
pub mod track;
pub mod update;
