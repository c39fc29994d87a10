//! Presentation channels. The terminal is the only one.

pub mod cli;

pub use cli::CliChannel;
