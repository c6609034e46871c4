mod args;
mod commands;
mod handlers;
pub mod mcp;

pub use args::{Cli, Commands};
pub use commands::run;
