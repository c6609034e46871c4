use anyhow::Result;

use super::args::{Cli, Commands};
use super::handlers;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve => handlers::serve::handle(&cli.base_url),
        Commands::Tools => handlers::tools::handle(),
    }
}
