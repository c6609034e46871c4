use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "runlens")]
#[command(about = "Expose Weights & Biases experiment data to AI agents over MCP", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Base URL of the W&B API (self-hosted deployments override this).
    #[arg(
        long,
        env = "WANDB_BASE_URL",
        default_value = runlens_client::DEFAULT_BASE_URL,
        global = true
    )]
    pub base_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve,

    /// Print the tools this server exposes
    Tools,
}
