use anyhow::Result;
use runlens_client::{Client, Config};

use crate::mcp;

pub fn handle(base_url: &str) -> Result<()> {
    // The missing-credential check happens here, before any transport IO.
    let config = Config::from_env()?.with_base_url(base_url);
    let client = Client::connect(config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mcp::run_server(client))
}
