use anyhow::Result;

use crate::mcp::tool_descriptions;

/// Human smoke check: print every tool the server exposes, no network or
/// credential needed.
pub fn handle() -> Result<()> {
    for (name, description) in tool_descriptions() {
        println!("{:<18} {}", name, description);
    }
    Ok(())
}
