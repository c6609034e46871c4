//! MCP (Model Context Protocol) server implementation.
//!
//! JSON-RPC 2.0 over stdio: one request per line on stdin, one response
//! per line on stdout. The server exposes five read-only tools over the
//! shared tracking-service client.

mod dto;
mod presenter;
mod server;
mod tools;

pub use server::{RunlensServer, run_server, tool_descriptions};
