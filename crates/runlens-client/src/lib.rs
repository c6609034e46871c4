//! runlens-client: read-only access to the Weights & Biases API.
//!
//! The crate exposes three layers:
//! - [`TrackingApi`], the async seam every backend implements;
//! - [`WandbHttp`], the GraphQL-over-HTTP backend for api.wandb.ai;
//! - [`Client`], a cheap-to-clone facade holding one shared backend.
//!
//! Tool handlers only ever see [`Client`], so tests inject an in-memory
//! backend instead of the network one.

mod api;
mod client;
mod config;
mod error;
mod wandb;

pub use api::TrackingApi;
pub use client::Client;
pub use config::{Config, DEFAULT_BASE_URL};
pub use error::{Error, Result};
pub use wandb::WandbHttp;
