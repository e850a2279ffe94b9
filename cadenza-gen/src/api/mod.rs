//! HTTP API
//!
//! REST endpoints for planning, generation, polling, and artifact
//! download, plus an SSE stream of job events.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, AppContext};
