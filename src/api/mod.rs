//! API Module
//!
//! This module exposes transaction validation over JSON-RPC.

mod server;
pub use server::Server;
