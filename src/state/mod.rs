//! UTXO State Module
//!
//! This module defines the read-only lookup contract the validator consumes
//! and the in-memory cache that backs it in the server.

mod cache;
mod pool;

pub use cache::UtxoCache;
pub use pool::UtxoPool;
