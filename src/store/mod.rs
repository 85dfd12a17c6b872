//! UTXO Snapshot Store Module
//!
//! This module persists the UTXO snapshot the service validates against.
//! The snapshot is read once at startup and served from memory afterwards.
//!
//! # Storage
//! One SQLite table, `utxos`, keyed by `(tx_id, output_index)`.

mod database;
pub use database::{StoreError, UtxoStore};
