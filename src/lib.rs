//! This crate decides whether a transaction may be accepted against a UTXO ledger.
//! It includes the transaction validator and its canonical signing payload, the
//! signature and UTXO lookup collaborators it consumes, snapshot persistence,
//! configuration, and a JSON-RPC surface for pool and block builders.

pub mod types; // Transactions, UTXOs and validation verdicts.
pub mod validation; // The validator and the canonical signing payload.
pub mod crypto; // Signature verification and signing over the payload.
pub mod state; // UTXO lookup contract and the in-memory snapshot.
pub mod store; // SQLite persistence of the UTXO snapshot.
pub mod api; // JSON-RPC server exposing validation.
pub mod config; // Defines and loads service configuration.

// Re-export commonly used types and configurations for easier access.
pub use types::*;
pub use config::Config;
pub use validation::{SigningPayload, Validator};
