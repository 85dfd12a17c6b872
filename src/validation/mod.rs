//! Transaction Validation Module
//!
//! This module decides whether a transaction is valid against a UTXO snapshot.
//! It performs existence, amount, balance, signature and in-transaction
//! double-spend checks, and derives the canonical payload signatures cover.

mod payload;
mod validator;


pub use payload::SigningPayload;
pub use validator::Validator;
