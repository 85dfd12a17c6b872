//! Signature Module
//!
//! This module provides the signature capability the validator consumes.
//! Inputs are authorized with secp256k1 ECDSA over the canonical signing
//! payload, using Ethereum personal-message hashing.

mod verifier;
pub use verifier::{EcdsaVerifier, SignatureVerifier, sign_payload};
