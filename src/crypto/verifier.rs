use crate::validation::SigningPayload;
use ethers::signers::{LocalWallet, WalletError};
use ethers::types::{Address, Bytes, Signature};
use ethers::utils::hash_message;
use tracing::debug;

/// Capability to check that `signature` over `payload` was produced by `key`
///
/// Implementations must be deterministic for identical arguments.
pub trait SignatureVerifier {
    fn verify(&self, payload: &SigningPayload, signature: &[u8], key: &Address) -> bool;
}

/// secp256k1 ECDSA verifier
///
/// Expects 65-byte `r || s || v` signatures over the EIP-191 personal-message
/// hash of the payload. A signature verifies iff the address recovered from
/// it equals `key`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcdsaVerifier;

impl SignatureVerifier for EcdsaVerifier {
    fn verify(&self, payload: &SigningPayload, signature: &[u8], key: &Address) -> bool {
        let signature = match Signature::try_from(signature) {
            Ok(signature) => signature,
            Err(e) => {
                debug!("Malformed signature ({} bytes): {}", signature.len(), e);
                return false;
            }
        };

        signature.verify(payload.as_bytes().to_vec(), *key).is_ok()
    }
}

/// Sign a payload the way [`EcdsaVerifier`] expects
pub fn sign_payload(wallet: &LocalWallet, payload: &SigningPayload) -> Result<Bytes, WalletError> {
    let signature = wallet.sign_hash(hash_message(payload.as_bytes()))?;
    Ok(Bytes::from(signature.to_vec()))
}
