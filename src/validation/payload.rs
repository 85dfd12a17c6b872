//! Canonical Signing Payload
//!
//! Signers and verifiers must derive byte-identical payloads independently,
//! so the encoding below is a compatibility contract:
//!
//! - compact JSON (no insignificant whitespace), UTF-8
//! - object keys in ascending lexicographic order at every level
//! - top level: `{"id":..,"inputs":[..],"outputs":[..],"timestamp":..}`
//! - input: `{"owner":"0x..","utxoId":{"outputIndex":..,"txId":".."}}`
//! - output: `{"amount":..,"recipient":"0x.."}`
//! - addresses as `0x`-prefixed lowercase hex, integers in plain decimal
//!
//! Input signatures are never part of the payload.

use crate::Transaction;
use ethers::types::Bytes;
use serde_json::{Value, json};

/// The exact bytes every input signature of a transaction is computed over
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SigningPayload(Vec<u8>);

impl SigningPayload {
    /// Derive the payload for a transaction
    ///
    /// Keys are inserted in sorted order so the output is the same whether or
    /// not serde_json preserves insertion order.
    pub fn derive(tx: &Transaction) -> Self {
        let inputs: Vec<Value> = tx
            .inputs
            .iter()
            .map(|input| {
                json!({
                    "owner": input.owner,
                    "utxoId": {
                        "outputIndex": input.utxo_id.output_index,
                        "txId": input.utxo_id.tx_id,
                    },
                })
            })
            .collect();

        let outputs: Vec<Value> = tx
            .outputs
            .iter()
            .map(|output| {
                json!({
                    "amount": output.amount,
                    "recipient": output.recipient,
                })
            })
            .collect();

        let payload = json!({
            "id": tx.id,
            "inputs": inputs,
            "outputs": outputs,
            "timestamp": tx.timestamp,
        });

        Self(payload.to_string().into_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload as `0x`-prefixed hex bytes, for handing to external signers
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.0.clone())
    }
}
