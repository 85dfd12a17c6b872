use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Value carried by an output
///
/// Signed so that malformed (negative) amounts survive decoding and can be
/// reported by the validator instead of being rejected by the parser.
pub type Amount = i64;

/// Identifier of a single output ever created: `(source transaction, output index)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoId {
    pub tx_id: String,
    pub output_index: u32,
}

impl UtxoId {
    pub fn new(tx_id: impl Into<String>, output_index: u32) -> Self {
        Self {
            tx_id: tx_id.into(),
            output_index,
        }
    }
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.output_index)
    }
}

/// Unspent output record as held by the UTXO pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub id: UtxoId,
    pub amount: Amount,
    pub recipient: Address,
}

/// Reference to a UTXO being spent, with the owner's claim and signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub utxo_id: UtxoId,
    /// Claimed owner; only part of the signing payload, authorization is
    /// checked against the referenced UTXO's recipient.
    pub owner: Address,
    pub signature: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub amount: Amount,
    pub recipient: Address,
}

/// Transaction proposed for acceptance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub timestamp: u64,
}

/// Category of a validation failure, as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    UtxoNotFound,
    NegativeAmount,
    AmountMismatch,
    InvalidSignature,
    DoubleSpending,
}

/// A single violated rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("UTXO {0} not found")]
    UtxoNotFound(UtxoId),
    #[error("output {index} has non-positive amount {amount}")]
    NegativeOutputAmount { index: usize, amount: Amount },
    #[error("UTXO {utxo_id} has non-positive amount {amount}")]
    NegativeUtxoAmount { utxo_id: UtxoId, amount: Amount },
    #[error("input total {inputs} does not match output total {outputs}")]
    AmountMismatch { inputs: i128, outputs: i128 },
    #[error("invalid signature for UTXO {0}")]
    InvalidSignature(UtxoId),
    #[error("UTXO {0} is spent more than once in the transaction")]
    DoubleSpending(UtxoId),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::UtxoNotFound(_) => ErrorKind::UtxoNotFound,
            ValidationError::NegativeOutputAmount { .. }
            | ValidationError::NegativeUtxoAmount { .. } => ErrorKind::NegativeAmount,
            ValidationError::AmountMismatch { .. } => ErrorKind::AmountMismatch,
            ValidationError::InvalidSignature(_) => ErrorKind::InvalidSignature,
            ValidationError::DoubleSpending(_) => ErrorKind::DoubleSpending,
        }
    }
}

/// Verdict for one transaction against one UTXO snapshot
///
/// Errors appear in the order the checks detected them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of errors of the given kind
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind() == kind).count()
    }

    /// Render the verdict into its caller-facing form
    pub fn report(&self) -> ValidationReport {
        ValidationReport {
            valid: self.is_valid(),
            errors: self
                .errors
                .iter()
                .map(|e| ErrorReport {
                    kind: e.kind(),
                    message: e.to_string(),
                })
                .collect(),
        }
    }
}

/// Serializable `{valid, errors: [{kind, message}]}` form of a [`ValidationResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ErrorReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}
