use crate::{
    crypto::{EcdsaVerifier, SignatureVerifier},
    state::UtxoPool,
    Transaction, TransactionInput, TransactionOutput, Utxo, UtxoId, ValidationError,
    ValidationResult,
};
use super::SigningPayload;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Transaction validator
///
/// Checks a transaction against a UTXO snapshot. Every check runs, and every
/// violation is collected; nothing short-circuits.
pub struct Validator<V = EcdsaVerifier> {
    verifier: V,
}

impl<V: SignatureVerifier> Validator<V> {
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Validate a transaction against `pool`
    ///
    /// Rule violations are reported inside the returned [`ValidationResult`].
    /// `Err` is only returned when the pool itself fails a lookup.
    pub fn validate<P>(&self, pool: &P, tx: &Transaction) -> Result<ValidationResult, P::Error>
    where
        P: UtxoPool + ?Sized,
    {
        debug!(
            "Validating transaction {} ({} inputs, {} outputs)",
            tx.id,
            tx.inputs.len(),
            tx.outputs.len()
        );

        let resolved = resolve_inputs(pool, &tx.inputs)?;
        let mut errors = Vec::new();

        // 1. Every input must reference an existing UTXO
        check_existence(&tx.inputs, &resolved, &mut errors);

        // 2. Outputs must be positive
        let total_output = check_outputs(&tx.outputs, &mut errors);

        // 3. Referenced UTXOs must be positive
        let total_input = check_input_amounts(&resolved, &mut errors);

        // 4. Value is neither created nor destroyed
        check_balance(total_input, total_output, &mut errors);

        // 5. Each input is signed by the UTXO's recipient
        self.check_signatures(tx, &resolved, &mut errors);

        // 6. No UTXO is spent twice within the transaction
        check_double_spending(&tx.inputs, &mut errors);

        let result = ValidationResult { errors };
        if result.is_valid() {
            debug!("Transaction {} validation successful", tx.id);
        } else {
            debug!(
                "Transaction {} failed validation with {} error(s)",
                tx.id,
                result.errors.len()
            );
        }

        Ok(result)
    }

    /// Verify each resolved input's signature over the shared payload
    fn check_signatures(
        &self,
        tx: &Transaction,
        resolved: &[Option<Utxo>],
        errors: &mut Vec<ValidationError>,
    ) {
        // Only derived when there is something to verify
        let mut payload: Option<SigningPayload> = None;

        for (input, utxo) in tx.inputs.iter().zip(resolved) {
            let Some(utxo) = utxo else { continue };
            let payload = payload.get_or_insert_with(|| SigningPayload::derive(tx));

            if !self.verifier.verify(payload, &input.signature, &utxo.recipient) {
                warn!(
                    "Signature verification failed for {}: expected signer {:?}",
                    input.utxo_id, utxo.recipient
                );
                errors.push(ValidationError::InvalidSignature(input.utxo_id.clone()));
            }
        }
    }
}

/// Look up every input's UTXO exactly once, preserving input order
fn resolve_inputs<P>(pool: &P, inputs: &[TransactionInput]) -> Result<Vec<Option<Utxo>>, P::Error>
where
    P: UtxoPool + ?Sized,
{
    inputs
        .iter()
        .map(|input| pool.get_utxo(&input.utxo_id))
        .collect()
}

fn check_existence(
    inputs: &[TransactionInput],
    resolved: &[Option<Utxo>],
    errors: &mut Vec<ValidationError>,
) {
    for (input, utxo) in inputs.iter().zip(resolved) {
        if utxo.is_none() {
            warn!("UTXO {} not found", input.utxo_id);
            errors.push(ValidationError::UtxoNotFound(input.utxo_id.clone()));
        }
    }
}

/// Returns the sum of all output amounts, non-positive ones included
fn check_outputs(outputs: &[TransactionOutput], errors: &mut Vec<ValidationError>) -> i128 {
    let mut total = 0i128;

    for (index, output) in outputs.iter().enumerate() {
        if output.amount <= 0 {
            warn!("Output {} has non-positive amount {}", index, output.amount);
            errors.push(ValidationError::NegativeOutputAmount {
                index,
                amount: output.amount,
            });
        }
        total += i128::from(output.amount);
    }

    total
}

/// Returns the sum of resolved UTXO amounts; missing UTXOs contribute nothing
fn check_input_amounts(resolved: &[Option<Utxo>], errors: &mut Vec<ValidationError>) -> i128 {
    let mut total = 0i128;

    for utxo in resolved.iter().flatten() {
        if utxo.amount <= 0 {
            warn!("UTXO {} has non-positive amount {}", utxo.id, utxo.amount);
            errors.push(ValidationError::NegativeUtxoAmount {
                utxo_id: utxo.id.clone(),
                amount: utxo.amount,
            });
        }
        total += i128::from(utxo.amount);
    }

    total
}

fn check_balance(total_input: i128, total_output: i128, errors: &mut Vec<ValidationError>) {
    if total_input != total_output {
        warn!(
            "Amount mismatch: inputs {}, outputs {}",
            total_input, total_output
        );
        errors.push(ValidationError::AmountMismatch {
            inputs: total_input,
            outputs: total_output,
        });
    }
}

/// Flags every occurrence of a UTXO id after its first
fn check_double_spending(inputs: &[TransactionInput], errors: &mut Vec<ValidationError>) {
    let mut seen: HashSet<&UtxoId> = HashSet::with_capacity(inputs.len());

    for input in inputs {
        if !seen.insert(&input.utxo_id) {
            warn!("UTXO {} spent more than once", input.utxo_id);
            errors.push(ValidationError::DoubleSpending(input.utxo_id.clone()));
        }
    }
}
