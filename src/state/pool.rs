use crate::{Utxo, UtxoId};
use std::collections::HashMap;
use std::convert::Infallible;

/// Point lookup of unspent outputs
///
/// Returns `Ok(None)` when the output never existed or has been spent.
/// Lookups must not have side effects. An `Err` is a failure of the pool
/// itself and is handed back to the caller of validation unchanged.
pub trait UtxoPool {
    type Error;

    fn get_utxo(&self, id: &UtxoId) -> Result<Option<Utxo>, Self::Error>;
}

impl UtxoPool for HashMap<UtxoId, Utxo> {
    type Error = Infallible;

    fn get_utxo(&self, id: &UtxoId) -> Result<Option<Utxo>, Self::Error> {
        Ok(self.get(id).cloned())
    }
}
