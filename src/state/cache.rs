use crate::{Utxo, UtxoId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Shared in-memory UTXO set
///
/// Validation runs against the map behind a read guard, so the snapshot
/// cannot change while a transaction is being checked.
#[derive(Clone, Default)]
pub struct UtxoCache {
    utxos: Arc<RwLock<HashMap<UtxoId, Utxo>>>,
}

impl UtxoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache, replacing any entry with the same id
    pub async fn load(&self, utxos: impl IntoIterator<Item = Utxo>) {
        let mut map = self.utxos.write().await;
        for utxo in utxos {
            map.insert(utxo.id.clone(), utxo);
        }
    }

    pub async fn get(&self, id: &UtxoId) -> Option<Utxo> {
        let utxos = self.utxos.read().await;
        utxos.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.utxos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.utxos.read().await.is_empty()
    }

    /// Hold a consistent view of the set for the lifetime of the guard
    pub async fn snapshot(&self) -> RwLockReadGuard<'_, HashMap<UtxoId, Utxo>> {
        self.utxos.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::UtxoPool;
    use ethers::types::Address;

    fn utxo(tx_id: &str, index: u32, amount: i64) -> Utxo {
        Utxo {
            id: UtxoId::new(tx_id, index),
            amount,
            recipient: Address::repeat_byte(0x11),
        }
    }

    #[tokio::test]
    async fn test_load_and_get() {
        let cache = UtxoCache::new();
        assert!(cache.is_empty().await);

        cache.load(vec![utxo("tx1", 0, 100), utxo("tx1", 1, 50)]).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get(&UtxoId::new("tx1", 1)).await.unwrap().amount, 50);
        assert!(cache.get(&UtxoId::new("tx2", 0)).await.is_none());
    }

    #[tokio::test]
    async fn test_load_replaces_same_id() {
        let cache = UtxoCache::new();
        cache.load(vec![utxo("tx1", 0, 100)]).await;
        cache.load(vec![utxo("tx1", 0, 75)]).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&UtxoId::new("tx1", 0)).await.unwrap().amount, 75);
    }

    #[tokio::test]
    async fn test_snapshot_serves_as_pool() {
        let cache = UtxoCache::new();
        cache.load(vec![utxo("tx1", 0, 100)]).await;

        let snapshot = cache.snapshot().await;
        let found = snapshot.get_utxo(&UtxoId::new("tx1", 0)).unwrap();

        assert_eq!(found, Some(utxo("tx1", 0, 100)));
        assert_eq!(snapshot.get_utxo(&UtxoId::new("tx1", 9)).unwrap(), None);
    }
}
