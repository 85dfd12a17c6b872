use crate::{Utxo, UtxoId};
use ethers::types::Address;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt UTXO row {tx_id}:{output_index}: {reason}")]
    Corrupt {
        tx_id: String,
        output_index: i64,
        reason: String,
    },
}

/// SQLite-backed UTXO snapshot
pub struct UtxoStore {
    pool: SqlitePool,
}

impl UtxoStore {
    /// Open the database at `url`, creating the file if it does not exist
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // A single connection keeps `sqlite::memory:` databases coherent
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        info!("Connected to UTXO store at {}", url);
        Ok(Self { pool })
    }

    /// Create the `utxos` table if needed
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS utxos (
                tx_id TEXT NOT NULL,
                output_index INTEGER NOT NULL,
                amount INTEGER NOT NULL,
                recipient TEXT NOT NULL,
                PRIMARY KEY (tx_id, output_index)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Seed one output into the snapshot
    pub async fn insert(&self, utxo: &Utxo) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO utxos (tx_id, output_index, amount, recipient) VALUES (?, ?, ?, ?)",
        )
        .bind(&utxo.id.tx_id)
        .bind(i64::from(utxo.id.output_index))
        .bind(utxo.amount)
        .bind(format!("{:?}", utxo.recipient))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Read the whole snapshot, ordered by `(tx_id, output_index)`
    pub async fn load_all(&self) -> Result<Vec<Utxo>, StoreError> {
        let rows: Vec<(String, i64, i64, String)> = sqlx::query_as(
            "SELECT tx_id, output_index, amount, recipient FROM utxos ORDER BY tx_id, output_index",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(decode_row).collect()
    }
}

fn decode_row(
    (tx_id, output_index, amount, recipient): (String, i64, i64, String),
) -> Result<Utxo, StoreError> {
    let index = match u32::try_from(output_index) {
        Ok(index) => index,
        Err(_) => {
            return Err(StoreError::Corrupt {
                tx_id,
                output_index,
                reason: "output index out of range".to_string(),
            });
        }
    };

    let recipient = match Address::from_str(&recipient) {
        Ok(address) => address,
        Err(e) => {
            return Err(StoreError::Corrupt {
                tx_id,
                output_index,
                reason: format!("invalid recipient {:?}: {}", recipient, e),
            });
        }
    };

    Ok(Utxo {
        id: UtxoId::new(tx_id, index),
        amount,
        recipient,
    })
}
