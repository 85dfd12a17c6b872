use utxo_validator::{
    api::Server,
    config::Config,
    state::UtxoCache,
    store::UtxoStore,
};
use tracing::info;

/// The main entry point for the validator service.
///
/// Initializes logging, loads configuration, reads the UTXO snapshot from
/// SQLite into memory, and serves validation requests.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load("config/default.toml")?;
    info!("Validator starting with config: {:?}", config);

    let store = UtxoStore::connect(&config.snapshot.database_url).await?;
    store.migrate().await?;

    // Validation only reads the set, so it is loaded once and kept in memory
    let utxos = UtxoCache::new();
    utxos.load(store.load_all().await?).await;
    info!("Loaded {} UTXOs into snapshot", utxos.len().await);

    let server = Server::new(config, utxos);
    server.start().await?;

    Ok(())
}
