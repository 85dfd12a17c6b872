//! API Server Module
//!
//! This module implements a JSON-RPC server that validates transactions on
//! behalf of pool and block builders. Validation is read-only: the server
//! never admits transactions or mutates the UTXO set.

use crate::{
    config::Config,
    crypto::EcdsaVerifier,
    state::UtxoCache,
    validation::{SigningPayload, Validator},
    Transaction, UtxoId, ValidationReport,
};
use axum::{Router, routing::post, Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn, error};

/// Shared application state that is accessible across all request handlers
///
/// - `validator`: Checks transactions against a UTXO snapshot
/// - `utxos`: The in-memory UTXO set loaded at startup
#[derive(Clone)]
pub struct AppState {
    validator: Arc<Validator>,
    utxos: UtxoCache,
}

/// The main API server struct
pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    /// Creates a new API server instance
    ///
    /// # Arguments
    /// * `config` - Server configuration (host, port, etc.)
    /// * `utxos` - The UTXO set transactions are validated against
    pub fn new(config: Config, utxos: UtxoCache) -> Self {
        let state = AppState {
            validator: Arc::new(Validator::new(EcdsaVerifier)),
            utxos,
        };

        Self { config, state }
    }

    /// Router with the single JSON-RPC endpoint at "/"
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", post(handle_rpc))
            .with_state(self.state.clone())
    }

    /// Binds to the configured address and serves requests until shutdown
    pub async fn start(self) -> anyhow::Result<()> {
        let app = self.router();

        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// JSON-RPC 2.0 request structure
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    id: Value,
}

/// JSON-RPC 2.0 response structure
///
/// Either `result` or `error` will be populated, but not both.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Verdict returned by `validateTransaction`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationResponse {
    tx_id: String,
    #[serde(flatten)]
    report: ValidationReport,
    checked_at: String,
}

const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

fn success(id: Value, result: Value) -> Json<JsonRpcResponse> {
    Json(JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        result: Some(result),
        error: None,
        id,
    })
}

fn failure(id: Value, code: i32, message: String) -> Json<JsonRpcResponse> {
    Json(JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(JsonRpcError { code, message }),
        id,
    })
}

/// Decode request params, or produce the invalid-params response
fn decode_params<T: DeserializeOwned>(
    request: &JsonRpcRequest,
) -> Result<T, Json<JsonRpcResponse>> {
    serde_json::from_value(request.params.clone()).map_err(|e| {
        error!("Failed to deserialize params for {}: {}", request.method, e);
        failure(
            request.id.clone(),
            INVALID_PARAMS,
            format!("Invalid params: {}", e),
        )
    })
}

/// Main RPC request handler
///
/// Routes the request to the appropriate handler based on the method name.
async fn handle_rpc(
    State(state): State<AppState>,
    Json(request): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    info!("Received RPC request: {}", request.method);

    match request.method.as_str() {
        "validateTransaction" => handle_validate_transaction(state, request).await,
        "signingPayload" => handle_signing_payload(request),
        "getUtxo" => handle_get_utxo(state, request).await,
        _ => failure(request.id, METHOD_NOT_FOUND, "Method not found".to_string()),
    }
}

/// Handles the "validateTransaction" RPC method
///
/// The cache read guard is held for the whole check, so the verdict reflects
/// a single consistent snapshot.
async fn handle_validate_transaction(
    state: AppState,
    request: JsonRpcRequest,
) -> Json<JsonRpcResponse> {
    let tx: Transaction = match decode_params(&request) {
        Ok(tx) => tx,
        Err(response) => return response,
    };
    info!("Validating transaction {}", tx.id);

    let result = {
        let snapshot = state.utxos.snapshot().await;
        match state.validator.validate(&*snapshot, &tx) {
            Ok(result) => result,
            Err(never) => match never {},
        }
    };

    let report = result.report();
    if report.valid {
        info!("Transaction {} is valid", tx.id);
    } else {
        warn!(
            "Transaction {} rejected with {} error(s)",
            tx.id,
            report.errors.len()
        );
    }

    let response = ValidationResponse {
        tx_id: tx.id,
        report,
        checked_at: Utc::now().to_rfc3339(),
    };
    success(request.id, json!(response))
}

/// Handles the "signingPayload" RPC method
///
/// Returns the exact bytes each input of the transaction must sign.
fn handle_signing_payload(request: JsonRpcRequest) -> Json<JsonRpcResponse> {
    let tx: Transaction = match decode_params(&request) {
        Ok(tx) => tx,
        Err(response) => return response,
    };

    let payload = SigningPayload::derive(&tx);
    success(
        request.id,
        json!({
            "txId": tx.id,
            "payload": payload.to_bytes(),
        }),
    )
}

/// Handles the "getUtxo" RPC method; `null` when the output is not in the set
async fn handle_get_utxo(state: AppState, request: JsonRpcRequest) -> Json<JsonRpcResponse> {
    let id: UtxoId = match decode_params(&request) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let utxo = state.utxos.get(&id).await;
    success(request.id, json!(utxo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TransactionInput, TransactionOutput, Utxo, crypto::sign_payload};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use ethers::signers::{LocalWallet, Signer};
    use ethers::types::{Address, Bytes};
    use tower::ServiceExt;

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_config() -> Config {
        Config::parse(
            r#"
            [api]
            host = "127.0.0.1"
            port = 0

            [snapshot]
            database_url = "sqlite::memory:"
            "#,
        )
        .unwrap()
    }

    /// Helper function to create a server whose wallet owns `tx1:0` worth 100
    async fn test_server() -> (Server, UtxoCache, LocalWallet) {
        let wallet: LocalWallet = KEY.parse().unwrap();
        let utxos = UtxoCache::new();
        utxos
            .load(vec![Utxo {
                id: UtxoId::new("tx1", 0),
                amount: 100,
                recipient: wallet.address(),
            }])
            .await;

        (Server::new(test_config(), utxos.clone()), utxos, wallet)
    }

    fn spend_tx(wallet: &LocalWallet, amount: i64) -> Transaction {
        let mut tx = Transaction {
            id: "tx2".to_string(),
            inputs: vec![TransactionInput {
                utxo_id: UtxoId::new("tx1", 0),
                owner: wallet.address(),
                signature: Bytes::new(),
            }],
            outputs: vec![TransactionOutput {
                amount,
                recipient: Address::repeat_byte(0xbb),
            }],
            timestamp: 1_700_000_000_000,
        };
        let payload = SigningPayload::derive(&tx);
        tx.inputs[0].signature = sign_payload(wallet, &payload).unwrap();
        tx
    }

    async fn call(server: &Server, method: &str, params: Value) -> Value {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validate_accepts_signed_balanced_transaction() {
        let (server, utxos, wallet) = test_server().await;
        let tx = spend_tx(&wallet, 100);

        let response = call(&server, "validateTransaction", json!(tx)).await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["txId"], "tx2");
        assert_eq!(response["result"]["valid"], true);
        assert_eq!(response["result"]["errors"], json!([]));
        assert!(response["result"]["checkedAt"].is_string());
        // Validation never spends the UTXO
        assert!(utxos.get(&UtxoId::new("tx1", 0)).await.is_some());
    }

    #[tokio::test]
    async fn test_validate_reports_error_codes() {
        let (server, _, wallet) = test_server().await;
        let tx = spend_tx(&wallet, 90);

        let response = call(&server, "validateTransaction", json!(tx)).await;

        assert_eq!(response["result"]["valid"], false);
        // Signature still covers the changed output, so only the balance fails
        assert_eq!(response["result"]["errors"][0]["kind"], "AMOUNT_MISMATCH");
        assert_eq!(
            response["result"]["errors"][0]["message"],
            "input total 100 does not match output total 90"
        );
    }

    #[tokio::test]
    async fn test_validate_rejects_garbage_signature() {
        let (server, _, wallet) = test_server().await;
        let mut tx = spend_tx(&wallet, 100);
        tx.inputs[0].signature = Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]);

        let response = call(&server, "validateTransaction", json!(tx)).await;

        assert_eq!(response["result"]["valid"], false);
        assert_eq!(response["result"]["errors"][0]["kind"], "INVALID_SIGNATURE");
    }

    #[tokio::test]
    async fn test_signing_payload_matches_local_derivation() {
        let (server, _, wallet) = test_server().await;
        let tx = spend_tx(&wallet, 100);

        let response = call(&server, "signingPayload", json!(tx)).await;

        assert_eq!(response["result"]["txId"], "tx2");
        assert_eq!(
            response["result"]["payload"],
            json!(SigningPayload::derive(&tx).to_bytes())
        );
    }

    #[tokio::test]
    async fn test_get_utxo() {
        let (server, _, wallet) = test_server().await;

        let found = call(&server, "getUtxo", json!({"txId": "tx1", "outputIndex": 0})).await;
        let missing = call(&server, "getUtxo", json!({"txId": "tx1", "outputIndex": 1})).await;

        assert_eq!(found["result"]["amount"], 100);
        assert_eq!(found["result"]["recipient"], json!(wallet.address()));
        assert_eq!(missing["result"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (server, _, _) = test_server().await;

        let response = call(&server, "sendTransaction", json!({})).await;

        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
        assert!(response.get("result").is_none());
    }

    #[tokio::test]
    async fn test_invalid_params() {
        let (server, _, _) = test_server().await;

        let response = call(&server, "validateTransaction", json!({"id": 5})).await;

        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }
}
