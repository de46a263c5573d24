//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! JSON-RPC method calls to the appropriate command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use filespace_core::{FilespaceError, LedgerError};
use filespace_types::action::ActionKind;
use filespace_types::Id;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC success response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    // Filespace errors

    /// The ledger refused a submission (-32020).
    pub fn ledger_rejected(step: Option<ActionKind>, detail: &str) -> Self {
        Self {
            code: -32020,
            message: "LEDGER_REJECTED".to_string(),
            data: Some(serde_json::json!({"step": step, "detail": detail})),
        }
    }

    /// Folder, file or version not in the loaded tree (-32021).
    pub fn node_not_found(kind: &str, id: Id) -> Self {
        Self {
            code: -32021,
            message: "NODE_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"kind": kind, "id": id})),
        }
    }

    /// No filespace loaded yet (-32022).
    pub fn not_loaded() -> Self {
        Self {
            code: -32022,
            message: "FILESPACE_NOT_LOADED".to_string(),
            data: None,
        }
    }
}

impl From<FilespaceError> for RpcError {
    fn from(err: FilespaceError) -> Self {
        match err {
            FilespaceError::Step { step, source } => {
                RpcError::ledger_rejected(Some(step), &source.to_string())
            }
            FilespaceError::Ledger(LedgerError::Rejected(detail)) => {
                RpcError::ledger_rejected(None, &detail)
            }
            FilespaceError::Ledger(e @ LedgerError::Unauthorized { .. }) => {
                RpcError::ledger_rejected(None, &e.to_string())
            }
            FilespaceError::Ledger(e) => RpcError::internal_error(&e.to_string()),
            FilespaceError::FolderNotFound(id) => RpcError::node_not_found("folder", id),
            FilespaceError::FileNotFound(id) => RpcError::node_not_found("file", id),
            FilespaceError::VersionNotFound(id) => RpcError::node_not_found("version", id),
            FilespaceError::NotLoaded => RpcError::not_loaded(),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }

    debug!(method, "Dispatching RPC method");

    let params = &request.params;
    let result = match method {
        // Own filespace
        "get_filespace" => commands::filespace::get_filespace(&state).await,
        "refresh_filespace" => commands::filespace::refresh_filespace(&state).await,
        "contains_hash" => commands::filespace::contains_hash(&state, params).await,
        "add_folder" => commands::filespace::add_folder(&state, params).await,
        "add_file" => commands::filespace::add_file(&state, params).await,
        "delete_folder" => commands::filespace::delete_folder(&state, params).await,
        "delete_file" => commands::filespace::delete_file(&state, params).await,

        // Other accounts
        "get_other_filespace" => commands::social::get_other_filespace(&state, params).await,
        "get_account_list" => commands::social::get_account_list(&state).await,
        "get_active_public_key" => commands::social::get_active_public_key(&state, params).await,
        "get_profile" => commands::social::get_profile(&state, params).await,
        "get_posts" => commands::social::get_posts(&state).await,
        "like_version" => commands::social::like_version(&state, params).await,
        "share_key" => commands::social::share_key(&state, params).await,
        "set_profile" => commands::social::set_profile(&state, params).await,
        "add_post" => commands::social::add_post(&state, params).await,

        // Diagnostics
        "get_diagnostics" => commands::diagnostics::get_diagnostics(&state).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => {
            warn!(method, code = err.code, message = %err.message, "RPC method failed");
            RpcResponse::error(id, err)
        }
    }
}

#[cfg(test)]
mod tests {
    use filespace_core::{Identity, Session, SessionConfig};
    use filespace_ledger::SqliteLedger;
    use serde_json::{json, Value};

    use super::*;
    use crate::config::DaemonConfig;

    async fn test_state() -> Arc<DaemonState> {
        let ledger = SqliteLedger::memory().expect("ledger");
        ledger
            .register_account("alice", "PUB_ALICE")
            .await
            .expect("register");
        let mut session = Session::new(
            ledger,
            Identity::new("alice", "PUB_ALICE"),
            SessionConfig::default(),
        );
        session.resolve_root().await.expect("root");
        Arc::new(DaemonState::new(session, DaemonConfig::default()))
    }

    async fn call(state: &Arc<DaemonState>, method: &str, params: Value) -> RpcResponse {
        let request = RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: json!(1),
            method: method.to_string(),
            params,
        };
        dispatch_request(state.clone(), request).await
    }

    #[test]
    fn test_rpc_error_codes() {
        assert_eq!(RpcError::method_not_found("unknown").code, -32601);
        assert_eq!(RpcError::ledger_rejected(None, "x").code, -32020);
        assert_eq!(RpcError::node_not_found("file", 3).code, -32021);

        let err = RpcError::not_loaded();
        assert_eq!(err.code, -32022);
        assert_eq!(err.message, "FILESPACE_NOT_LOADED");
    }

    #[test]
    fn test_filespace_error_mapping() {
        let err = RpcError::from(FilespaceError::Step {
            step: ActionKind::AddKey,
            source: LedgerError::Rejected("duplicate".into()),
        });
        assert_eq!(err.code, -32020);
        assert_eq!(err.data.expect("data")["step"], json!("add_key"));

        let err = RpcError::from(FilespaceError::VersionNotFound(9));
        assert_eq!(err.code, -32021);

        let err = RpcError::from(FilespaceError::Ledger(LedgerError::Unavailable("down".into())));
        assert_eq!(err.code, -32603);
    }

    #[test]
    fn test_rpc_response_success() {
        let resp = RpcResponse::success(json!(1), json!({"id": 1}));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_rpc_response_error() {
        let resp = RpcResponse::error(json!(1), RpcError::internal_error("test"));
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let state = test_state().await;
        let resp = call(&state, "get_wallet_balance", Value::Null).await;
        assert_eq!(resp.error.map(|e| e.code), Some(-32601));
    }

    #[tokio::test]
    async fn test_wrong_protocol_version() {
        let state = test_state().await;
        let request = RpcRequest {
            jsonrpc: "1.0".to_string(),
            id: json!(7),
            method: "get_filespace".to_string(),
            params: Value::Null,
        };
        let resp = dispatch_request(state, request).await;
        assert_eq!(resp.error.map(|e| e.code), Some(-32600));
    }

    #[tokio::test]
    async fn test_add_folder_and_file() {
        let state = test_state().await;
        let resp = call(&state, "add_folder", json!({"id": 2, "name": "docs", "parent_id": 1})).await;
        assert!(resp.error.is_none(), "{:?}", resp.error);

        let resp = call(
            &state,
            "add_file",
            json!({
                "parent_id": 2,
                "id": 10,
                "name": "a.txt",
                "date": 1,
                "ipfs_hash": "QmA",
                "sha256": "aa",
            }),
        )
        .await;
        let file = resp.result.expect("file");
        assert_eq!(file["current_version"], json!(10));

        let resp = call(&state, "contains_hash", json!({"ipfs_hash": "QmA"})).await;
        assert_eq!(resp.result, Some(json!(true)));

        let resp = call(&state, "get_filespace", Value::Null).await;
        let root = resp.result.expect("tree");
        assert_eq!(root["child_folders"][0]["child_files"][0]["name"], json!("a.txt"));
    }

    #[tokio::test]
    async fn test_missing_params() {
        let state = test_state().await;
        let resp = call(&state, "delete_file", json!({})).await;
        assert_eq!(resp.error.map(|e| e.code), Some(-32602));
    }

    #[tokio::test]
    async fn test_add_folder_requires_parent() {
        let state = test_state().await;
        let resp = call(&state, "add_folder", json!({"id": 2, "name": "stray"})).await;
        assert_eq!(resp.error.map(|e| e.code), Some(-32602));

        let resp = call(&state, "refresh_filespace", json!({})).await;
        let root = resp.result.expect("root");
        assert_eq!(root["id"], json!(1));
        assert_eq!(root["child_folders"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_node() {
        let state = test_state().await;
        let resp = call(&state, "delete_folder", json!({"id": 42})).await;
        assert_eq!(resp.error.map(|e| e.code), Some(-32021));
    }

    #[tokio::test]
    async fn test_duplicate_folder_rejected() {
        let state = test_state().await;
        let params = json!({"id": 2, "name": "docs", "parent_id": 1});
        assert!(call(&state, "add_folder", params.clone()).await.error.is_none());
        let resp = call(&state, "add_folder", params).await;
        assert_eq!(resp.error.map(|e| e.code), Some(-32020));
    }

    #[tokio::test]
    async fn test_active_public_key() {
        let state = test_state().await;
        let resp = call(&state, "get_active_public_key", json!({"account": "alice"})).await;
        assert_eq!(resp.result, Some(json!("PUB_ALICE")));
    }
}
