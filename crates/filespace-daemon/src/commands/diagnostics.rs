//! Diagnostics command handlers.

use std::sync::Arc;

use super::Result;
use crate::DaemonState;

/// Anomalies found by the last load of the own filespace.
pub async fn get_diagnostics(state: &Arc<DaemonState>) -> Result {
    let session = state.session.lock().await;
    let diagnostics = session.diagnostics();
    let dropped = diagnostics.iter().filter(|d| d.drops_data()).count();
    Ok(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "account": session.identity().account,
        "contract_account": state.config.filespace.contract_account,
        "ledger_path": state.config.ledger_path(),
        "loaded": session.root().is_some(),
        "dropped": dropped,
        "anomalies": diagnostics
            .iter()
            .map(|d| serde_json::json!({"message": d.to_string(), "detail": d}))
            .collect::<Vec<_>>(),
    }))
}
