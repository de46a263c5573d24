//! Own-filespace command handlers.

use std::sync::Arc;

use filespace_core::ops::NewFile;
use filespace_core::FilespaceError;
use filespace_types::Id;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_params, required_str, required_u64, to_value, Result};
use crate::DaemonState;

#[derive(Deserialize)]
struct AddFolderParams {
    id: Id,
    name: String,
    parent_id: Id,
}

#[derive(Deserialize)]
struct AddFileParams {
    parent_id: Id,
    #[serde(flatten)]
    file: NewFile,
}

/// The held tree.
pub async fn get_filespace(state: &Arc<DaemonState>) -> Result {
    let session = state.session.lock().await;
    let root = session.root().ok_or(FilespaceError::NotLoaded)?;
    to_value(root)
}

/// Reload the tree from the ledger, creating the root if missing.
pub async fn refresh_filespace(state: &Arc<DaemonState>) -> Result {
    let mut session = state.session.lock().await;
    let root = session.resolve_root().await?;
    to_value(root)
}

pub async fn contains_hash(state: &Arc<DaemonState>, params: &Value) -> Result {
    let ipfs_hash = required_str(params, "ipfs_hash")?;
    let session = state.session.lock().await;
    Ok(Value::Bool(session.contains_hash(ipfs_hash)))
}

/// Create a folder under an existing one.
///
/// `parent_id` is required: a parentless folder would become a root
/// candidate and replace the real root on the next load. The root itself is
/// only created by `refresh_filespace`.
pub async fn add_folder(state: &Arc<DaemonState>, params: &Value) -> Result {
    let params: AddFolderParams = parse_params(params)?;
    let mut session = state.session.lock().await;
    let folder = session
        .create_folder(params.id, &params.name, Some(params.parent_id))
        .await?;
    to_value(&folder)
}

pub async fn add_file(state: &Arc<DaemonState>, params: &Value) -> Result {
    let params: AddFileParams = parse_params(params)?;
    let mut session = state.session.lock().await;
    let file = session.create_file(params.parent_id, params.file).await?;
    to_value(&file)
}

pub async fn delete_folder(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = required_u64(params, "id")?;
    state.session.lock().await.delete_folder(id).await?;
    Ok(serde_json::json!({"deleted": true}))
}

pub async fn delete_file(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = required_u64(params, "id")?;
    state.session.lock().await.delete_file(id).await?;
    Ok(serde_json::json!({"deleted": true}))
}
