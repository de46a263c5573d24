//! Command handlers that reach beyond the own filespace: other accounts,
//! likes, key sharing, profiles and posts.

use std::sync::Arc;

use filespace_core::ops::{KeyShare, NewKey, NewPost};
use filespace_types::Id;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_params, required_str, to_value, Result};
use crate::DaemonState;

#[derive(Deserialize)]
struct LikeParams {
    version_id: Id,
    /// Owner of the liked version. Defaults to the own account.
    #[serde(default)]
    account: Option<String>,
}

#[derive(Deserialize)]
struct SetProfileParams {
    ipfs_hash: String,
    #[serde(default)]
    key: Option<NewKey>,
}

/// Another account's tree and its anomalies, as seen by this identity.
pub async fn get_other_filespace(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account = required_str(params, "account")?;
    let session = state.session.lock().await;
    let collapsed = session.other_filespace(account).await?;
    to_value(&collapsed)
}

pub async fn get_account_list(state: &Arc<DaemonState>) -> Result {
    let accounts = state.session.lock().await.account_list().await?;
    to_value(&accounts)
}

pub async fn get_active_public_key(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account = required_str(params, "account")?;
    let key = state.session.lock().await.active_public_key(account).await?;
    to_value(&key)
}

pub async fn get_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let session = state.session.lock().await;
    let account = match params.get("account").and_then(|v| v.as_str()) {
        Some(account) => account.to_string(),
        None => session.identity().account.clone(),
    };
    let profile = session.profile(&account).await?;
    to_value(&profile)
}

pub async fn get_posts(state: &Arc<DaemonState>) -> Result {
    let posts = state.session.lock().await.posts().await?;
    to_value(&posts)
}

/// Like a version in the own filespace or, with `account`, in another one.
pub async fn like_version(state: &Arc<DaemonState>, params: &Value) -> Result {
    let params: LikeParams = parse_params(params)?;
    let mut session = state.session.lock().await;
    match params.account {
        Some(account) if account != session.identity().account => {
            let mut tree = session
                .other_filespace(&account)
                .await?
                .root
                .ok_or(filespace_core::FilespaceError::VersionNotFound(params.version_id))?;
            session.like_version_in(&mut tree, params.version_id).await?;
        }
        _ => session.like_version(params.version_id).await?,
    }
    Ok(serde_json::json!({"liked": true}))
}

pub async fn share_key(state: &Arc<DaemonState>, params: &Value) -> Result {
    let share: KeyShare = parse_params(params)?;
    state.session.lock().await.share_key(share).await?;
    Ok(serde_json::json!({"shared": true}))
}

/// Set the own profile; returns the key material visible to this identity.
pub async fn set_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let params: SetProfileParams = parse_params(params)?;
    let keys = state
        .session
        .lock()
        .await
        .set_profile(&params.ipfs_hash, params.key)
        .await?;
    to_value(&keys)
}

pub async fn add_post(state: &Arc<DaemonState>, params: &Value) -> Result {
    let post: NewPost = parse_params(params)?;
    state.session.lock().await.add_post(post).await?;
    Ok(serde_json::json!({"posted": true}))
}
