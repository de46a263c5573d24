//! Read-side queries that do not build a tree.

use filespace_types::rows::{EncryptedKeyGrant, Key, PostRow, ProfileRow, Table};
use filespace_types::tree::Profile;
use filespace_types::Id;
use tracing::{debug, warn};

use crate::collapse::visible_grant;
use crate::ledger::Ledger;
use crate::tables::decode_rows;
use crate::Result;

/// Accounts that have a filespace (every scope of the `folders` table).
pub async fn account_list<L: Ledger>(ledger: &L) -> Result<Vec<String>> {
    Ok(ledger.list_scopes(Table::Folders).await?)
}

/// Resolve `key_id` in `account`'s key tables for `viewer_public_key`.
///
/// Follows the same rule as versions: the key is returned only together with
/// the first grant addressed to the viewer.
pub async fn key_material<L: Ledger>(
    ledger: &L,
    account: &str,
    key_id: Id,
    viewer_public_key: &str,
) -> Result<(Option<Key>, Option<EncryptedKeyGrant>)> {
    let mut skipped = Vec::new();
    let grants: Vec<EncryptedKeyGrant> = decode_rows(
        Table::EncKeys,
        ledger.fetch_table(account, Table::EncKeys).await?,
        &mut skipped,
    );
    let Some(grant) = visible_grant(&grants, key_id, viewer_public_key).cloned() else {
        return Ok((None, None));
    };

    let keys: Vec<Key> = decode_rows(
        Table::Keys,
        ledger.fetch_table(account, Table::Keys).await?,
        &mut skipped,
    );
    let key = keys.into_iter().find(|key| key.id == key_id);
    if key.is_none() {
        warn!(account, key = key_id, "Grant refers to a missing key");
    }
    Ok((key, Some(grant)))
}

/// `account`'s profile, with its key resolved for `viewer_public_key`.
///
/// `None` when the account never set a profile.
pub async fn profile<L: Ledger>(
    ledger: &L,
    account: &str,
    viewer_public_key: &str,
) -> Result<Option<Profile>> {
    let mut skipped = Vec::new();
    let rows: Vec<ProfileRow> = decode_rows(
        Table::Profiles,
        ledger.fetch_table(account, Table::Profiles).await?,
        &mut skipped,
    );
    let Some(row) = rows.into_iter().next() else {
        debug!(account, "No profile set");
        return Ok(None);
    };

    let (key, grant) = match row.key {
        Some(key_id) => key_material(ledger, account, key_id, viewer_public_key).await?,
        None => (None, None),
    };
    Ok(Some(Profile {
        account: account.to_string(),
        ipfs_hash: row.ipfs_hash,
        key_id: row.key,
        key,
        grant,
    }))
}

/// All posts, in ledger row order.
pub async fn posts<L: Ledger>(ledger: &L, contract_account: &str) -> Result<Vec<PostRow>> {
    let mut skipped = Vec::new();
    Ok(decode_rows(
        Table::Posts,
        ledger.fetch_table(contract_account, Table::Posts).await?,
        &mut skipped,
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::MockLedger;

    fn ledger() -> MockLedger {
        MockLedger::new()
            .with_rows("alice", Table::Folders, vec![json!({"id": 1, "name": "root", "parent_folder": 0})])
            .with_rows("bob", Table::Folders, vec![json!({"id": 1, "name": "root", "parent_folder": 0})])
            .with_rows("alice", Table::Profiles, vec![json!({"ipfs_hash": "QmFace", "key": 9})])
            .with_rows("alice", Table::Keys, vec![json!({"id": 9, "iv": "iv9"})])
            .with_rows(
                "alice",
                Table::EncKeys,
                vec![
                    json!({"id": 1, "key": 9, "public_key": "PUB_BOB", "iv": "a", "nonce": "b", "value": "c"}),
                    json!({"id": 2, "key": 9, "public_key": "PUB_BOB", "iv": "d", "nonce": "e", "value": "f"}),
                ],
            )
            .with_rows("bob", Table::Profiles, vec![json!({"ipfs_hash": "QmBob", "key": 0})])
            .with_rows(
                "filespace",
                Table::Posts,
                vec![json!({"id": 3, "account": "bob", "is_folder": true, "subject": 1, "caption": "hello"})],
            )
    }

    #[tokio::test]
    async fn test_account_list() {
        let accounts = account_list(&ledger()).await.expect("accounts");
        assert_eq!(accounts, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[tokio::test]
    async fn test_profile_key_visible_to_grantee() {
        let profile = profile(&ledger(), "alice", "PUB_BOB")
            .await
            .expect("profile")
            .expect("alice has a profile");
        assert_eq!(profile.ipfs_hash, "QmFace");
        assert_eq!(profile.key.map(|k| k.iv), Some("iv9".to_string()));
        assert_eq!(profile.grant.map(|g| g.id), Some(1));
    }

    #[tokio::test]
    async fn test_profile_key_hidden_from_others() {
        let profile = profile(&ledger(), "alice", "PUB_CAROL")
            .await
            .expect("profile")
            .expect("alice has a profile");
        assert_eq!(profile.key_id, Some(9));
        assert!(profile.key.is_none());
        assert!(profile.grant.is_none());
    }

    #[tokio::test]
    async fn test_unencrypted_and_missing_profiles() {
        let bob = profile(&ledger(), "bob", "PUB_ALICE").await.expect("profile");
        assert_eq!(bob.map(|p| p.key_id), Some(None));

        let carol = profile(&ledger(), "carol", "PUB_ALICE").await.expect("profile");
        assert!(carol.is_none());
    }

    #[tokio::test]
    async fn test_posts() {
        let posts = posts(&ledger(), "filespace").await.expect("posts");
        assert_eq!(posts.len(), 1);
        assert!(posts[0].is_folder);
        assert_eq!(posts[0].caption, "hello");
    }
}
