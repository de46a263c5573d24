//! Integration test: one account building and reloading its filespace.
//!
//! Exercises the session lifecycle against the SQLite ledger:
//! 1. First load finds no root and creates it
//! 2. Folders and files are created under it
//! 3. A fresh load reproduces exactly the locally patched tree
//! 4. Deletes are reflected both locally and after reload
//! 5. A failing pipeline step leaves the tree untouched and stops later steps

use std::sync::Arc;

use filespace_core::ops::{NewFile, NewKey, WrappedKey};
use filespace_core::{FilespaceError, Identity, Ledger, Session, SessionConfig, SkipReason};
use filespace_ledger::SqliteLedger;
use filespace_types::action::ActionKind;
use filespace_types::rows::Table;

fn alice(ledger: &Arc<SqliteLedger>) -> Session<Arc<SqliteLedger>> {
    Session::new(
        ledger.clone(),
        Identity::new("alice", "PUB_ALICE"),
        SessionConfig::default(),
    )
}

fn plain_file(id: u64, name: &str, hash: &str) -> NewFile {
    NewFile {
        id,
        name: name.to_string(),
        date: 1_700_000_000_000 + id,
        ipfs_hash: hash.to_string(),
        sha256: format!("sha-{id}"),
        key: None,
    }
}

fn encrypted_file(id: u64, name: &str, hash: &str) -> NewFile {
    NewFile {
        key: Some(NewKey {
            iv: format!("iv-{id}"),
            wrapped: Some(WrappedKey {
                public_key: "PUB_ALICE".to_string(),
                iv: format!("wrap-iv-{id}"),
                nonce: format!("nonce-{id}"),
                value: format!("wrapped-{id}"),
            }),
        }),
        ..plain_file(id, name, hash)
    }
}

#[tokio::test]
async fn test_first_load_creates_root() {
    let ledger = Arc::new(SqliteLedger::memory().expect("ledger"));
    let mut session = alice(&ledger);

    let root = session.resolve_root().await.expect("resolve");
    assert_eq!(root.id, 1);
    assert_eq!(root.name, "root");
    assert!(root.is_root());

    let rows = ledger.fetch_table("alice", Table::Folders).await.expect("fetch");
    assert_eq!(rows.len(), 1);

    // A second session finds the existing root instead of creating another.
    let mut again = alice(&ledger);
    again.resolve_root().await.expect("resolve again");
    let rows = ledger.fetch_table("alice", Table::Folders).await.expect("fetch");
    assert_eq!(rows.len(), 1);
    assert!(again.diagnostics().is_empty());
}

#[tokio::test]
async fn test_patched_tree_matches_reload() {
    let ledger = Arc::new(SqliteLedger::memory().expect("ledger"));
    let mut session = alice(&ledger);
    session.resolve_root().await.expect("resolve");

    session.create_folder(2, "docs", Some(1)).await.expect("docs");
    session.create_folder(3, "music", Some(1)).await.expect("music");
    session.create_folder(4, "drafts", Some(2)).await.expect("drafts");
    session
        .create_file(2, plain_file(10, "notes.txt", "QmNotes"))
        .await
        .expect("notes");
    session
        .create_file(4, encrypted_file(11, "secret.txt", "QmSecret"))
        .await
        .expect("secret");
    session
        .create_file(1, plain_file(12, "readme.md", "QmReadme"))
        .await
        .expect("readme");
    session.like_version(12).await.expect("like");

    let patched = session.root().expect("loaded").clone();
    let reloaded = session.load("alice").await.expect("reload");
    assert!(reloaded.diagnostics.is_empty(), "{:?}", reloaded.diagnostics);
    assert_eq!(reloaded.root.as_ref(), Some(&patched));

    let secret = patched.find_file(11).expect("secret");
    let version = secret.current_version().expect("current");
    assert!(!version.is_locked());
    assert_eq!(version.key.as_ref().map(|k| k.iv.as_str()), Some("iv-11"));
    assert_eq!(version.grant.as_ref().map(|g| g.public_key.as_str()), Some("PUB_ALICE"));

    let readme = patched.find_file(12).expect("readme");
    assert_eq!(readme.versions[0].likes, vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_deletes_survive_reload() {
    let ledger = Arc::new(SqliteLedger::memory().expect("ledger"));
    let mut session = alice(&ledger);
    session.resolve_root().await.expect("resolve");
    session.create_folder(2, "docs", Some(1)).await.expect("docs");
    session
        .create_file(2, plain_file(10, "a.txt", "QmA"))
        .await
        .expect("a");
    session
        .create_file(1, plain_file(11, "b.txt", "QmB"))
        .await
        .expect("b");

    session.delete_file(11).await.expect("delete b");
    session.delete_folder(2).await.expect("delete docs");

    let root = session.root().expect("loaded");
    assert!(root.child_folders.is_empty());
    assert!(root.child_files.is_empty());
    assert!(!session.contains_hash("QmA"));

    // File 10 still has a row, but its folder is gone: it is dropped and
    // reported on reload.
    session.refresh().await.expect("refresh");
    let root = session.root().expect("loaded");
    assert!(root.child_folders.is_empty() && root.child_files.is_empty());
    assert!(session.diagnostics().contains(&SkipReason::MissingParentFolder {
        file: 10,
        folder: 2
    }));
}

#[tokio::test]
async fn test_key_collision_stops_file_creation() {
    let ledger = Arc::new(SqliteLedger::memory().expect("ledger"));
    let mut session = alice(&ledger);
    session.resolve_root().await.expect("resolve");
    session
        .create_file(1, encrypted_file(10, "a.txt", "QmA"))
        .await
        .expect("first");

    // Same id again: the key registration is the first step and fails.
    let err = session
        .create_file(1, encrypted_file(10, "b.txt", "QmB"))
        .await
        .expect_err("duplicate key");
    assert!(matches!(
        err,
        FilespaceError::Step {
            step: ActionKind::AddKey,
            ..
        }
    ));

    let root = session.root().expect("loaded");
    assert_eq!(root.child_files.len(), 1);
    assert!(!session.contains_hash("QmB"));
    let grants = ledger.fetch_table("alice", Table::EncKeys).await.expect("fetch");
    assert_eq!(grants.len(), 1, "later steps must not run");
}

#[tokio::test]
async fn test_failed_step_keeps_earlier_rows() {
    let ledger = Arc::new(SqliteLedger::memory().expect("ledger"));
    let mut session = alice(&ledger);
    session.resolve_root().await.expect("resolve");
    session
        .create_file(1, plain_file(10, "a.txt", "QmA"))
        .await
        .expect("first");

    // Key 10 is free, file 10 is taken: the key rows stay behind.
    let err = session
        .create_file(1, encrypted_file(10, "b.txt", "QmB"))
        .await
        .expect_err("duplicate file");
    assert!(matches!(
        err,
        FilespaceError::Step {
            step: ActionKind::AddFile,
            ..
        }
    ));
    let keys = ledger.fetch_table("alice", Table::Keys).await.expect("fetch");
    assert_eq!(keys.len(), 1);

    session.refresh().await.expect("refresh");
    let root = session.root().expect("loaded");
    assert_eq!(root.child_files.len(), 1);
    assert_eq!(root.child_files[0].name, "a.txt");
}
