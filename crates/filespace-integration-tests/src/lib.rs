//! Integration test crate for the filespace workspace.
//!
//! This crate has no library code. It only contains integration tests that
//! run sessions from `filespace-core` against the SQLite ledger from
//! `filespace-ledger`.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p filespace-integration-tests
//! ```
