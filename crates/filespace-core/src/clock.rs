//! Caller-generated ids.

use filespace_types::Id;

/// Current wall-clock time in milliseconds, used as the id of likes and
/// profile keys.
///
/// Two calls within the same millisecond return the same id; the ledger then
/// rejects the second insert.
pub fn timestamp_id() -> Id {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as Id
}
