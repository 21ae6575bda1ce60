//! Database schema for the snapshot store.

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// SQL schema for the snapshot database.
pub const SCHEMA: &str = r"
PRAGMA journal_mode = WAL;

-- Key-value table holding serialized snapshots
CREATE TABLE IF NOT EXISTS kv_snapshots (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

INSERT OR IGNORE INTO schema_version (version) VALUES (1);
";
