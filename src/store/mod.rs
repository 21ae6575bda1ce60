//! Persistence for the latest update snapshot.

mod error;
mod schema;
mod snapshot_store;

pub use error::StoreError;
pub use schema::{SCHEMA, SCHEMA_VERSION};
pub use snapshot_store::{default_store_path, SnapshotStore, STATUS_KEY};
