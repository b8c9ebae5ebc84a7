//! Database layer for starlog
//!
//! SQLite-backed [`KeyValueStore`](crate::storage::KeyValueStore) with:
//! - Schema migrations
//! - A single `kv` table holding every mirrored value

pub mod repo;
pub mod schema;

pub use repo::Database;
