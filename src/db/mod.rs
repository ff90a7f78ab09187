//! Database module: models, schema and storage for the attendance journal.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows plus the status symbol set
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool setup and all queries, wrapped in `JournalStorage`

use crate::error::RollcallError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

pub mod models;
pub mod schema;
pub mod sqlite;

pub use schema::SQLITE_INIT;
pub use sqlite::{JournalStorage, SqlitePool};

/// Open a SQLite pool for the given URL, creating the database file on
/// first run and enabling foreign key enforcement.
pub async fn connect(database_url: &str) -> Result<SqlitePool, RollcallError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}
