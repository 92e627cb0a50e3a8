//! SQLite schema for the shipment store
//!
//! The loader only inserts rows. Creating the tables is normally done by
//! whoever provisions the database; `init_schema` exists for `--init-schema`
//! and for tests, and never alters a table that is already there.

use crate::error::{IngestError, Result};
use rusqlite::{Connection, OptionalExtension};

pub const PRODUCT_TABLE: &str = "product";
pub const SHIPMENT_TABLE: &str = "shipment";

/// Create `product` and `shipment` if they do not exist
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS product (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS shipment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            origin TEXT NOT NULL,
            destination TEXT NOT NULL,

            FOREIGN KEY(product_id) REFERENCES product(id)
        );
        "#,
    )?;

    Ok(())
}

/// Check that both tables the loaders write to are present
pub fn verify_schema(conn: &Connection) -> Result<()> {
    for table in [PRODUCT_TABLE, SHIPMENT_TABLE] {
        if !table_exists(conn, table)? {
            return Err(IngestError::StorageUnavailable(
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                    Some(format!("no such table: {table}")),
                ),
            ));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}
