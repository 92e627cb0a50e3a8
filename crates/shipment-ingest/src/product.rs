//! Product identity resolution
//!
//! Maps a product name to its `product.id`, inserting the row on first sight.
//! Names are compared exactly: no trimming, no case folding.

use crate::error::Result;
use crate::models::ProductId;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use tracing::debug;

/// Resolves product names within one run.
///
/// Ids already seen in this run are served from memory; the store is only
/// consulted for new names.
#[derive(Debug, Default)]
pub struct ProductResolver {
    cache: HashMap<String, ProductId>,
    created: usize,
}

impl ProductResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the product called `name`, creating it if the store has none
    pub fn resolve(&mut self, conn: &Connection, name: &str) -> Result<ProductId> {
        if let Some(&id) = self.cache.get(name) {
            return Ok(id);
        }

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO product (name) VALUES (?1)",
            params![name],
        )?;

        let id = ProductId(conn.query_row(
            "SELECT id FROM product WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?);

        if inserted > 0 {
            self.created += 1;
            debug!(product = name, id = %id, "Created product");
        }

        self.cache.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Products this resolver inserted
    pub fn created(&self) -> usize {
        self.created
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::schema::init_schema;

    fn store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn product_rows(conn: &Connection, name: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM product WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_twice_returns_same_id_and_one_row() {
        let conn = store();
        let mut resolver = ProductResolver::new();

        let first = resolver.resolve(&conn, "widget").unwrap();
        let second = resolver.resolve(&conn, "widget").unwrap();

        assert_eq!(first, second);
        assert_eq!(product_rows(&conn, "widget"), 1);
        assert_eq!(resolver.created(), 1);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let conn = store();
        let mut resolver = ProductResolver::new();

        let upper = resolver.resolve(&conn, "Widget").unwrap();
        let lower = resolver.resolve(&conn, "widget").unwrap();

        assert_ne!(upper, lower);
        assert_eq!(product_rows(&conn, "Widget"), 1);
        assert_eq!(product_rows(&conn, "widget"), 1);
    }

    #[test]
    fn test_names_are_not_trimmed() {
        let conn = store();
        let mut resolver = ProductResolver::new();

        let padded = resolver.resolve(&conn, " bolt").unwrap();
        let bare = resolver.resolve(&conn, "bolt").unwrap();

        assert_ne!(padded, bare);
        assert_eq!(resolver.created(), 2);
    }

    #[test]
    fn test_existing_product_is_reused_not_counted() {
        let conn = store();
        conn.execute("INSERT INTO product (name) VALUES ('gadget')", [])
            .unwrap();
        let existing: i64 = conn
            .query_row("SELECT id FROM product WHERE name = 'gadget'", [], |r| r.get(0))
            .unwrap();

        let mut resolver = ProductResolver::new();
        let id = resolver.resolve(&conn, "gadget").unwrap();

        assert_eq!(id, ProductId(existing));
        assert_eq!(resolver.created(), 0);
        assert_eq!(product_rows(&conn, "gadget"), 1);
    }

    #[test]
    fn test_missing_table_is_storage_error() {
        let conn = Connection::open_in_memory().unwrap();
        let mut resolver = ProductResolver::new();

        let err = resolver.resolve(&conn, "widget").unwrap_err();
        assert!(matches!(err, crate::error::IngestError::StorageUnavailable(_)));
    }
}
