//! Store access for one ingestion run
//!
//! [`IngestContext`] is the single transactional context a run writes
//! through. It owns the open transaction and the [`ProductResolver`], and is
//! passed by `&mut` to each loader. Nothing is visible in the database until
//! [`IngestContext::commit`]; dropping the context rolls everything back.

use crate::error::Result;
use crate::models::{NewShipment, ProductId};
use crate::product::ProductResolver;
use rusqlite::{params, Connection, OpenFlags, Transaction, TransactionBehavior};
use std::path::Path;
use tracing::{debug, info};

/// Where loaders put their output
pub trait ShipmentStore {
    /// Id of the product called `name`, creating it on first sight
    fn resolve_product(&mut self, name: &str) -> Result<ProductId>;

    /// Append one shipment row
    fn insert_shipment(&mut self, shipment: &NewShipment) -> Result<()>;
}

/// Open the SQLite store at `path`.
///
/// Without `create` a missing file is an error rather than a new empty
/// database.
pub fn open_database(path: &Path, create: bool) -> Result<Connection> {
    let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    if create {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }

    let conn = Connection::open_with_flags(path, flags)?;
    conn.pragma_update(None, "foreign_keys", true)?;

    debug!(path = %path.display(), create, "Opened database");
    Ok(conn)
}

pub struct IngestContext<'conn> {
    tx: Transaction<'conn>,
    products: ProductResolver,
    shipments_inserted: usize,
}

impl<'conn> IngestContext<'conn> {
    /// Start the run's transaction.
    ///
    /// Takes the write lock immediately so a busy database fails here, before
    /// any source is parsed.
    pub fn begin(conn: &'conn mut Connection) -> Result<Self> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        Ok(Self {
            tx,
            products: ProductResolver::new(),
            shipments_inserted: 0,
        })
    }

    pub fn products(&self) -> &ProductResolver {
        &self.products
    }

    pub fn shipments_inserted(&self) -> usize {
        self.shipments_inserted
    }

    /// Make the run's rows durable
    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        info!(shipments = self.shipments_inserted, "Committed ingestion transaction");
        Ok(())
    }

    /// Discard the run's rows
    pub fn rollback(self) -> Result<()> {
        self.tx.rollback()?;
        debug!("Rolled back ingestion transaction");
        Ok(())
    }
}

impl ShipmentStore for IngestContext<'_> {
    fn resolve_product(&mut self, name: &str) -> Result<ProductId> {
        self.products.resolve(&self.tx, name)
    }

    fn insert_shipment(&mut self, shipment: &NewShipment) -> Result<()> {
        let mut stmt = self.tx.prepare_cached(
            "INSERT INTO shipment (product_id, quantity, origin, destination) \
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![
            shipment.product_id.0,
            shipment.quantity,
            shipment.origin,
            shipment.destination,
        ])?;

        self.shipments_inserted += 1;
        Ok(())
    }
}
