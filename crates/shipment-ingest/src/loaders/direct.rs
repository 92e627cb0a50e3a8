//! Direct loader for self-contained shipment rows

use crate::error::{IngestError, Result};
use crate::models::{DirectLoadStats, DirectShipmentRow, NewShipment};
use crate::source::CsvSource;
use crate::storage::ShipmentStore;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Insert one shipment per source row, in file order.
///
/// Rows are never merged: a repeated row yields a second shipment. The first
/// unparseable quantity aborts the load.
#[instrument(skip_all, fields(path = %source.path().display()))]
pub fn load_direct<R, S>(source: &mut CsvSource<R>, store: &mut S) -> Result<DirectLoadStats>
where
    R: Read,
    S: ShipmentStore,
{
    let path = source.path().to_path_buf();
    let mut stats = DirectLoadStats::default();

    for row in source.rows::<DirectShipmentRow>()? {
        let row = row?;
        stats.rows_read += 1;

        let DirectShipmentRow {
            origin_warehouse,
            destination_store,
            product,
            product_quantity,
        } = row.record;

        let quantity = parse_quantity(&product_quantity, &path, row.line)?;
        let product_id = store.resolve_product(&product)?;

        store.insert_shipment(&NewShipment {
            product_id,
            quantity,
            origin: origin_warehouse,
            destination: destination_store,
        })?;
        stats.shipments_inserted += 1;

        debug!(line = row.line, product = %product, quantity, "Inserted direct shipment");
    }

    info!(
        rows = stats.rows_read,
        shipments = stats.shipments_inserted,
        "Loaded direct shipments"
    );
    Ok(stats)
}

/// Coerce a quantity cell to a non-negative integer; surrounding whitespace
/// is tolerated
pub fn parse_quantity(value: &str, source_path: &Path, line: u64) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| IngestError::MalformedQuantity {
            source_path: source_path.to_path_buf(),
            line,
            value: value.to_string(),
        })
}
