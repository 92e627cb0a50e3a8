//! Row and record types
//!
//! The `*Row` types mirror the CSV headers exactly; columns not named here
//! (`on_time`, `driver_identifier`) are ignored by the reader.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Source rows
// ============================================================================

/// `shipping_data_0.csv`: one complete shipment per row
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectShipmentRow {
    pub origin_warehouse: String,
    pub destination_store: String,
    pub product: String,
    /// Kept raw so a bad value can be reported verbatim
    pub product_quantity: String,
}

/// `shipping_data_1.csv`: one row per unit of a product on a shipment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShipmentProductRow {
    pub shipment_identifier: String,
    pub product: String,
}

/// `shipping_data_2.csv`: where a shipment goes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShipmentLocationRow {
    pub shipment_identifier: String,
    pub origin_warehouse: String,
    pub destination_store: String,
}

// ============================================================================
// Store records
// ============================================================================

/// Row id of a `product`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `shipment` row before the store assigns its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShipment {
    pub product_id: ProductId,
    pub quantity: u64,
    pub origin: String,
    pub destination: String,
}

/// Origin and destination of a shipment identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectLoadStats {
    pub rows_read: usize,
    pub shipments_inserted: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoinLoadStats {
    pub location_rows: usize,
    /// Identifiers seen again in the location source; the later row won
    pub overwritten_locations: usize,
    pub detail_rows: usize,
    /// Distinct (shipment identifier, product) groups
    pub groups: usize,
    /// Groups whose identifier had no location; skipped
    pub orphaned_groups: usize,
    pub shipments_inserted: usize,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub products_created: usize,
    pub direct_shipments: usize,
    pub joined_shipments: usize,
    pub orphaned_groups: usize,
    pub overwritten_locations: usize,
    /// False for a dry run
    pub committed: bool,
}

impl IngestReport {
    pub fn total_shipments(&self) -> usize {
        self.direct_shipments + self.joined_shipments
    }
}
