//! Join-aggregate loader
//!
//! Shipments split over two sources are rebuilt in three steps:
//!
//! 1. [`build_location_map`] reads the whole location source into
//!    identifier -> [`Route`]. A repeated identifier overwrites the earlier
//!    route.
//! 2. [`count_products`] groups detail rows by (identifier, product); the
//!    number of rows in a group is that shipment's quantity.
//! 3. [`reconcile`] joins each group to its route. Groups with no route are
//!    dropped, not reported as errors.
//!
//! The map must be complete before the first group is joined, since the
//! sources are not sorted relative to each other.

use crate::error::Result;
use crate::models::{JoinLoadStats, NewShipment, Route, ShipmentLocationRow, ShipmentProductRow};
use crate::source::CsvSource;
use crate::storage::ShipmentStore;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, info, instrument, warn};

/// Shipment identifier -> route, last row wins
#[derive(Debug, Clone, Default)]
pub struct LocationMap {
    routes: HashMap<String, Route>,
    rows: usize,
    overwritten: usize,
}

impl LocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a route; returns the route it replaced, if any
    pub fn insert(&mut self, shipment_identifier: String, route: Route) -> Option<Route> {
        self.rows += 1;
        let previous = self.routes.insert(shipment_identifier, route);
        if previous.is_some() {
            self.overwritten += 1;
        }
        previous
    }

    pub fn get(&self, shipment_identifier: &str) -> Option<&Route> {
        self.routes.get(shipment_identifier)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Rows read, including overwritten ones
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn overwritten(&self) -> usize {
        self.overwritten
    }
}

/// All units of one product on one shipment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentGroup {
    pub shipment_identifier: String,
    pub product: String,
    pub quantity: u64,
}

/// Detail rows grouped by (identifier, product), in order of first appearance
#[derive(Debug, Clone, Default)]
pub struct ProductCounts {
    groups: Vec<ShipmentGroup>,
    index: HashMap<(String, String), usize>,
    rows: usize,
}

impl ProductCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one unit of `product` on `shipment_identifier`
    pub fn add(&mut self, shipment_identifier: String, product: String) {
        self.rows += 1;
        match self.index.entry((shipment_identifier, product)) {
            Entry::Occupied(slot) => self.groups[*slot.get()].quantity += 1,
            Entry::Vacant(slot) => {
                let (shipment_identifier, product) = slot.key().clone();
                slot.insert(self.groups.len());
                self.groups.push(ShipmentGroup {
                    shipment_identifier,
                    product,
                    quantity: 1,
                });
            },
        }
    }

    pub fn groups(&self) -> &[ShipmentGroup] {
        &self.groups
    }

    /// Detail rows counted
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_groups(self) -> Vec<ShipmentGroup> {
        self.groups
    }
}

/// A group that found its route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedShipment {
    pub product: String,
    pub quantity: u64,
    pub route: Route,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub shipments: Vec<JoinedShipment>,
    /// Groups skipped because their identifier has no route
    pub orphans: Vec<ShipmentGroup>,
}

/// Read the location source in full
pub fn build_location_map<R: Read>(source: &mut CsvSource<R>) -> Result<LocationMap> {
    let mut map = LocationMap::new();

    for row in source.rows::<ShipmentLocationRow>()? {
        let row = row?;
        let ShipmentLocationRow {
            shipment_identifier,
            origin_warehouse,
            destination_store,
        } = row.record;

        let route = Route {
            origin: origin_warehouse,
            destination: destination_store,
        };
        if let Some(previous) = map.insert(shipment_identifier.clone(), route) {
            debug!(
                shipment = %shipment_identifier,
                line = row.line,
                previous_origin = %previous.origin,
                previous_destination = %previous.destination,
                "Location overwritten by later row"
            );
        }
    }

    debug!(
        path = %source.path().display(),
        rows = map.rows(),
        shipments = map.len(),
        "Built location map"
    );
    Ok(map)
}

/// Read the detail source in full and count units per (identifier, product)
pub fn count_products<R: Read>(source: &mut CsvSource<R>) -> Result<ProductCounts> {
    let mut counts = ProductCounts::new();

    for row in source.rows::<ShipmentProductRow>()? {
        let row = row?.record;
        counts.add(row.shipment_identifier, row.product);
    }

    debug!(
        path = %source.path().display(),
        rows = counts.rows(),
        groups = counts.groups().len(),
        "Counted products per shipment"
    );
    Ok(counts)
}

/// Join every group to its route, preserving group order
pub fn reconcile(locations: &LocationMap, counts: ProductCounts) -> Reconciliation {
    let mut result = Reconciliation::default();

    for group in counts.into_groups() {
        match locations.get(&group.shipment_identifier) {
            Some(route) => result.shipments.push(JoinedShipment {
                product: group.product,
                quantity: group.quantity,
                route: route.clone(),
            }),
            None => {
                debug!(
                    shipment = %group.shipment_identifier,
                    product = %group.product,
                    quantity = group.quantity,
                    "No location for shipment; group skipped"
                );
                result.orphans.push(group);
            },
        }
    }

    result
}

/// Load shipments described jointly by a location and a detail source.
///
/// The location source is read completely before the detail source is
/// opened for reading.
#[instrument(
    skip_all,
    fields(
        locations = %locations.path().display(),
        details = %details.path().display()
    )
)]
pub fn load_joined<L, D, S>(
    locations: &mut CsvSource<L>,
    details: &mut CsvSource<D>,
    store: &mut S,
) -> Result<JoinLoadStats>
where
    L: Read,
    D: Read,
    S: ShipmentStore,
{
    let location_map = build_location_map(locations)?;
    let counts = count_products(details)?;

    let mut stats = JoinLoadStats {
        location_rows: location_map.rows(),
        overwritten_locations: location_map.overwritten(),
        detail_rows: counts.rows(),
        groups: counts.groups().len(),
        ..JoinLoadStats::default()
    };

    let reconciliation = reconcile(&location_map, counts);
    stats.orphaned_groups = reconciliation.orphans.len();

    for joined in reconciliation.shipments {
        let product_id = store.resolve_product(&joined.product)?;
        store.insert_shipment(&NewShipment {
            product_id,
            quantity: joined.quantity,
            origin: joined.route.origin,
            destination: joined.route.destination,
        })?;
        stats.shipments_inserted += 1;
    }

    if stats.overwritten_locations > 0 {
        warn!(
            count = stats.overwritten_locations,
            "Shipment identifiers repeated in location source; later rows kept"
        );
    }
    if stats.orphaned_groups > 0 {
        warn!(
            count = stats.orphaned_groups,
            "Detail groups without a location were skipped"
        );
    }

    info!(
        groups = stats.groups,
        shipments = stats.shipments_inserted,
        "Loaded joined shipments"
    );
    Ok(stats)
}
