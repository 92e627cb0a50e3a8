//! Shipment loaders
//!
//! - [`direct`]: one self-contained source, one shipment per row
//! - [`join`]: a location source and a per-unit detail source, joined by
//!   shipment identifier and aggregated per product
//!
//! Both write through a [`ShipmentStore`](crate::storage::ShipmentStore) so a
//! run shares one transaction and one product resolver between them.

pub mod direct;
pub mod join;

pub use direct::load_direct;
pub use join::{build_location_map, count_products, load_joined, reconcile};
