//! End-to-end tests for the ingestion pipeline
//!
//! Each test writes the three CSV sources into a temporary data directory,
//! runs the pipeline against a SQLite file next to them and inspects the
//! resulting tables.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rusqlite::Connection;
use shipment_ingest::schema::init_schema;
use shipment_ingest::{IngestConfig, IngestError, IngestPipeline, RunOptions};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DIRECT_HEADER: &str =
    "origin_warehouse,destination_store,product,on_time,product_quantity,driver_identifier\n";
const DETAIL_HEADER: &str = "shipment_identifier,product,on_time\n";
const LOCATION_HEADER: &str =
    "shipment_identifier,origin_warehouse,destination_store,driver_identifier\n";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Data directory with the given source bodies and an empty store
    fn new(direct: &str, detail: &str, location: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Self { dir };

        fixture.write("shipping_data_0.csv", DIRECT_HEADER, direct);
        fixture.write("shipping_data_1.csv", DETAIL_HEADER, detail);
        fixture.write("shipping_data_2.csv", LOCATION_HEADER, location);

        let conn = Connection::open(fixture.database()).unwrap();
        init_schema(&conn).unwrap();

        fixture
    }

    fn write(&self, name: &str, header: &str, body: &str) {
        std::fs::write(self.dir.path().join(name), format!("{header}{body}")).unwrap();
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn database(&self) -> PathBuf {
        self.dir.path().join("shipment_database.db")
    }

    fn pipeline(&self) -> IngestPipeline {
        let mut config = IngestConfig::new();
        config.set_data_dir(self.path()).unwrap();
        config.set_database_path(self.database()).unwrap();
        IngestPipeline::new(config)
    }

    fn run(&self) -> shipment_ingest::Result<shipment_ingest::IngestReport> {
        self.pipeline().run()
    }

    fn conn(&self) -> Connection {
        Connection::open(self.database()).unwrap()
    }

    /// (product name, quantity, origin, destination) ordered by shipment id
    fn shipments(&self) -> Vec<(String, i64, String, String)> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT p.name, s.quantity, s.origin, s.destination
                 FROM shipment s JOIN product p ON p.id = s.product_id
                 ORDER BY s.id",
            )
            .unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        rows
    }

    fn products(&self) -> Vec<(i64, String)> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name FROM product ORDER BY id").unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        rows
    }
}

fn row(product: &str, quantity: i64, origin: &str, destination: &str) -> (String, i64, String, String) {
    (
        product.to_string(),
        quantity,
        origin.to_string(),
        destination.to_string(),
    )
}

// ============================================================================
// Direct loader
// ============================================================================

#[test]
fn test_direct_rows_are_not_merged() {
    let fx = Fixture::new(
        "W1,S1,widget,true,5,d-1\n\
         W1,S1,widget,true,3,d-1\n",
        "",
        "",
    );

    let report = fx.run().unwrap();

    assert_eq!(report.direct_shipments, 2);
    assert_eq!(
        fx.shipments(),
        vec![row("widget", 5, "W1", "S1"), row("widget", 3, "W1", "S1")]
    );
    assert_eq!(fx.products().len(), 1);
}

#[test]
fn test_malformed_quantity_aborts_whole_run() {
    let fx = Fixture::new(
        "W1,S1,widget,true,5,d-1\n\
         W1,S1,gadget,true,lots,d-1\n",
        "X1,bolt,true\n",
        "X1,W1,S2,d-1\n",
    );

    let err = fx.run().unwrap_err();

    assert!(matches!(err, IngestError::MalformedQuantity { line: 3, .. }));
    assert!(fx.shipments().is_empty());
    assert!(fx.products().is_empty());
}

// ============================================================================
// Join-aggregate loader
// ============================================================================

#[test]
fn test_detail_rows_aggregate_into_quantities() {
    let fx = Fixture::new(
        "",
        "X1,gadget,true\n\
         X1,gadget,false\n\
         X1,bolt,true\n",
        "X1,W1,S2,d-1\n",
    );

    let report = fx.run().unwrap();

    assert_eq!(report.joined_shipments, 2);
    let mut shipments = fx.shipments();
    shipments.sort();
    assert_eq!(
        shipments,
        vec![row("bolt", 1, "W1", "S2"), row("gadget", 2, "W1", "S2")]
    );
}

#[test]
fn test_orphaned_identifier_skipped_without_error() {
    let fx = Fixture::new(
        "",
        "Y9,gadget,true\n\
         X1,bolt,true\n",
        "X1,W1,S2,d-1\n",
    );

    let report = fx.run().unwrap();

    assert_eq!(report.orphaned_groups, 1);
    assert_eq!(fx.shipments(), vec![row("bolt", 1, "W1", "S2")]);
    assert!(fx.products().iter().all(|(_, name)| name != "gadget"));
}

#[test]
fn test_duplicate_location_last_write_wins() {
    let fx = Fixture::new(
        "",
        "X1,gadget,true\n",
        "X1,W1,S1,d-1\n\
         X1,W4,S8,d-2\n",
    );

    let report = fx.run().unwrap();

    assert_eq!(report.overwritten_locations, 1);
    assert_eq!(fx.shipments(), vec![row("gadget", 1, "W4", "S8")]);
}

#[test]
fn test_detail_order_does_not_change_counts() {
    let fx = Fixture::new(
        "",
        "X1,nut,t\n\
         X2,nut,t\n\
         X1,bolt,t\n\
         X2,nut,t\n\
         X1,nut,t\n",
        "X2,W2,S2,d\n\
         X1,W1,S1,d\n",
    );

    fx.run().unwrap();

    let mut shipments = fx.shipments();
    shipments.sort();
    assert_eq!(
        shipments,
        vec![
            row("bolt", 1, "W1", "S1"),
            row("nut", 2, "W1", "S1"),
            row("nut", 2, "W2", "S2"),
        ]
    );
}

// ============================================================================
// Driver
// ============================================================================

#[test]
fn test_product_identity_shared_across_loaders() {
    let fx = Fixture::new(
        "W1,S1,widget,true,5,d-1\n",
        "X1,widget,true\n\
         X1,Widget,true\n",
        "X1,W2,S2,d-1\n",
    );

    let report = fx.run().unwrap();

    // "widget" reused by the join loader, "Widget" is a different product
    assert_eq!(report.products_created, 2);
    let products = fx.products();
    assert_eq!(products.len(), 2);
    assert!(products.iter().any(|(_, n)| n == "widget"));
    assert!(products.iter().any(|(_, n)| n == "Widget"));

    let conn = fx.conn();
    let widget_shipments: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM shipment s JOIN product p ON p.id = s.product_id
             WHERE p.name = 'widget'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(widget_shipments, 2);
}

#[test]
fn test_failure_in_join_phase_leaves_store_untouched() {
    let fx = Fixture::new("", "", "");
    {
        let conn = fx.conn();
        conn.execute("INSERT INTO product (name) VALUES ('existing')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO shipment (product_id, quantity, origin, destination)
             VALUES (1, 9, 'W0', 'S0')",
            [],
        )
        .unwrap();
    }

    fx.write("shipping_data_0.csv", DIRECT_HEADER, "W1,S1,widget,true,5,d-1\n");
    fx.write("shipping_data_2.csv", LOCATION_HEADER, "X1,W1,S2,d-1\n");
    // Detail source without the product column fails after the direct load
    fx.write("shipping_data_1.csv", "shipment_identifier,on_time\n", "X1,true\n");

    let err = fx.run().unwrap_err();

    assert!(matches!(err, IngestError::MissingColumn { column: "product", .. }));
    assert_eq!(fx.products(), vec![(1, "existing".to_string())]);
    assert_eq!(fx.shipments(), vec![row("existing", 9, "W0", "S0")]);
}

#[test]
fn test_every_run_appends() {
    let fx = Fixture::new("W1,S1,widget,true,5,d-1\n", "", "");

    fx.run().unwrap();
    let second = fx.run().unwrap();

    assert_eq!(second.products_created, 0);
    assert_eq!(fx.shipments().len(), 2);
    assert_eq!(fx.products().len(), 1);
}

#[test]
fn test_missing_source_reported_before_any_write() {
    let fx = Fixture::new("W1,S1,widget,true,5,d-1\n", "", "");
    std::fs::remove_file(fx.path().join("shipping_data_1.csv")).unwrap();

    let err = fx.run().unwrap_err();

    match err {
        IngestError::SourceNotFound(path) => {
            assert_eq!(path, fx.path().join("shipping_data_1.csv"));
        },
        other => panic!("expected SourceNotFound, got {other}"),
    }
    assert!(fx.shipments().is_empty());
}

#[test]
fn test_dry_run_reports_without_writing() {
    let fx = Fixture::new(
        "W1,S1,widget,true,5,d-1\n",
        "X1,bolt,true\n",
        "X1,W1,S2,d-1\n",
    );

    let report = fx
        .pipeline()
        .with_options(RunOptions {
            dry_run: true,
            ..RunOptions::default()
        })
        .run()
        .unwrap();

    assert_eq!(report.total_shipments(), 2);
    assert!(!report.committed);
    assert!(fx.shipments().is_empty());
    assert!(fx.products().is_empty());
}
