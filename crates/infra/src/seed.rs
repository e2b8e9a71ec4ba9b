//! Demo data for local runs (`STOCKROOM_SEED=1`).
//!
//! Seeding is idempotent: rows whose code, SKU or username already exist are
//! left alone.

use std::collections::HashMap;

use tracing::info;

use stockroom_catalog::{Batch, ItemFilter, NewItem, NewLocation, NewUser, Role};
use stockroom_core::{CoreError, CoreResult};

use crate::services::Catalog;
use crate::store::Store;

/// Number of rows created by one [`seed_demo_data`] run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub locations: usize,
    pub items: usize,
    pub users: usize,
}

struct DemoLocation {
    code: &'static str,
    description: &'static str,
    row: &'static str,
    section: &'static str,
    shelf: &'static str,
}

struct DemoItem {
    name: &'static str,
    sku: &'static str,
    description: &'static str,
    quantity: i64,
    part_number: &'static str,
    batch: &'static str,
    location_code: &'static str,
}

const LOCATIONS: &[DemoLocation] = &[
    DemoLocation {
        code: "LOC-A1",
        description: "Shelf A, row 1",
        row: "A",
        section: "1",
        shelf: "1",
    },
    DemoLocation {
        code: "LOC-A2",
        description: "Shelf A, row 2",
        row: "A",
        section: "2",
        shelf: "1",
    },
    DemoLocation {
        code: "LOC-B1",
        description: "Shelf B, row 1",
        row: "B",
        section: "1",
        shelf: "2",
    },
];

const ITEMS: &[DemoItem] = &[
    DemoItem {
        name: "Widget Pro",
        sku: "WDGT-001",
        description: "High-performance widget",
        quantity: 50,
        part_number: "PN-2024-001",
        batch: "BATCH-2024-01",
        location_code: "LOC-A1",
    },
    DemoItem {
        name: "Gadget Plus",
        sku: "GDGT-002",
        description: "Improved gadget",
        quantity: 30,
        part_number: "PN-2024-002",
        batch: "BATCH-2024-01",
        location_code: "LOC-A2",
    },
    DemoItem {
        name: "Component X",
        sku: "COMP-003",
        description: "Essential component",
        quantity: 100,
        part_number: "PN-2024-003",
        batch: "BATCH-2024-02",
        location_code: "LOC-B1",
    },
];

pub const DEMO_OPERATOR: &str = "operator1";

pub async fn seed_demo_data<S: Store>(catalog: &Catalog<S>) -> CoreResult<SeedReport> {
    let mut report = SeedReport::default();

    let mut by_code: HashMap<String, _> = catalog
        .list_locations()
        .await?
        .into_iter()
        .map(|l| (l.code, l.id))
        .collect();
    for demo in LOCATIONS {
        if by_code.contains_key(demo.code) {
            continue;
        }
        let location = catalog
            .create_location(NewLocation {
                code: demo.code.to_string(),
                description: demo.description.to_string(),
                row: demo.row.to_string(),
                section: demo.section.to_string(),
                shelf: demo.shelf.to_string(),
            })
            .await?;
        by_code.insert(location.code, location.id);
        report.locations += 1;
    }

    let existing_skus: Vec<String> = catalog
        .list_items(ItemFilter::default())
        .await?
        .into_iter()
        .map(|i| i.sku)
        .collect();
    for demo in ITEMS {
        if existing_skus.iter().any(|sku| sku == demo.sku) {
            continue;
        }
        catalog
            .create_item(NewItem {
                name: demo.name.to_string(),
                sku: demo.sku.to_string(),
                description: demo.description.to_string(),
                quantity: demo.quantity,
                part_number: demo.part_number.to_string(),
                batch: Batch {
                    number: demo.batch.to_string(),
                    ..Batch::default()
                },
                location_id: by_code.get(demo.location_code).copied(),
                ..NewItem::default()
            })
            .await?;
        report.items += 1;
    }

    let operator = NewUser {
        username: DEMO_OPERATOR.to_string(),
        email: format!("{DEMO_OPERATOR}@warehouse.local"),
        password_hash: String::new(),
        role: Role::Operator,
    };
    match catalog.create_user(operator).await {
        Ok(_) => report.users += 1,
        Err(CoreError::Conflict(_)) => {}
        Err(other) => return Err(other),
    }

    info!(
        locations = report.locations,
        items = report.items,
        users = report.users,
        "demo data seeded"
    );
    Ok(report)
}
