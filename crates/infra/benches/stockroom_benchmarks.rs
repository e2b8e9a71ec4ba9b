use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use stockroom_catalog::{Item, NewItem, NewLocation, NewUser, Role};
use stockroom_core::{LocationId, UserId};
use stockroom_infra::services::{
    Catalog, HistoryReader, MovementLedger, RelocateRequest, WorkOrderEngine,
};
use stockroom_infra::store::InMemoryStore;
use stockroom_workorders::{NewLine, NewWorkOrder, SuffixSource};

/// Never collides, so the issue benchmark measures issuance rather than id retries.
#[derive(Default)]
struct CountingSuffix(AtomicU64);

impl SuffixSource for CountingSuffix {
    fn next_suffix(&self) -> String {
        format!("{:08x}", self.0.fetch_add(1, Ordering::Relaxed))
    }
}

struct Bench {
    rt: tokio::runtime::Runtime,
    catalog: Catalog<InMemoryStore>,
    ledger: MovementLedger<InMemoryStore>,
    history: HistoryReader<InMemoryStore>,
    orders: WorkOrderEngine<InMemoryStore>,
    locations: Vec<LocationId>,
    user: UserId,
}

fn setup() -> Bench {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let store = Arc::new(InMemoryStore::new());
    let catalog = Catalog::new(Arc::clone(&store));

    let (locations, user) = rt.block_on(async {
        let mut locations = Vec::new();
        for code in ["LOC-A1", "LOC-A2", "LOC-B1"] {
            let loc = catalog
                .create_location(NewLocation {
                    code: code.to_string(),
                    ..NewLocation::default()
                })
                .await
                .unwrap();
            locations.push(loc.id);
        }
        let user = catalog
            .create_user(NewUser {
                username: "bench".to_string(),
                email: String::new(),
                password_hash: String::new(),
                role: Role::Operator,
            })
            .await
            .unwrap();
        (locations, user.id)
    });

    Bench {
        rt,
        ledger: MovementLedger::new(Arc::clone(&store)),
        history: HistoryReader::new(Arc::clone(&store)),
        orders: WorkOrderEngine::new(store).with_suffix_source(Arc::new(CountingSuffix::default())),
        catalog,
        locations,
        user,
    }
}

impl Bench {
    fn item(&self, sku: String, quantity: i64) -> Item {
        self.rt
            .block_on(self.catalog.create_item(NewItem {
                name: sku.clone(),
                sku,
                quantity,
                ..NewItem::default()
            }))
            .unwrap()
    }
}

fn bench_relocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("relocate");
    group.throughput(Throughput::Elements(1));

    let bench = setup();
    let item = bench.item("BENCH-RELOCATE".to_string(), 1);
    let mut round = 0usize;

    group.bench_function("relocate_single_item", |b| {
        b.iter(|| {
            round += 1;
            let to = bench.locations[round % bench.locations.len()];
            let movement = bench
                .rt
                .block_on(bench.ledger.relocate(RelocateRequest {
                    item_id: item.id,
                    to_location_id: to,
                    user_id: bench.user,
                    note: String::new(),
                }))
                .unwrap();
            black_box(movement);
        });
    });

    group.finish();
}

fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_of");

    for movements in [10usize, 100, 1_000].iter() {
        let bench = setup();
        let item = bench.item(format!("BENCH-HISTORY-{movements}"), 1);
        for round in 0..*movements {
            bench
                .rt
                .block_on(bench.ledger.relocate(RelocateRequest {
                    item_id: item.id,
                    to_location_id: bench.locations[round % bench.locations.len()],
                    user_id: bench.user,
                    note: String::new(),
                }))
                .unwrap();
        }

        group.throughput(Throughput::Elements(*movements as u64));
        group.bench_with_input(BenchmarkId::from_parameter(movements), movements, |b, _| {
            b.iter(|| black_box(bench.rt.block_on(bench.history.history_of(item.id)).unwrap()));
        });
    }

    group.finish();
}

fn bench_issue(c: &mut Criterion) {
    let mut group = c.benchmark_group("issue");
    group.sample_size(200);

    for lines in [1usize, 10].iter() {
        let bench = setup();
        let items: Vec<Item> = (0..*lines)
            .map(|n| bench.item(format!("BENCH-ISSUE-{lines}-{n}"), i64::MAX / 2))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(lines), lines, |b, _| {
            b.iter(|| {
                bench.rt.block_on(async {
                    let order = bench
                        .orders
                        .create_order(NewWorkOrder {
                            equipment: "Bench rig".to_string(),
                            equipment_number: "B-1".to_string(),
                            work_type: "service".to_string(),
                            lines: items
                                .iter()
                                .map(|item| NewLine {
                                    item_id: Some(item.id),
                                    name: item.name.clone(),
                                    quantity: 1,
                                    ..NewLine::default()
                                })
                                .collect(),
                            ..NewWorkOrder::default()
                        })
                        .await
                        .unwrap();
                    black_box(bench.orders.issue(&order.id).await.unwrap())
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_relocate, bench_history, bench_issue);
criterion_main!(benches);
