use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use tabula::filter::parse_wire_value;
use tabula::{
    Clause, Column, DecoratorRule, Filter, InMemorySource, NoCookies, QueryParams, Record, Table,
    TableDefaults, TableDefinition,
};

struct Users;

impl TableDefinition for Users {
    fn resource(&self) -> Option<&str> {
        Some("users")
    }

    fn columns(&self) -> Vec<Column> {
        vec![
            Column::text("id").sortable(),
            Column::text("name").searchable(),
            Column::text("email").searchable(),
            Column::badge("status")
                .map_values([("active", "Active"), ("banned", "Banned")])
                .icon(DecoratorRule::lookup([("active", "check")])),
            Column::boolean("verified"),
            Column::date("created_at"),
        ]
    }

    fn filters(&self) -> Vec<Filter> {
        vec![
            Filter::text("name"),
            Filter::boolean("verified"),
            Filter::dropdown("status").multiple(),
        ]
    }
}

fn create_source(count: usize) -> InMemorySource {
    let rows = (0..count)
        .map(|id| {
            Record::from_json(json!({
                "id": id,
                "name": format!("User {id} {}", if id % 7 == 0 { "Smith" } else { "Doe" }),
                "email": format!("user{id}@example.com"),
                "status": if id % 3 == 0 { "banned" } else { "active" },
                "verified": id % 2 == 0,
                "created_at": "2024-05-01 12:00:00",
            }))
        })
        .collect();
    InMemorySource::new().with_resource("users", rows)
}

fn bench_wire_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire_parsing");

    for raw in ["acme", "contains.acme", "not.contains.acme", "in.a,b,c,d"] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("parse", raw), raw, |b, raw| {
            b.iter(|| parse_wire_value(black_box(raw), black_box(&Clause::ALL)));
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let defaults = TableDefaults::default();

    for record_count in [100, 1_000, 10_000].iter() {
        let source = create_source(*record_count);

        group.throughput(Throughput::Elements(*record_count as u64));
        group.bench_with_input(
            BenchmarkId::new("unfiltered", record_count),
            record_count,
            |b, _| {
                b.iter(|| {
                    let table = Table::make(&Users, &defaults, &source).ok()?;
                    table.resolve(&mut QueryParams::new(), &NoCookies).ok()
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("filtered_and_searched", record_count),
            record_count,
            |b, _| {
                b.iter(|| {
                    let mut params = QueryParams::from_query_string(
                        "filter.name=not.contains.doe&filter.verified=true&filter.status=in.active&filter.search=smith",
                    );
                    let table = Table::make(&Users, &defaults, &source).ok()?;
                    table.resolve(black_box(&mut params), &NoCookies).ok()
                });
            },
        );
    }

    group.finish();
}

fn bench_structural_hash(c: &mut Criterion) {
    let source = create_source(1);
    let defaults = TableDefaults::default();

    c.bench_function("structural_hash", |b| {
        b.iter(|| {
            Table::make(&Users, &defaults, &source)
                .map(|table| table.hash())
                .ok()
        });
    });
}

criterion_group!(benches, bench_wire_parsing, bench_resolve, bench_structural_hash);
criterion_main!(benches);
