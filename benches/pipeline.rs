use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use datavista::config::WorkspaceConfig;
use datavista::data::Dataset;
use datavista::filter::{FilterCondition, FilterOperator};
use datavista::io_utils::import_file;
use datavista::pipeline::{TransformState, group_view, transform};
use datavista::sort::{SortConfig, SortDirection};
use tempfile::TempDir;

fn generate_orders(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("orders.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "id,customer,status,amount").expect("header");
    for i in 0..rows {
        let status = match i % 3 {
            0 => "shipped",
            1 => "pending",
            _ => "processing",
        };
        let amount = if i % 17 == 0 {
            String::new()
        } else {
            format!("{}.{:02}", (i * 7919) % 1000, i % 100)
        };
        writeln!(file, "{i},customer-{:04},{status},{amount}", i % 997).expect("row");
    }
    (temp_dir, csv_path)
}

fn load(rows: usize) -> Dataset {
    let (temp_dir, csv_path) = generate_orders(rows);
    let dataset = import_file(&csv_path, &WorkspaceConfig::default()).expect("import orders");
    drop(temp_dir);
    dataset
}

fn bench_pipeline(c: &mut Criterion) {
    let dataset = load(40_000);
    let filtered = TransformState::default()
        .with_filter_added(FilterCondition::new("status", FilterOperator::NotEquals, "pending"))
        .with_filter_added(FilterCondition::new("amount", FilterOperator::Greater, "250"));
    let sorted_desc = filtered.with_sort(Some(SortConfig::new("amount", SortDirection::Desc)));
    let by_customer = filtered
        .with_sort(Some(SortConfig::new("customer", SortDirection::Asc)))
        .with_group_by(Some("status".to_string()));

    let mut group = c.benchmark_group("pipeline");

    group.bench_function("filter_only", |b| {
        b.iter(|| transform(&dataset.rows, &filtered).len());
    });

    group.bench_function("filter_sort_numeric_desc", |b| {
        b.iter(|| transform(&dataset.rows, &sorted_desc).len());
    });

    group.bench_function("filter_sort_text_group", |b| {
        b.iter(|| group_view(&dataset.rows, &by_customer).len());
    });

    group.bench_function("import_csv", |b| {
        b.iter_batched(
            || generate_orders(5_000),
            |(_dir, path)| import_file(&path, &WorkspaceConfig::default()).expect("import"),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
