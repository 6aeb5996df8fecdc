//! Benchmarks for ChangeBus publish fan-out.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ripple_core::table_set;
use ripple_reactive::{ChangeBus, Changes, Subscription};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn subscribe_all(bus: &ChangeBus, count: usize, hits: &Arc<AtomicUsize>) -> Vec<Subscription> {
    (0..count)
        .map(|i| {
            let hits = hits.clone();
            // Half the subscribers observe the published table.
            let table = if i % 2 == 0 { "users" } else { "tweets" };
            bus.subscribe(table_set([table, "audit"]), move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
            })
        })
        .collect()
}

/// Benchmark: publish cost as the subscriber count grows
fn change_bus_publish_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("change_bus_publish");

    for count in [10usize, 100, 1000] {
        let bus = ChangeBus::immediate();
        let hits = Arc::new(AtomicUsize::new(0));
        let _subs = subscribe_all(&bus, count, &hits);
        let changes = Changes::from_table("users");

        group.bench_with_input(BenchmarkId::new("immediate", count), &count, |b, _| {
            b.iter(|| black_box(bus.publish(changes.clone())))
        });
    }

    group.finish();
}

/// Benchmark: publishing a change nobody observes
fn change_bus_miss_benchmark(c: &mut Criterion) {
    let bus = ChangeBus::immediate();
    let hits = Arc::new(AtomicUsize::new(0));
    let _subs = subscribe_all(&bus, 1000, &hits);
    let changes = Changes::from_table("comments");

    c.bench_function("change_bus_publish_miss_1000", |b| {
        b.iter(|| black_box(bus.publish(changes.clone())))
    });
}

criterion_group!(benches, change_bus_publish_benchmark, change_bus_miss_benchmark);
criterion_main!(benches);
