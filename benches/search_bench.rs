use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sorrel::{DefaultOp, Document, SearchRequest, Store, StoreConfig};

const VOCABULARY: &[&str] = &[
    "cow", "dog", "cat", "horse", "sheep", "goat", "barn", "field", "fence", "tractor", "hay",
    "grain", "river", "hill", "meadow", "orchard", "apple", "pear", "plum", "wheat",
];

fn generate_text(seed: usize, words: usize) -> String {
    (0..words)
        .map(|i| VOCABULARY[(seed * 31 + i * 7 + seed / 3) % VOCABULARY.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn config() -> StoreConfig {
    serde_json::from_value(serde_json::json!({
        "fields": {
            "body": {},
            "rank": { "type": "integer", "sortable": true }
        }
    }))
    .unwrap()
}

fn populate(store: &Store, count: usize) {
    store
        .transaction(|s| -> sorrel::Result<()> {
            for i in 0..count {
                Document::new()
                    .add_field("body", generate_text(i, 12))
                    .add_field("rank", (i % 100) as i64)
                    .save(s)?;
            }
            Ok(())
        })
        .unwrap();
}

fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Indexing");
    group.sample_size(10);

    for count in [1000, 5000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let store = Store::open(config()).unwrap();
                populate(&store, count);
            })
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("Search");
    group.sample_size(10);

    // Setup store once
    let store = Store::open(config()).unwrap();
    populate(&store, 5000);

    group.bench_function("and", |b| {
        b.iter(|| store.search("cow barn").unwrap())
    });
    group.bench_function("or", |b| {
        let request = SearchRequest::builder("cow barn hay")
            .default_op(DefaultOp::Or)
            .build();
        b.iter(|| store.search(request.clone()).unwrap())
    });
    group.bench_function("phrase", |b| {
        b.iter(|| store.search("\"cow dog\"").unwrap())
    });
    group.bench_function("filter_and_facet", |b| {
        let request = SearchRequest::builder("apple")
            .filter("rank", "10..60")
            .facet("rank")
            .build();
        b.iter(|| store.search(request.clone()).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_indexing, bench_search);
criterion_main!(benches);
