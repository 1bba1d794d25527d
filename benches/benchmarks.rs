use criterion::*;

mod insert_benchmark;

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = insert_benchmark::insert_benchmark, cdt_benchmark::cdt_benchmark
}

criterion_main!(benches);
