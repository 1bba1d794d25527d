use criterion::measurement::WallTime;
use criterion::*;

use tessera::{
    DelaunayTetrahedralization, DelaunayTriangulation2, InsertionParameters, Point2, Point3,
};

use crate::benchmark_utilities::*;

pub fn insert_benchmark(c: &mut Criterion) {
    fn single_insert_benchmark(
        group: &mut BenchmarkGroup<WallTime>,
        name: &'static str,
        parameters: InsertionParameters,
        sizes: &[usize],
    ) {
        for size in sizes {
            group.throughput(Throughput::Elements(*size as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
                b.iter(|| {
                    let mut triangulation =
                        DelaunayTriangulation2::<Point2<f64>>::with_parameters(parameters.clone());
                    for vertex in uniform_distribution(*SEED, RANGE).take(*size) {
                        triangulation.add_point(vertex).unwrap();
                    }
                    triangulation.perform().unwrap()
                });
            });
        }
    }

    let mut group = c.benchmark_group("insert benchmark 2D");
    let sizes = &[250, 500, 1000, 2000];

    single_insert_benchmark(
        &mut group,
        "default strides",
        InsertionParameters::default(),
        sizes,
    );
    single_insert_benchmark(
        &mut group,
        "single pass",
        InsertionParameters::new().with_insertion_strides(vec![1]),
        sizes,
    );
    group.finish();

    let mut group = c.benchmark_group("insert benchmark 3D");
    for size in [100, 250, 500] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("default", size), &size, |b, &size| {
            b.iter(|| {
                let mut tetrahedralization = DelaunayTetrahedralization::<Point3<f64>>::new();
                for vertex in uniform_distribution_3d(*SEED, RANGE).take(size) {
                    tetrahedralization.add_point(vertex).unwrap();
                }
                tetrahedralization.perform().unwrap()
            });
        });
    }
    group.finish();
}
