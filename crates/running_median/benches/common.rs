use std::hint::black_box;
use std::time::{Duration, Instant};

use bench::{
    StreamShape, apply_medium_runtime_config, apply_small_runtime_config, default_rng,
    generate_stream,
};
use criterion::measurement::Measurement;
use criterion::{BenchmarkGroup, BenchmarkId};

use running_median::{BalanceMode, MedianTree, OrderedMapMedian, RunningMedian};

const SIZES: [usize; 3] = [1_000, 4_000, 16_000];
// Presorted streams make weighted inserts quadratic.
const PRESORTED_SIZES: [usize; 2] = [1_000, 4_000];
const MEDIUM_RUNTIME_FROM: usize = 16_000;
const QUERIES_PER_ITER: usize = 200;

pub trait BenchMedian: RunningMedian<Value = i64> {
    fn fresh() -> Self;
}

pub struct Weighted(MedianTree<i64>);
pub struct HeightOnly(MedianTree<i64>);

macro_rules! delegate_running_median {
    ($wrapper:ident, $mode:expr) => {
        impl RunningMedian for $wrapper {
            type Value = i64;

            fn len(&self) -> usize {
                self.0.len()
            }

            fn clear(&mut self) {
                self.0.clear();
            }

            fn insert(&mut self, value: i64) {
                self.0.insert(value);
            }

            fn median(&self) -> Option<i64> {
                RunningMedian::median(&self.0)
            }
        }

        impl BenchMedian for $wrapper {
            fn fresh() -> Self {
                $wrapper(MedianTree::with_mode($mode))
            }
        }
    };
}

delegate_running_median!(Weighted, BalanceMode::WeightBalanced);
delegate_running_median!(HeightOnly, BalanceMode::HeightOnly);

impl BenchMedian for OrderedMapMedian<i64> {
    fn fresh() -> Self {
        OrderedMapMedian::new()
    }
}

fn sizes_for(shape: StreamShape) -> &'static [usize] {
    if shape.is_presorted() {
        &PRESORTED_SIZES
    } else {
        &SIZES
    }
}

fn configure<T: Measurement>(group: &mut BenchmarkGroup<'_, T>, size: usize) {
    if size >= MEDIUM_RUNTIME_FROM {
        apply_medium_runtime_config(group);
    } else {
        apply_small_runtime_config(group);
    }
}

/// Builds a median tracker from scratch over the whole stream, one insert at a time.
pub fn bench_insert<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str, shape: StreamShape)
where
    T: Measurement<Value = Duration>,
    M: BenchMedian,
{
    for &size in sizes_for(shape) {
        configure(group, size);
        let stream = generate_stream(&mut default_rng(), shape, size);
        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    let mut median = M::fresh();
                    let start = Instant::now();
                    for &value in &stream {
                        median.insert(value);
                    }
                    black_box(median.len());
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

/// Queries the median repeatedly on a prebuilt tracker.
pub fn bench_query<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str, shape: StreamShape)
where
    T: Measurement<Value = Duration>,
    M: BenchMedian,
{
    for &size in sizes_for(shape) {
        configure(group, size);
        let mut median = M::fresh();
        median.extend(generate_stream(&mut default_rng(), shape, size));
        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter(|| {
                for _ in 0..QUERIES_PER_ITER {
                    black_box(median.median());
                }
            })
        });
    }
}

/// Interleaves every insert with a median query, the intended online workload.
pub fn bench_online<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str, shape: StreamShape)
where
    T: Measurement<Value = Duration>,
    M: BenchMedian,
{
    for &size in sizes_for(shape) {
        configure(group, size);
        let stream = generate_stream(&mut default_rng(), shape, size);
        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    let mut median = M::fresh();
                    let start = Instant::now();
                    for &value in &stream {
                        median.insert(value);
                        black_box(median.median());
                    }
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

pub fn bench_all_insert<T: Measurement<Value = Duration>>(group: &mut BenchmarkGroup<'_, T>) {
    for shape in StreamShape::ALL {
        bench_insert::<Weighted, T>(group, &format!("weighted/{}", shape.label()), shape);
        bench_insert::<HeightOnly, T>(group, &format!("height_only/{}", shape.label()), shape);
        bench_insert::<OrderedMapMedian<i64>, T>(group, &format!("sorted_counts/{}", shape.label()), shape);
    }
}

pub fn bench_all_query<T: Measurement<Value = Duration>>(group: &mut BenchmarkGroup<'_, T>) {
    let shape = StreamShape::Uniform;
    bench_query::<Weighted, T>(group, "weighted", shape);
    bench_query::<HeightOnly, T>(group, "height_only", shape);
    bench_query::<OrderedMapMedian<i64>, T>(group, "sorted_counts", shape);
}

pub fn bench_all_online<T: Measurement<Value = Duration>>(group: &mut BenchmarkGroup<'_, T>) {
    for shape in [StreamShape::Uniform, StreamShape::NearlySorted] {
        bench_online::<Weighted, T>(group, &format!("weighted/{}", shape.label()), shape);
        bench_online::<HeightOnly, T>(group, &format!("height_only/{}", shape.label()), shape);
        bench_online::<OrderedMapMedian<i64>, T>(group, &format!("sorted_counts/{}", shape.label()), shape);
    }
}
