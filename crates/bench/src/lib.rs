use std::time::Duration;

use criterion::BenchmarkGroup;
use criterion::measurement::Measurement;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SMALL_RUNTIME_SAMPLE_SIZE: usize = 15;
const SMALL_RUNTIME_WARM_UP_MS: u64 = 100;
const SMALL_RUNTIME_MEASURE_MS: u64 = 200;
const MEDIUM_RUNTIME_SAMPLE_SIZE: usize = 15;
const MEDIUM_RUNTIME_WARM_UP_MS: u64 = 500;
const MEDIUM_RUNTIME_MEASURE_MS: u64 = 1000;
const RNG_SEED: u64 = 0x5EED_2026;

pub fn apply_small_runtime_config<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    group.sample_size(SMALL_RUNTIME_SAMPLE_SIZE);
    group.warm_up_time(Duration::from_millis(SMALL_RUNTIME_WARM_UP_MS));
    group.measurement_time(Duration::from_millis(SMALL_RUNTIME_MEASURE_MS));
}

pub fn apply_medium_runtime_config<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    group.sample_size(MEDIUM_RUNTIME_SAMPLE_SIZE);
    group.warm_up_time(Duration::from_millis(MEDIUM_RUNTIME_WARM_UP_MS));
    group.measurement_time(Duration::from_millis(MEDIUM_RUNTIME_MEASURE_MS));
}

pub fn default_rng() -> StdRng {
    StdRng::seed_from_u64(RNG_SEED)
}

/// Shape of a benchmark input stream.
#[derive(Clone, Copy, Debug)]
pub enum StreamShape {
    /// Uniform over a wide range; few duplicates.
    Uniform,
    /// Uniform over a range much smaller than the stream; many duplicates.
    Duplicates,
    /// Strictly increasing, the worst case for rebalancing on one side.
    Ascending,
    /// Increasing with occasional out-of-order values.
    NearlySorted,
}

impl StreamShape {
    pub const ALL: [StreamShape; 4] = [
        StreamShape::Uniform,
        StreamShape::Duplicates,
        StreamShape::Ascending,
        StreamShape::NearlySorted,
    ];

    /// Shapes that arrive (nearly) in order, which drive a weight-balanced tree
    /// into a weight shift on almost every insert.
    pub fn is_presorted(self) -> bool {
        matches!(self, StreamShape::Ascending | StreamShape::NearlySorted)
    }

    pub fn label(self) -> &'static str {
        match self {
            StreamShape::Uniform => "uniform",
            StreamShape::Duplicates => "duplicates",
            StreamShape::Ascending => "ascending",
            StreamShape::NearlySorted => "nearly_sorted",
        }
    }
}

pub fn generate_stream<R: Rng + ?Sized>(rng: &mut R, shape: StreamShape, len: usize) -> Vec<i64> {
    match shape {
        StreamShape::Uniform => (0..len)
            .map(|_| rng.random_range(-1_000_000_000..=1_000_000_000))
            .collect(),
        StreamShape::Duplicates => {
            let distinct = (len / 16).max(1) as i64;
            (0..len).map(|_| rng.random_range(0..distinct)).collect()
        }
        StreamShape::Ascending => (0..len as i64).collect(),
        StreamShape::NearlySorted => (0..len as i64)
            .map(|i| {
                if rng.random_range(0..100) < 5 {
                    rng.random_range(0..len as i64)
                } else {
                    i
                }
            })
            .collect(),
    }
}
