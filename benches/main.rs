//! Search-cost comparison of the balancing policies under a skewed workload.

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::prelude::*;
use rand_distr::Zipf;

use adaptive_skiplist::{
    AdaptiveSkipList, FrequencySkipList, RandomSkipList, SkipList, SpanSkipList,
};

const KEYS: usize = 10_000;
const EXPONENT: f64 = 1.2;
const TRAINING_OPS: usize = 50_000;

/// A reproducible stream of Zipf-distributed keys over `0..KEYS`.
fn workload(seed: u64, len: usize) -> Vec<i64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    #[expect(clippy::cast_precision_loss, reason = "key count is far below 2^52")]
    let zipf = Zipf::new(KEYS as f64, EXPONENT).expect("valid Zipf parameters");
    #[expect(clippy::cast_possible_truncation, reason = "samples lie in 1..=KEYS")]
    (0..len).map(|_| rng.sample(zipf) as i64 - 1).collect()
}

/// Probability of key `k` under the truncated Zipf workload.
fn probability(key: i64) -> f64 {
    #[expect(clippy::cast_precision_loss, reason = "key count is far below 2^52")]
    let mass: f64 = (1..=KEYS).map(|r| 1.0 / (r as f64).powf(EXPONENT)).sum();
    #[expect(clippy::cast_precision_loss, reason = "keys are far below 2^52")]
    let rank = key as f64 + 1.0;
    1.0 / rank.powf(EXPONENT) / mass
}

fn populated<L: SkipList>(mut list: L) -> L {
    for key in 0..KEYS {
        #[expect(clippy::cast_possible_wrap, reason = "key count fits in i64")]
        list.put(key as i64, 0.0);
    }
    list
}

fn bench_gets(c: &mut Criterion) {
    let queries = workload(1, 1_000);
    let mut group = c.benchmark_group("zipf_get");

    let mut random = populated(RandomSkipList::with_seed(7));

    let mut frequency = FrequencySkipList::with_seed(7);
    for key in 0..KEYS {
        #[expect(clippy::cast_possible_wrap, reason = "key count fits in i64")]
        let key = key as i64;
        #[expect(clippy::cast_precision_loss, reason = "op count is far below 2^52")]
        frequency.put_with_predicted_frequency(key, 0.0, TRAINING_OPS as f64 * probability(key));
    }

    let mut adaptive =
        populated(AdaptiveSkipList::with_seed(0.1, 7).expect("probability is in range"));
    for &key in &workload(2, TRAINING_OPS) {
        adaptive.get(key);
    }

    let mut span = populated(SpanSkipList::new(4).expect("span is nonzero"));
    for &key in &workload(2, TRAINING_OPS) {
        span.get(key);
    }

    group.bench_with_input(BenchmarkId::new("random", KEYS), &queries, |b, queries| {
        b.iter_batched(
            || queries.clone(),
            |queries| {
                for key in queries {
                    random.get(key);
                }
            },
            BatchSize::SmallInput,
        );
    });
    group.bench_with_input(
        BenchmarkId::new("frequency_hinted", KEYS),
        &queries,
        |b, queries| {
            b.iter_batched(
                || queries.clone(),
                |queries| {
                    for key in queries {
                        frequency.get(key);
                    }
                },
                BatchSize::SmallInput,
            );
        },
    );
    group.bench_with_input(
        BenchmarkId::new("adaptive_trained", KEYS),
        &queries,
        |b, queries| {
            b.iter_batched(
                || queries.clone(),
                |queries| {
                    for key in queries {
                        adaptive.get(key);
                    }
                },
                BatchSize::SmallInput,
            );
        },
    );
    group.bench_with_input(
        BenchmarkId::new("span_trained", KEYS),
        &queries,
        |b, queries| {
            b.iter_batched(
                || queries.clone(),
                |queries| {
                    for key in queries {
                        span.get(key);
                    }
                },
                BatchSize::SmallInput,
            );
        },
    );
    group.finish();
}

fn bench_inserts(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_put");
    group.bench_function("random", |b| {
        b.iter_batched(
            || RandomSkipList::with_seed(7),
            populated,
            BatchSize::SmallInput,
        );
    });
    group.bench_function("span", |b| {
        b.iter_batched(
            || SpanSkipList::new(4).expect("span is nonzero"),
            populated,
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_gets, bench_inserts);
criterion_main!(benches);
