//! Cross-variant behavioural properties.
//!
//! Every balancing policy must satisfy the same map contract, keep its towers
//! structurally valid under arbitrary interleavings, and be measurable by the
//! same analysis tooling.

use std::collections::HashMap;

use anyhow::Result;
use rand::prelude::*;
use rand_distr::Zipf;

use adaptive_skiplist::{
    AdaptiveSkipList, FrequencySkipList, RandomSkipList, SkipList, SpanSkipList, analysis,
};

fn assert_round_trip(list: &mut impl SkipList) {
    for key in [5, 1, 9, 3, 7, 2, 8] {
        assert_eq!(list.put(key, f64::from(key as u8) * 10.0), None);
    }
    assert_eq!(list.get(3), Some(30.0));
    assert_eq!(list.get(4), None);
    assert!(list.contains(9));
    assert!(!list.contains(0));

    assert_eq!(list.delete(3), Some(30.0));
    assert_eq!(list.delete(3), None);
    assert_eq!(list.get(3), None);

    // A deleted key can come back.
    assert_eq!(list.put(3, 33.0), None);
    assert_eq!(list.get(3), Some(33.0));
}

fn assert_put_is_idempotent(list: &mut impl SkipList) {
    assert_eq!(list.put(1, 1.0), None);
    assert_eq!(list.put(1, 1.0), Some(1.0));
    assert_eq!(list.put(1, 2.0), Some(1.0));
    let (len, _) = list.max_stats();
    assert_eq!(len, 1);
}

/// Interleave seeded inserts and deletes, validating the towers after every
/// mutation.
fn assert_structure_survives_churn(list: &mut impl SkipList) -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(97);
    let mut keys = Vec::new();
    for i in 0..50 {
        let key = rng.random_range(-1_000..1_000);
        list.put(key, f64::from(i));
        keys.push(key);
        analysis::check_structure(list)?;
        if i % 5 == 4 {
            let victim = keys[rng.random_range(0..keys.len())];
            list.delete(victim);
            analysis::check_structure(list)?;
        }
    }
    Ok(())
}

#[test]
fn random_list_honours_the_map_contract() {
    assert_round_trip(&mut RandomSkipList::with_seed(1));
    assert_put_is_idempotent(&mut RandomSkipList::with_seed(2));
}

#[test]
fn frequency_list_honours_the_map_contract() {
    assert_round_trip(&mut FrequencySkipList::with_seed(1));
    assert_put_is_idempotent(&mut FrequencySkipList::with_seed(2));
}

#[test]
fn adaptive_list_honours_the_map_contract() -> Result<()> {
    assert_round_trip(&mut AdaptiveSkipList::with_seed(0.5, 1)?);
    assert_put_is_idempotent(&mut AdaptiveSkipList::with_seed(0.0, 2)?);
    Ok(())
}

#[test]
fn span_list_honours_the_map_contract() -> Result<()> {
    assert_round_trip(&mut SpanSkipList::new(3)?);
    assert_put_is_idempotent(&mut SpanSkipList::new(3)?);
    Ok(())
}

#[test]
fn towers_stay_valid_under_churn() -> Result<()> {
    assert_structure_survives_churn(&mut RandomSkipList::with_seed(11))?;
    assert_structure_survives_churn(&mut FrequencySkipList::with_seed(11))?;
    assert_structure_survives_churn(&mut AdaptiveSkipList::with_seed(1.0, 11)?)?;
    assert_structure_survives_churn(&mut SpanSkipList::new(2)?)?;
    Ok(())
}

#[test]
fn expected_cost_agrees_with_traced_searches() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(23);
    let mut random = RandomSkipList::with_seed(23);
    let mut span = SpanSkipList::new(3)?;
    let mut distribution = HashMap::new();
    for key in 0..300 {
        random.put(key, 0.0);
        span.put(key, 0.0);
        distribution.insert(key, rng.random::<f64>() + 0.01);
    }
    // Warm the span list so promotion has actually happened.
    for _ in 0..200 {
        span.get(rng.random_range(0..300));
    }

    check_agreement(&mut random, &distribution);
    check_agreement(&mut span, &distribution);
    Ok(())
}

fn check_agreement(list: &mut impl SkipList, distribution: &HashMap<i64, f64>) {
    let (average, steps) = analysis::expected_step_cost(list, distribution);
    assert_eq!(steps.len(), distribution.len());
    let mut weighted = 0.0;
    let mut mass = 0.0;
    for (&key, &p) in distribution {
        #[expect(clippy::cast_precision_loss, reason = "hop counts are small")]
        {
            weighted += analysis::find_step(list, key).total as f64 * p;
        }
        mass += p;
    }
    assert!((average - weighted / mass).abs() < 1e-9);
}

/// Training an adaptive list on a skewed workload must beat the randomized
/// baseline under that same workload.
#[test]
fn adaptation_beats_random_on_a_skewed_workload() -> Result<()> {
    const N: usize = 1_000;
    const TRAINING_OPS: usize = 20_000;

    // Zipf(s = 1.5) over keys 0..N, matching the sampler below.
    let mut distribution = HashMap::new();
    let mut mass = 0.0;
    for key in 0..N {
        let w = 1.0 / ((key as f64) + 1.0).powf(1.5);
        distribution.insert(key as i64, w);
        mass += w;
    }
    for w in distribution.values_mut() {
        *w /= mass;
    }

    let mut adaptive = AdaptiveSkipList::with_seed(1.0, 41)?;
    let mut random = RandomSkipList::with_seed(41);
    for key in 0..N {
        adaptive.put(key as i64, 0.0);
        random.put(key as i64, 0.0);
    }

    let mut rng = SmallRng::seed_from_u64(42);
    let zipf = Zipf::new(N as f64, 1.5)?;
    for _ in 0..TRAINING_OPS {
        let key = rng.sample(zipf) as i64 - 1;
        adaptive.get(key);
    }

    let (trained, _) = analysis::expected_step_cost(&mut adaptive, &distribution);
    let (baseline, _) = analysis::expected_step_cost(&mut random, &distribution);
    assert!(
        trained < baseline,
        "trained cost {trained} should undercut the baseline {baseline}"
    );
    Ok(())
}

/// Frequency hints translate a key's expected traffic share directly into
/// tower height, so hinted hot keys are cheaper to reach than the hint-free
/// baseline would make them.
#[test]
fn frequency_hints_cheapen_hot_keys() {
    const N: i64 = 512;
    let mut hinted = FrequencySkipList::with_seed(7);
    let mut plain = RandomSkipList::with_seed(7);
    for key in 0..N {
        // Hot head of the keyspace, cold tail.
        let predicted = if key < 8 { 4096.0 } else { 1.0 };
        hinted.put_with_predicted_frequency(key, 0.0, predicted);
        plain.put(key, 0.0);
    }

    let hot: Vec<i64> = (0..8).collect();
    let hinted_cost: usize = hot
        .iter()
        .map(|&k| analysis::find_step(&mut hinted, k).total)
        .sum();
    let plain_cost: usize = hot
        .iter()
        .map(|&k| analysis::find_step(&mut plain, k).total)
        .sum();
    assert!(
        hinted_cost <= plain_cost,
        "hinted hot keys cost {hinted_cost}, unhinted {plain_cost}"
    );
}
