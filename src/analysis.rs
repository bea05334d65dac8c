//! Search-cost analysis and structural validation.
//!
//! Everything here is written only against the [`SkipList`] and [`NodeView`]
//! contracts, so the same tooling measures every balancing policy. Each
//! function normalizes the list first so that views are mutually consistent.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use thiserror::Error;

use crate::map::{Key, NodeView, SkipList};

/// Cost of one deterministic search: total hop count plus the per-level
/// breakdown (index = level).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchCost {
    /// Hops over the whole search, descents included.
    pub total: usize,
    /// Hops taken at each level, indexed by level.
    pub per_level: Vec<usize>,
}

/// Trace one search for `key`, counting every hop it takes.
///
/// Rightward moves cost one hop each, as does dropping a level. On a match
/// the final rightward hop is counted and the search stops without paying for
/// the remaining descents; if the key is absent the cost of the full descent
/// is reported instead.
pub fn find_step<L: SkipList>(list: &mut L, key: Key) -> SearchCost {
    list.normalize();
    let (_, max_level) = list.max_stats();
    let mut per_level = vec![0; max_level + 1];
    let mut total = 0;
    let mut cur = list.head();
    for level in (0..=max_level).rev() {
        let mut steps = 0;
        loop {
            match cur.next_at(level) {
                Some(next) if next.key() < key => {
                    cur = next;
                    steps += 1;
                }
                _ => break,
            }
        }
        if let Some(next) = cur.next_at(level) {
            if next.key() == key {
                steps += 1;
                per_level[level] = steps;
                total += steps;
                return SearchCost { total, per_level };
            }
        }
        per_level[level] = steps;
        total += steps + 1;
    }
    SearchCost { total, per_level }
}

/// Expected search cost under a known access distribution.
///
/// Performs one tower-aware depth-first walk (a node is processed at its top
/// level, the walk recurses one level down, then continues along same-level
/// successors), accumulating `hops x probability` for every key present in
/// `distribution`. Keys the distribution does not mention (the head sentinel,
/// tombstones) contribute nothing. Returns the probability-weighted average
/// together with the exact hop count per key; the average equals the weighted
/// mean of independent [`find_step`] totals.
pub fn expected_step_cost<L: SkipList>(
    list: &mut L,
    distribution: &HashMap<Key, f64>,
) -> (f64, BTreeMap<Key, usize>) {
    let mut steps = BTreeMap::new();
    if distribution.is_empty() {
        return (0.0, steps);
    }
    list.normalize();
    let (_, max_level) = list.max_stats();

    let mut weighted = 0.0;
    let mut mass = 0.0;
    walk(
        list.head(),
        max_level,
        0,
        &mut |key, hops| {
            if let Some(&p) = distribution.get(&key) {
                #[expect(
                    clippy::cast_precision_loss,
                    reason = "hop counts are far below 2^52"
                )]
                {
                    weighted += hops as f64 * p;
                }
                mass += p;
                steps.insert(key, hops);
            }
        },
    );

    if mass > 0.0 {
        (weighted / mass, steps)
    } else {
        (0.0, steps)
    }
}

/// Depth-first walk over the towers reachable from `first` at `level`.
///
/// Recursion is only ever downward (bounded by the tower height); same-level
/// successors are followed iteratively.
fn walk<N: NodeView>(first: N, level: usize, hops: usize, visit: &mut impl FnMut(Key, usize)) {
    let mut node = first;
    let mut hops = hops;
    loop {
        if node.level() == level {
            visit(node.key(), hops);
        }
        if level > 0 {
            walk(node, level - 1, hops + 1, visit);
        }
        match node.next_at(level) {
            Some(next) if next.level() == level => {
                node = next;
                hops += 1;
            }
            _ => break,
        }
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Structural validation
// ////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug, PartialEq, Eq)]
/// Tower-consistency violations found by [`check_structure`].
///
/// These are programming-invariant failures: they indicate a bug in a
/// balancing algorithm, not a runtime condition callers should handle.
#[non_exhaustive]
pub enum StructureError {
    /// The level-0 chain is not strictly increasing by key.
    #[error("level-0 chain out of order: {prev} precedes {next}.")]
    OutOfOrder { prev: Key, next: Key },
    /// A node claims a level above the list's reported maximum.
    #[error("node {key} reports level {level} above the list maximum {max_level}.")]
    LevelOutOfRange {
        key: Key,
        level: usize,
        max_level: usize,
    },
    /// A node occupies a level, but the tracked predecessor at that level
    /// does not forward to it.
    #[error("broken tower link: predecessor at level {level} does not forward to node {key}.")]
    BrokenLink { key: Key, level: usize },
}

/// Verify tower consistency across the entire list.
///
/// Walks the full level-0 chain while maintaining a per-level "last seen"
/// view; for every level a node claims to occupy, the tracked predecessor at
/// that level must forward to it. Strict key ordering along level 0 is
/// checked on the way.
pub fn check_structure<L: SkipList>(list: &mut L) -> Result<(), StructureError> {
    list.normalize();
    let (_, max_level) = list.max_stats();
    let head = list.head();
    let mut last_seen = vec![head; max_level + 1];
    let mut prev_key: Option<Key> = None;

    let mut node = head.next_at(0);
    while let Some(n) = node {
        if let Some(prev) = prev_key {
            if n.key() <= prev {
                return Err(StructureError::OutOfOrder {
                    prev,
                    next: n.key(),
                });
            }
        }
        prev_key = Some(n.key());

        let level = n.level();
        if level > max_level {
            return Err(StructureError::LevelOutOfRange {
                key: n.key(),
                level,
                max_level,
            });
        }
        for l in 1..=level {
            match last_seen[l].next_at(l) {
                Some(forward) if forward.key() == n.key() => last_seen[l] = n,
                _ => {
                    return Err(StructureError::BrokenLink {
                        key: n.key(),
                        level: l,
                    });
                }
            }
        }
        node = n.next_at(0);
    }
    Ok(())
}

// ////////////////////////////////////////////////////////////////////////////
// Diagnostics
// ////////////////////////////////////////////////////////////////////////////

/// Render the tower structure as an ASCII diagram, one row per level, capped
/// at `max_level` rows and `max_nodes` columns.
pub fn render<L: SkipList>(list: &mut L, max_level: usize, max_nodes: usize) -> String {
    list.normalize();
    let (_, actual) = list.max_stats();
    let max_level = max_level.min(actual);
    let mut rows: Vec<String> = (0..=max_level)
        .map(|level| format!("level {level} : "))
        .collect();

    let mut node = Some(list.head());
    let mut column = 0;
    while let Some(n) = node {
        if column >= max_nodes {
            break;
        }
        let cell = if column == 0 {
            "head".to_owned()
        } else {
            n.key().to_string()
        };
        let level = n.level();
        for (l, row) in rows.iter_mut().enumerate() {
            if l <= level {
                let _ = write!(row, "{cell:>4} ->");
            } else {
                row.push_str("     ->");
            }
        }
        node = n.next_at(0);
        column += 1;
    }

    let mut out = String::new();
    for row in rows.iter().rev() {
        out.push_str(row);
        out.push('\n');
    }
    out
}

/// Number of nodes (head excluded, tombstones included) occupying each level.
pub fn level_counts<L: SkipList>(list: &mut L) -> Vec<usize> {
    list.normalize();
    let (_, max_level) = list.max_stats();
    let mut counts = vec![0; max_level + 1];
    let mut node = list.head().next_at(0);
    while let Some(n) = node {
        for level in 0..=n.level().min(max_level) {
            counts[level] += 1;
        }
        node = n.next_at(0);
    }
    counts
}
