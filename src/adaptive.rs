//! Skip list that adapts tower heights online from observed hit counts.
//!
//! Physical level indices count *downward* from [`MAX_HEIGHT`]: the list-wide
//! baseline starts at `MAX_HEIGHT - 1` and every expansion of the structure
//! lowers it by one, so a node's logical height is its top level minus the
//! baseline. Each node tracks how far its own counters follow the shared
//! baseline through a private baseline field; stale levels are materialized
//! lazily on first touch, copying the forward handle downward and zeroing the
//! new level's hit counter.

use rand::prelude::*;
use thiserror::Error;

use crate::map::{Key, NodeView, SkipList, Value};
use crate::node::{Arena, HEAD, MAX_HEIGHT, NodeId, SENTINEL_KEY};

#[derive(Error, Debug, PartialEq)]
/// Errors that can occur when creating an [`AdaptiveSkipList`].
#[non_exhaustive]
pub enum AdaptiveError {
    /// The rebalance probability must be in the range `[0, 1]`.
    #[error("rebalance probability must be in [0, 1].")]
    InvalidProbability,
}

/// Node layout for the adaptive variant.
///
/// `hits[level]` counts accesses that passed this node at `level` since its
/// last promotion or demotion, for levels in
/// `[private baseline ..= top level]`. `selfhits` counts exact-match accesses
/// and is folded into every level's total when thresholds are evaluated.
#[derive(Clone, Debug)]
struct AdaptiveNode {
    key: Key,
    value: Value,
    /// Private baseline: how far down this node's counters and forwards have
    /// been materialized. Never below the list-wide baseline.
    zero_level: usize,
    top_level: usize,
    selfhits: i64,
    next: [Option<NodeId>; MAX_HEIGHT + 1],
    hits: [i64; MAX_HEIGHT + 1],
    deleted: bool,
}

impl AdaptiveNode {
    fn new(key: Key, value: Value, level: usize) -> Self {
        AdaptiveNode {
            key,
            value,
            zero_level: level,
            top_level: level,
            // The insert that creates the node is its first self-hit.
            selfhits: 1,
            next: [None; MAX_HEIGHT + 1],
            hits: [0; MAX_HEIGHT + 1],
            deleted: false,
        }
    }

    fn head() -> Self {
        AdaptiveNode {
            key: SENTINEL_KEY,
            value: 0.0,
            zero_level: MAX_HEIGHT - 1,
            top_level: MAX_HEIGHT,
            selfhits: 0,
            next: [None; MAX_HEIGHT + 1],
            hits: [0; MAX_HEIGHT + 1],
            deleted: false,
        }
    }
}

// ////////////////////////////////////////////////////////////////////////////
// AdaptiveSkipList
// ////////////////////////////////////////////////////////////////////////////

/// Self-adjusting skip list driven by per-node hit counters.
///
/// Every insert of a brand-new key runs a balancing pass; lookups and deletes
/// run one with the configured probability, bounding rebalancing overhead
/// while preserving adaptation. Frequently hit regions build tall towers, cold
/// regions shed height, converging the expected search cost towards the
/// entropy of the access distribution.
///
/// Deletion marks a tombstone so the node's hit history survives; a later
/// insert of the same key resurrects it in place.
///
/// # Examples
///
/// ```
/// use adaptive_skiplist::{AdaptiveSkipList, SkipList};
///
/// let mut list = AdaptiveSkipList::with_seed(0.5, 7)?;
/// list.put(1, 10.0);
/// assert_eq!(list.get(1), Some(10.0));
/// assert_eq!(list.delete(1), Some(10.0));
/// assert!(!list.contains(1));
/// # Ok::<(), adaptive_skiplist::adaptive::AdaptiveError>(())
/// ```
#[derive(Debug)]
pub struct AdaptiveSkipList {
    nodes: Arena<AdaptiveNode>,
    /// Shared baseline: the lowest materialized physical level. Starts at
    /// `MAX_HEIGHT - 1` and only ever decreases, never below 0.
    zero_level: usize,
    /// Operation counter feeding the promotion and demotion thresholds.
    m: i64,
    /// Probability that a lookup or delete triggers a balancing pass.
    p: f64,
    len: usize,
    rng: SmallRng,
}

impl AdaptiveSkipList {
    /// Create an empty list that rebalances on reads with probability `p`,
    /// seeded from system entropy.
    ///
    /// # Errors
    ///
    /// `p` must be in `[0, 1]`.
    pub fn new(p: f64) -> Result<Self, AdaptiveError> {
        let mut source = rand::rng();
        AdaptiveSkipList::from_rng(p, SmallRng::from_rng(&mut source))
    }

    /// Create an empty list with a fixed seed for the rebalance coin, so that
    /// runs are reproducible.
    ///
    /// # Errors
    ///
    /// `p` must be in `[0, 1]`.
    pub fn with_seed(p: f64, seed: u64) -> Result<Self, AdaptiveError> {
        AdaptiveSkipList::from_rng(p, SmallRng::seed_from_u64(seed))
    }

    fn from_rng(p: f64, rng: SmallRng) -> Result<Self, AdaptiveError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(AdaptiveError::InvalidProbability);
        }
        Ok(AdaptiveSkipList {
            nodes: Arena::with_head(AdaptiveNode::head()),
            zero_level: MAX_HEIGHT - 1,
            m: 0,
            p,
            len: 0,
            rng,
        })
    }

    /// Number of live (non-tombstoned) entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list holds no live entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over live `(key, value)` pairs in increasing key order.
    ///
    /// Walks each node's virtual bottom forward, so it is valid even when
    /// private baselines are stale.
    pub fn iter(&self) -> impl Iterator<Item = (Key, Value)> + '_ {
        std::iter::successors(self.bottom_next(HEAD), |&id| self.bottom_next(id))
            .filter(|&id| !self.nodes[id].deleted)
            .map(|id| (self.nodes[id].key, self.nodes[id].value))
    }

    #[inline]
    fn bottom_next(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id];
        node.next[node.zero_level]
    }

    /// Materialize every level of `id` down to `level`.
    ///
    /// Each materialized level inherits the forward handle from the level
    /// above and starts with a zeroed hit counter.
    fn sync_to(&mut self, id: NodeId, level: usize) {
        let node = &mut self.nodes[id];
        while node.zero_level > level {
            let z = node.zero_level;
            node.hits[z - 1] = 0;
            node.next[z - 1] = node.next[z];
            node.zero_level = z - 1;
        }
    }

    /// Hit total of `id` as seen from `level`, folding in self-hits.
    fn hits_at(&self, id: NodeId, level: usize) -> i64 {
        let node = &self.nodes[id];
        if node.zero_level > level {
            node.selfhits
        } else {
            node.selfhits + node.hits[level]
        }
    }

    #[inline]
    fn ascent_threshold(&self, level: usize) -> i64 {
        self.m / (1_i64 << (MAX_HEIGHT - 1 - level))
    }

    #[inline]
    fn descent_threshold(&self, level: usize) -> i64 {
        self.m / (1_i64 << (MAX_HEIGHT - level))
    }

    /// Whether `id` may be promoted above its current top level `top`,
    /// inheriting traffic that currently passes `prepred` there.
    fn ascent_ready(&self, id: NodeId, prepred: NodeId, top: usize) -> bool {
        top + 1 < MAX_HEIGHT
            && top < self.nodes[prepred].top_level
            && self.nodes[prepred].hits[top + 1] - self.nodes[prepred].hits[top]
                > self.ascent_threshold(top)
    }

    /// Descend from the top physical level to the baseline, synchronizing
    /// every touched node, and return the node holding `key`.
    fn find(&mut self, key: Key) -> Option<NodeId> {
        let mut pred = HEAD;
        for level in (self.zero_level..MAX_HEIGHT).rev() {
            self.sync_to(pred, level);
            let mut succ = self.nodes[pred].next[level];
            if let Some(s) = succ {
                self.sync_to(s, level);
            }
            while let Some(s) = succ {
                if self.nodes[s].key >= key {
                    break;
                }
                pred = s;
                succ = self.nodes[pred].next[level];
                if let Some(n) = succ {
                    self.sync_to(n, level);
                }
            }
            if let Some(s) = succ {
                if self.nodes[s].key == key {
                    return Some(s);
                }
            }
        }
        None
    }

    /// The balancing pass: records hits along the search path for `key` and
    /// applies the ascent and descent rules.
    fn update(&mut self, key: Key) {
        self.m += 1;
        self.nodes[HEAD].hits[MAX_HEIGHT] += 1;

        let mut pred = HEAD;
        for level in (self.zero_level..MAX_HEIGHT).rev() {
            self.sync_to(pred, level);
            let mut prepred = pred;
            let mut curr = self.nodes[pred].next[level];
            if let Some(c) = curr {
                self.sync_to(c, level);
            }
            match curr {
                Some(c) if self.nodes[c].key <= key => {}
                _ => {
                    // One step would already overshoot.
                    self.nodes[pred].hits[level] += 1;
                    continue;
                }
            }

            let mut found = false;
            while let Some(c) = curr {
                if self.nodes[c].key > key {
                    break;
                }
                self.sync_to(c, level);

                let next = self.nodes[c].next[level];
                let next_beyond = match next {
                    None => true,
                    Some(n) => self.nodes[n].key > key,
                };
                if next_beyond {
                    if self.nodes[c].key == key {
                        found = true;
                        self.nodes[c].selfhits += 1;
                    } else {
                        self.nodes[c].hits[level] += 1;
                    }
                    break;
                }

                let mut ascended = false;
                loop {
                    let top = self.nodes[c].top_level;
                    if !self.ascent_ready(c, prepred, top) {
                        break;
                    }
                    ascended = true;
                    let new_level = top + 1;
                    // Inherit prepred's traffic share at the new level, net of
                    // this node's own self-hits.
                    let inherited = self.nodes[prepred].hits[new_level]
                        - self.nodes[prepred].hits[top]
                        - self.nodes[c].selfhits;
                    let pp_forward = self.nodes[prepred].next[new_level];
                    let pp_lower = self.nodes[prepred].hits[top];
                    let node = &mut self.nodes[c];
                    node.top_level = new_level;
                    node.hits[new_level] = inherited;
                    node.next[new_level] = pp_forward;
                    let pp = &mut self.nodes[prepred];
                    pp.hits[new_level] = pp_lower;
                    pp.next[new_level] = Some(c);
                }
                if ascended {
                    // A promoted node never also evaluates descent this step.
                    prepred = c;
                    pred = c;
                    curr = self.nodes[pred].next[level];
                    continue;
                }

                let may_descend = level > 0
                    && self.nodes[c].top_level == level
                    && self.hits_at(c, level) + self.hits_at(pred, level)
                        <= self.descent_threshold(level);
                if may_descend {
                    if level == self.zero_level {
                        // The vacated level was the baseline: the list-wide
                        // minimum shrinks by one.
                        self.zero_level -= 1;
                    }
                    self.sync_to(c, level - 1);
                    self.sync_to(pred, level - 1);

                    let absorbed = self.hits_at(c, level);
                    self.nodes[pred].hits[level] += absorbed;
                    self.nodes[c].hits[level] = 0;
                    let forward = self.nodes[c].next[level];
                    self.nodes[pred].next[level] = forward;
                    self.nodes[c].next[level] = None;
                    self.nodes[c].top_level -= 1;
                    curr = self.nodes[pred].next[level];
                    continue;
                }

                pred = c;
                curr = self.nodes[pred].next[level];
            }
            if found {
                return;
            }
        }
    }

    /// Run the balancing pass with the configured probability.
    fn try_update(&mut self, key: Key) {
        if self.rng.random::<f64>() > self.p {
            return;
        }
        self.update(key);
    }

    /// Splice a brand-new node into the baseline level.
    fn insert_new(&mut self, key: Key, value: Value) {
        let id = self.nodes.alloc(AdaptiveNode::new(key, value, self.zero_level));
        let top = self.nodes[id].top_level;
        let mut pred = HEAD;
        for level in (self.zero_level..=MAX_HEIGHT).rev() {
            self.sync_to(pred, level);
            let mut curr = self.nodes[pred].next[level];
            while let Some(c) = curr {
                self.sync_to(c, level);
                if self.nodes[c].key < key {
                    pred = c;
                    curr = self.nodes[pred].next[level];
                } else {
                    break;
                }
            }
            if level <= top {
                self.nodes[id].next[level] = curr;
                self.nodes[pred].next[level] = Some(id);
            }
        }
    }
}

impl SkipList for AdaptiveSkipList {
    type Node<'a> = AdaptiveNodeRef<'a>;

    fn put(&mut self, key: Key, value: Value) -> Option<Value> {
        if let Some(id) = self.find(key) {
            let node = &mut self.nodes[id];
            let old = if node.deleted { None } else { Some(node.value) };
            node.deleted = false;
            node.value = value;
            if old.is_none() {
                self.len += 1;
            }
            self.try_update(key);
            return old;
        }
        self.insert_new(key, value);
        // A brand-new key always pays for a full balancing pass.
        self.update(key);
        self.len += 1;
        None
    }

    fn get(&mut self, key: Key) -> Option<Value> {
        let id = self.find(key)?;
        self.try_update(key);
        let node = &self.nodes[id];
        if node.deleted { None } else { Some(node.value) }
    }

    fn contains(&mut self, key: Key) -> bool {
        let Some(id) = self.find(key) else {
            return false;
        };
        self.try_update(key);
        !self.nodes[id].deleted
    }

    fn delete(&mut self, key: Key) -> Option<Value> {
        let id = self.find(key)?;
        let was_live = !self.nodes[id].deleted;
        self.nodes[id].deleted = true;
        if was_live {
            self.len -= 1;
        }
        self.try_update(key);
        if was_live {
            Some(self.nodes[id].value)
        } else {
            None
        }
    }

    fn head(&self) -> AdaptiveNodeRef<'_> {
        AdaptiveNodeRef {
            nodes: &self.nodes,
            id: HEAD,
        }
    }

    fn max_stats(&self) -> (usize, usize) {
        (self.len, MAX_HEIGHT - self.zero_level)
    }

    /// Synchronize every node's private baseline with the shared one so that
    /// read-only views line up across nodes.
    fn normalize(&mut self) {
        let z = self.zero_level;
        let mut node = Some(HEAD);
        while let Some(id) = node {
            self.sync_to(id, z);
            node = self.nodes[id].next[z];
        }
    }
}

// ////////////////////////////////////////////////////////////////////////////
// AdaptiveNodeRef
// ////////////////////////////////////////////////////////////////////////////

/// Read-only view over an adaptive node, reporting baseline-relative levels.
///
/// Only consistent after [`SkipList::normalize`]; the analysis tooling takes
/// care of that.
#[derive(Clone, Copy)]
pub struct AdaptiveNodeRef<'a> {
    nodes: &'a Arena<AdaptiveNode>,
    id: NodeId,
}

impl NodeView for AdaptiveNodeRef<'_> {
    #[inline]
    fn key(&self) -> Key {
        self.nodes[self.id].key
    }

    #[inline]
    fn value(&self) -> Value {
        self.nodes[self.id].value
    }

    #[inline]
    fn level(&self) -> usize {
        let node = &self.nodes[self.id];
        node.top_level - node.zero_level
    }

    fn next_at(&self, level: usize) -> Option<Self> {
        let node = &self.nodes[self.id];
        let physical = node.zero_level + level;
        if physical > node.top_level {
            return None;
        }
        node.next[physical].map(|id| AdaptiveNodeRef {
            nodes: self.nodes,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{AdaptiveError, AdaptiveSkipList};
    use crate::map::SkipList;

    #[rstest]
    fn invalid_probability(#[values(-0.1, 1.5, f64::NAN)] p: f64) {
        assert_eq!(
            AdaptiveSkipList::new(p).err(),
            Some(AdaptiveError::InvalidProbability)
        );
    }

    #[rstest]
    fn round_trip(#[values(0.0, 0.5, 1.0)] p: f64) -> Result<()> {
        let mut list = AdaptiveSkipList::with_seed(p, 3)?;
        for key in [5, 1, 9, 3, 7] {
            assert_eq!(list.put(key, f64::from(u32::try_from(key)?)), None);
        }
        assert_eq!(list.len(), 5);
        assert_eq!(list.get(9), Some(9.0));
        assert_eq!(list.get(2), None);
        assert!(list.contains(3));

        assert_eq!(list.delete(3), Some(3.0));
        assert_eq!(list.delete(3), None);
        assert!(!list.contains(3));
        assert_eq!(list.len(), 4);
        Ok(())
    }

    #[test]
    fn tombstone_resurrects_in_place() -> Result<()> {
        let mut list = AdaptiveSkipList::with_seed(1.0, 4)?;
        list.put(1, 1.0);
        list.put(2, 2.0);
        list.delete(1);
        assert_eq!(list.len(), 1);

        // Re-inserting the key clears the tombstone and keeps its history.
        assert_eq!(list.put(1, 10.0), None);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1), Some(10.0));
        Ok(())
    }

    #[test]
    fn iter_skips_tombstones() -> Result<()> {
        let mut list = AdaptiveSkipList::with_seed(1.0, 5)?;
        for key in 0..10 {
            list.put(key, f64::from(u32::try_from(key)?));
        }
        for key in [2, 4, 6] {
            list.delete(key);
        }
        let keys: Vec<_> = list.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![0, 1, 3, 5, 7, 8, 9]);
        Ok(())
    }

    #[test]
    fn hot_keys_grow_the_structure() -> Result<()> {
        let mut list = AdaptiveSkipList::with_seed(1.0, 6)?;
        for key in 0..256 {
            list.put(key, 0.0);
        }
        let (_, before) = list.max_stats();
        for _ in 0..2_000 {
            list.get(0);
            list.get(255);
        }
        let (_, after) = list.max_stats();
        assert!(after >= before, "baseline must only ever expand");
        Ok(())
    }
}
