//! Skip list whose tower heights are chosen from predicted access
//! frequencies supplied by the caller at insert time.

use crate::level_generator::{Geometric, LevelGenerator};
use crate::map::{Key, NodeView, SkipList, Value};
use crate::node::{Arena, HEAD, MAX_HEIGHT, NodeId, TowerNode, TowerNodeRef};
use crate::random::PROMOTION_P;

/// A skip list accepting a predicted access count per key.
///
/// A key predicted to be accessed `c` times is deterministically promoted
/// while `c >= 2^level`, placing hot keys near the top of the list up front
/// instead of waiting for the access pattern to reveal itself. Inserts without
/// a prediction fall back to the classic randomized policy.
///
/// # Examples
///
/// ```
/// use adaptive_skiplist::{FrequencySkipList, SkipList};
///
/// let mut list = FrequencySkipList::with_seed(7);
/// // Expected to serve roughly a quarter of 4096 accesses.
/// list.put_with_predicted_frequency(1, 10.0, 1024.0);
/// list.put(2, 20.0);
/// assert_eq!(list.get(1), Some(10.0));
/// ```
#[derive(Debug)]
pub struct FrequencySkipList {
    nodes: Arena<TowerNode>,
    level: usize,
    len: usize,
    generator: Geometric,
}

impl FrequencySkipList {
    /// Create an empty list seeded from system entropy.
    #[must_use]
    pub fn new() -> Self {
        #[expect(clippy::expect_used, reason = "fixed parameters are always valid")]
        let generator =
            Geometric::new(MAX_HEIGHT + 1, PROMOTION_P).expect("fixed parameters are valid");
        FrequencySkipList::with_generator(generator)
    }

    /// Create an empty list whose height draws are reproducible from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        #[expect(clippy::expect_used, reason = "fixed parameters are always valid")]
        let generator = Geometric::with_seed(MAX_HEIGHT + 1, PROMOTION_P, seed)
            .expect("fixed parameters are valid");
        FrequencySkipList::with_generator(generator)
    }

    fn with_generator(generator: Geometric) -> Self {
        FrequencySkipList {
            nodes: Arena::with_head(TowerNode::head()),
            level: 0,
            len: 0,
            generator,
        }
    }

    /// Number of live entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over `(key, value)` pairs in increasing key order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, Value)> + '_ {
        std::iter::successors(self.nodes[HEAD].next[0], |&id| self.nodes[id].next[0])
            .map(|id| (self.nodes[id].key, self.nodes[id].value))
    }

    /// Insert `key` with a predicted access count, replacing and returning the
    /// previous value if the key is already present.
    ///
    /// `predicted` is conventionally `expected total accesses x predicted
    /// probability` and must be non-negative; negative predictions behave as
    /// zero.
    pub fn put_with_predicted_frequency(
        &mut self,
        key: Key,
        value: Value,
        predicted: f64,
    ) -> Option<Value> {
        if let Some(id) = self.find(key) {
            let old = self.nodes[id].value;
            self.nodes[id].value = value;
            return Some(old);
        }
        let height = self.generator.level_for_frequency(predicted).min(MAX_HEIGHT);
        self.splice(key, value, height);
        None
    }

    fn find(&self, key: Key) -> Option<NodeId> {
        let mut cur = HEAD;
        for level in (0..=self.level).rev() {
            while let Some(next) = self.nodes[cur].next[level] {
                if self.nodes[next].key < key {
                    cur = next;
                } else {
                    break;
                }
            }
            if let Some(next) = self.nodes[cur].next[level] {
                if self.nodes[next].key == key {
                    return Some(next);
                }
            }
        }
        None
    }

    fn splice(&mut self, key: Key, value: Value, height: usize) {
        let id = self.nodes.alloc(TowerNode::new(key, value, height));
        if height > self.level {
            self.level = height;
        }
        let mut pred = HEAD;
        for level in (0..=self.level).rev() {
            while let Some(next) = self.nodes[pred].next[level] {
                if self.nodes[next].key < key {
                    pred = next;
                } else {
                    break;
                }
            }
            if level <= height {
                let succ = self.nodes[pred].next[level];
                self.nodes[id].next[level] = succ;
                self.nodes[pred].next[level] = Some(id);
            }
        }
        self.len += 1;
    }
}

impl Default for FrequencySkipList {
    fn default() -> Self {
        FrequencySkipList::new()
    }
}

impl SkipList for FrequencySkipList {
    type Node<'a> = TowerNodeRef<'a>;

    /// Insert without a frequency hint, falling back to the randomized policy.
    fn put(&mut self, key: Key, value: Value) -> Option<Value> {
        if let Some(id) = self.find(key) {
            let old = self.nodes[id].value;
            self.nodes[id].value = value;
            return Some(old);
        }
        let height = self.generator.level().min(MAX_HEIGHT);
        self.splice(key, value, height);
        None
    }

    fn get(&mut self, key: Key) -> Option<Value> {
        self.find(key).map(|id| self.nodes[id].value)
    }

    fn contains(&mut self, key: Key) -> bool {
        self.find(key).is_some()
    }

    fn delete(&mut self, key: Key) -> Option<Value> {
        let target = self.find(key)?;
        let mut pred = HEAD;
        for level in (0..=self.level).rev() {
            while let Some(next) = self.nodes[pred].next[level] {
                if self.nodes[next].key < key {
                    pred = next;
                } else {
                    break;
                }
            }
            if self.nodes[pred].next[level] == Some(target) {
                let succ = self.nodes[target].next[level];
                self.nodes[pred].next[level] = succ;
            }
        }
        while self.level > 0 && self.nodes[HEAD].next[self.level].is_none() {
            self.level -= 1;
        }
        let old = self.nodes[target].value;
        self.nodes.release(target);
        self.len -= 1;
        Some(old)
    }

    fn head(&self) -> TowerNodeRef<'_> {
        TowerNodeRef::new(&self.nodes, HEAD)
    }

    fn max_stats(&self) -> (usize, usize) {
        (self.len, self.level)
    }
}
