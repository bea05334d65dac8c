//! Baseline skip list with uniformly randomized tower heights.

use crate::level_generator::{Geometric, LevelGenerator};
use crate::map::{Key, NodeView, SkipList, Value};
use crate::node::{Arena, HEAD, MAX_HEIGHT, NodeId, TowerNode, TowerNodeRef};

/// Probability that a tower extends one level further.
pub(crate) const PROMOTION_P: f64 = 0.5;

/// The classic skip list: tower heights are drawn from a geometric
/// distribution at insert time and never change afterwards.
///
/// # Examples
///
/// ```
/// use adaptive_skiplist::{RandomSkipList, SkipList};
///
/// let mut list = RandomSkipList::with_seed(7);
/// list.put(1, 10.0);
/// list.put(2, 20.0);
/// assert_eq!(list.get(1), Some(10.0));
/// assert_eq!(list.delete(2), Some(20.0));
/// assert!(!list.contains(2));
/// ```
#[derive(Debug)]
pub struct RandomSkipList {
    nodes: Arena<TowerNode>,
    /// Highest level any live node occupies.
    level: usize,
    len: usize,
    generator: Geometric,
}

impl RandomSkipList {
    /// Create an empty list seeded from system entropy.
    #[must_use]
    pub fn new() -> Self {
        #[expect(clippy::expect_used, reason = "fixed parameters are always valid")]
        let generator =
            Geometric::new(MAX_HEIGHT + 1, PROMOTION_P).expect("fixed parameters are valid");
        RandomSkipList::with_generator(generator)
    }

    /// Create an empty list whose height draws are reproducible from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        #[expect(clippy::expect_used, reason = "fixed parameters are always valid")]
        let generator = Geometric::with_seed(MAX_HEIGHT + 1, PROMOTION_P, seed)
            .expect("fixed parameters are valid");
        RandomSkipList::with_generator(generator)
    }

    fn with_generator(generator: Geometric) -> Self {
        RandomSkipList {
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

    /// Descend from the top level, returning the node holding `key`.
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

    /// Splice a freshly drawn tower into every level it occupies, reusing the
    /// predecessors captured during descent.
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

impl Default for RandomSkipList {
    fn default() -> Self {
        RandomSkipList::new()
    }
}

impl SkipList for RandomSkipList {
    type Node<'a> = TowerNodeRef<'a>;

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

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::RandomSkipList;
    use crate::map::SkipList;

    #[test]
    fn round_trip() {
        let mut list = RandomSkipList::with_seed(1);
        assert_eq!(list.put(5, 50.0), None);
        assert_eq!(list.put(3, 30.0), None);
        assert_eq!(list.put(8, 80.0), None);
        assert_eq!(list.len(), 3);

        assert_eq!(list.get(3), Some(30.0));
        assert_eq!(list.get(4), None);
        assert!(list.contains(8));

        assert_eq!(list.delete(3), Some(30.0));
        assert_eq!(list.delete(3), None);
        assert_eq!(list.get(3), None);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn put_replaces_in_place() {
        let mut list = RandomSkipList::with_seed(2);
        list.put(1, 1.0);
        let (len, level) = list.max_stats();
        assert_eq!(list.put(1, 2.0), Some(1.0));
        assert_eq!(list.max_stats(), (len, level));
        assert_eq!(list.get(1), Some(2.0));
    }

    #[test]
    fn iter_is_sorted() {
        let mut list = RandomSkipList::with_seed(3);
        for key in [9, 2, 7, 4, 1, 8] {
            list.put(key, f64::from(key as i32));
        }
        let keys: Vec<_> = list.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 2, 4, 7, 8, 9]);
    }

    #[test]
    fn level_shrinks_when_emptied() {
        let mut list = RandomSkipList::with_seed(4);
        for key in 0..64 {
            list.put(key, 0.0);
        }
        for key in 0..64 {
            list.delete(key);
        }
        assert!(list.is_empty());
        assert_eq!(list.max_stats(), (0, 0));
    }
}
