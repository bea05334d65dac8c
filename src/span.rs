//! Skip list promoting nodes by traversal hop counts.
//!
//! Height here is a proxy for "frequency of being hopped over", not
//! "frequency of exact match": whenever an ordinary descent walks a span of
//! nodes at one level, the node it lands on is lifted one level so the next
//! traversal can skip the span outright.

use thiserror::Error;

use crate::map::{Key, NodeView, SkipList, Value};
use crate::node::{Arena, HEAD, MAX_HEIGHT, NodeId, SENTINEL_KEY};

#[derive(Error, Debug, PartialEq, Eq)]
/// Errors that can occur when creating a [`SpanSkipList`].
#[non_exhaustive]
pub enum SpanError {
    /// The span threshold must be at least 1.
    #[error("span threshold must be at least 1.")]
    ZeroSpan,
}

#[derive(Clone, Debug)]
struct SpanNode {
    key: Key,
    value: Value,
    height: usize,
    next: [Option<NodeId>; MAX_HEIGHT + 1],
    deleted: bool,
}

impl SpanNode {
    fn new(key: Key, value: Value, height: usize) -> Self {
        SpanNode {
            key,
            value,
            height,
            next: [None; MAX_HEIGHT + 1],
            deleted: false,
        }
    }
}

/// Skip list with traversal-triggered promotion.
///
/// New keys always start at level 0 and are promoted only by later
/// traversals; there is no randomization anywhere, so two lists fed the same
/// operation sequence end up structurally identical. Deletion marks a
/// tombstone.
///
/// # Examples
///
/// ```
/// use adaptive_skiplist::{SkipList, SpanSkipList};
///
/// let mut list = SpanSkipList::new(3)?;
/// list.put(1, 10.0);
/// list.put(2, 20.0);
/// assert_eq!(list.get(2), Some(20.0));
/// assert_eq!(list.delete(1), Some(10.0));
/// # Ok::<(), adaptive_skiplist::span::SpanError>(())
/// ```
#[derive(Debug)]
pub struct SpanSkipList {
    nodes: Arena<SpanNode>,
    level: usize,
    len: usize,
    /// Hops walked at one level before the node just reached is promoted.
    span: usize,
}

impl SpanSkipList {
    /// Create an empty list promoting after `span` hops at one level.
    ///
    /// # Errors
    ///
    /// `span` must be at least 1; a zero span would promote on every hop and
    /// degenerate traversal.
    pub fn new(span: usize) -> Result<Self, SpanError> {
        if span == 0 {
            return Err(SpanError::ZeroSpan);
        }
        Ok(SpanSkipList {
            nodes: Arena::with_head(SpanNode::new(SENTINEL_KEY, 0.0, MAX_HEIGHT)),
            level: 0,
            len: 0,
            span,
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
    pub fn iter(&self) -> impl Iterator<Item = (Key, Value)> + '_ {
        std::iter::successors(self.nodes[HEAD].next[0], |&id| self.nodes[id].next[0])
            .filter(|&id| !self.nodes[id].deleted)
            .map(|id| (self.nodes[id].key, self.nodes[id].value))
    }

    /// Descend towards `key`, promoting along the way.
    ///
    /// Counts hops since the last promotion at the current level; once the
    /// count reaches the span threshold, the node just reached is promoted one
    /// level (if not already above the scan level) by linking it in after the
    /// station node the descent came through, which then becomes the new
    /// station. The counter resets on every promotion and on every level
    /// descent.
    ///
    /// Returns the matching node and `true`, or the level-0 predecessor and
    /// `false`.
    fn travel(&mut self, key: Key) -> (NodeId, bool) {
        let mut curr = HEAD;
        let mut station = HEAD;
        let mut hops = 0;
        for level in (0..=self.level).rev() {
            loop {
                let Some(next) = self.nodes[curr].next[level] else {
                    break;
                };
                if self.nodes[next].key >= key {
                    break;
                }
                curr = next;
                hops += 1;
                if hops >= self.span && level < MAX_HEIGHT {
                    if self.nodes[curr].height == level {
                        self.promote(curr, station);
                        station = curr;
                        if level == self.level && self.level < MAX_HEIGHT {
                            self.level += 1;
                        }
                    }
                    hops = 0;
                }
            }
            if let Some(next) = self.nodes[curr].next[level] {
                if self.nodes[next].key == key {
                    return (next, true);
                }
            }
            station = curr;
            hops = 0;
        }
        (curr, false)
    }

    /// Lift `id` one level, linking it in after its recorded station.
    fn promote(&mut self, id: NodeId, station: NodeId) {
        let target = self.nodes[id].height + 1;
        if id == station || target > self.nodes[station].height || target > MAX_HEIGHT {
            return;
        }
        let succ = self.nodes[station].next[target];
        self.nodes[id].next[target] = succ;
        self.nodes[id].height = target;
        self.nodes[station].next[target] = Some(id);
    }
}

impl SkipList for SpanSkipList {
    type Node<'a> = SpanNodeRef<'a>;

    fn put(&mut self, key: Key, value: Value) -> Option<Value> {
        let (id, found) = self.travel(key);
        if found {
            let node = &mut self.nodes[id];
            let old = if node.deleted { None } else { Some(node.value) };
            node.deleted = false;
            node.value = value;
            if old.is_none() {
                self.len += 1;
            }
            return old;
        }
        // New keys enter at level 0 and earn height through traversal.
        let new_id = self.nodes.alloc(SpanNode::new(key, value, 0));
        let succ = self.nodes[id].next[0];
        self.nodes[new_id].next[0] = succ;
        self.nodes[id].next[0] = Some(new_id);
        self.len += 1;
        None
    }

    fn get(&mut self, key: Key) -> Option<Value> {
        let (id, found) = self.travel(key);
        if !found || self.nodes[id].deleted {
            return None;
        }
        Some(self.nodes[id].value)
    }

    fn contains(&mut self, key: Key) -> bool {
        let (id, found) = self.travel(key);
        found && !self.nodes[id].deleted
    }

    fn delete(&mut self, key: Key) -> Option<Value> {
        let (id, found) = self.travel(key);
        if !found || self.nodes[id].deleted {
            return None;
        }
        self.nodes[id].deleted = true;
        self.len -= 1;
        Some(self.nodes[id].value)
    }

    fn head(&self) -> SpanNodeRef<'_> {
        SpanNodeRef {
            nodes: &self.nodes,
            id: HEAD,
        }
    }

    fn max_stats(&self) -> (usize, usize) {
        (self.len, self.level)
    }
}

/// Read-only view over a span node. Tombstones stay visible so structural
/// checks cover them.
#[derive(Clone, Copy)]
pub struct SpanNodeRef<'a> {
    nodes: &'a Arena<SpanNode>,
    id: NodeId,
}

impl NodeView for SpanNodeRef<'_> {
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
        self.nodes[self.id].height
    }

    fn next_at(&self, level: usize) -> Option<Self> {
        let node = &self.nodes[self.id];
        if level > node.height {
            return None;
        }
        node.next[level].map(|id| SpanNodeRef {
            nodes: self.nodes,
            id,
        })
    }
}
