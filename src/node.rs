//! Arena-backed node storage shared by the skip-list variants.
//!
//! Nodes are entries in a per-list arena indexed by stable handles, so that
//! multi-level relinking is plain index surgery with no ownership cycles. Each
//! node's forward-pointer array has its full capacity allocated once; a
//! separate active-height integer marks how much of it is in use.

use crate::map::{Key, NodeView, Value};

/// Hard cap on tower height. Height draws and promotions are clamped here,
/// even though the geometric height distribution makes it unreachable in
/// practice.
pub const MAX_HEIGHT: usize = 32;

/// Stable handle into a list's arena.
pub(crate) type NodeId = usize;

/// The head sentinel always lives in the first arena slot.
pub(crate) const HEAD: NodeId = 0;

/// Placeholder key for the head sentinel. It is below every valid key and is
/// never compared during traversal.
pub(crate) const SENTINEL_KEY: Key = Key::MIN;

// ////////////////////////////////////////////////////////////////////////////
// Arena
// ////////////////////////////////////////////////////////////////////////////

/// Vec-backed arena with a free list.
///
/// Slot 0 is the head sentinel, created once and never released. Variants
/// that delete by tombstone simply never release slots.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<T>,
    free: Vec<NodeId>,
}

impl<T> Arena<T> {
    pub fn with_head(head: T) -> Self {
        Arena {
            slots: vec![head],
            free: Vec::new(),
        }
    }

    pub fn alloc(&mut self, node: T) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = node;
                id
            }
            None => {
                self.slots.push(node);
                self.slots.len() - 1
            }
        }
    }

    /// Return a slot to the free list. The caller must have unlinked the node
    /// from every level first.
    pub fn release(&mut self, id: NodeId) {
        debug_assert_ne!(id, HEAD, "the head sentinel is never released");
        self.free.push(id);
    }
}

impl<T> std::ops::Index<NodeId> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: NodeId) -> &T {
        &self.slots[id]
    }
}

impl<T> std::ops::IndexMut<NodeId> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.slots[id]
    }
}

// ////////////////////////////////////////////////////////////////////////////
// TowerNode
// ////////////////////////////////////////////////////////////////////////////

/// Node layout shared by the random and frequency-predicted variants: a key,
/// a value and a tower of forward handles.
#[derive(Clone, Debug)]
pub(crate) struct TowerNode {
    pub key: Key,
    pub value: Value,
    /// Highest active level; `next[..=height]` is in use.
    pub height: usize,
    pub next: [Option<NodeId>; MAX_HEIGHT + 1],
}

impl TowerNode {
    pub fn new(key: Key, value: Value, height: usize) -> Self {
        TowerNode {
            key,
            value,
            height,
            next: [None; MAX_HEIGHT + 1],
        }
    }

    pub fn head() -> Self {
        TowerNode::new(SENTINEL_KEY, 0.0, MAX_HEIGHT)
    }
}

/// Read-only view over a [`TowerNode`].
#[derive(Clone, Copy)]
pub struct TowerNodeRef<'a> {
    nodes: &'a Arena<TowerNode>,
    id: NodeId,
}

impl<'a> TowerNodeRef<'a> {
    pub(crate) fn new(nodes: &'a Arena<TowerNode>, id: NodeId) -> Self {
        TowerNodeRef { nodes, id }
    }
}

impl NodeView for TowerNodeRef<'_> {
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
        node.next[level].map(|id| TowerNodeRef {
            nodes: self.nodes,
            id,
        })
    }
}
