//! The shared ordered-map contract implemented by every skip-list variant.
//!
//! The four balancing policies are independent types rather than a hierarchy;
//! only the analysis tooling in [`crate::analysis`] is generic over this
//! contract. Lookup methods take `&mut self` because the adaptive variant
//! lazily synchronizes per-node state and may rebalance on reads.

/// Key type stored by every variant: a signed 64-bit integer, totally ordered
/// and unique per live entry.
pub type Key = i64;

/// Payload type stored alongside each key.
pub type Value = f64;

// ////////////////////////////////////////////////////////////////////////////
// SkipList
// ////////////////////////////////////////////////////////////////////////////

/// Ordered associative container over ([`Key`], [`Value`]) pairs.
///
/// Absence of a key on [`get`][SkipList::get], [`contains`][SkipList::contains]
/// or [`delete`][SkipList::delete] is a normal "not found" result, never an
/// error.
pub trait SkipList {
    /// Read-only view over this list's nodes.
    type Node<'a>: NodeView
    where
        Self: 'a;

    /// Insert the key-value pair, replacing and returning the previous value
    /// if the key is already present.
    fn put(&mut self, key: Key, value: Value) -> Option<Value>;

    /// Look up the value stored under `key`.
    fn get(&mut self, key: Key) -> Option<Value>;

    /// Whether `key` is currently present.
    fn contains(&mut self, key: Key) -> bool;

    /// Remove `key`, returning the value it held.
    ///
    /// Depending on the variant this either physically unlinks the node or
    /// marks it as a tombstone while preserving its access history.
    fn delete(&mut self, key: Key) -> Option<Value>;

    /// A view of the head sentinel, the entry point for read-only traversal.
    ///
    /// The sentinel carries no user key; its reported key is below every valid
    /// key and must never be interpreted as an entry.
    fn head(&self) -> Self::Node<'_>;

    /// `(entry count, maximum occupied level)` for introspection.
    fn max_stats(&self) -> (usize, usize);

    /// Flush any lazily deferred per-node bookkeeping so that views obtained
    /// through [`head`][SkipList::head] are mutually consistent.
    ///
    /// A no-op for every variant except the adaptive one. The analysis tooling
    /// calls this before walking a list.
    fn normalize(&mut self) {}
}

// ////////////////////////////////////////////////////////////////////////////
// NodeView
// ////////////////////////////////////////////////////////////////////////////

/// Uniform read-only view over heterogeneous node layouts.
///
/// Views are cheap handles (an arena reference plus an index) and can be
/// copied freely while the list is not mutated.
pub trait NodeView: Copy {
    /// The node's key.
    fn key(&self) -> Key;

    /// The node's value.
    fn value(&self) -> Value;

    /// The highest level this node occupies.
    ///
    /// Tower contiguity guarantees the node also occupies every lower level.
    /// For the adaptive variant this is relative to the list-wide baseline.
    fn level(&self) -> usize;

    /// The next node at `level`, or `None` at the end of that level's chain
    /// or if this node does not occupy `level`.
    fn next_at(&self, level: usize) -> Option<Self>;
}
