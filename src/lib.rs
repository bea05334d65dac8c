//! A family of ordered key-value maps built on skip lists, differing only in
//! how tower heights are assigned.
//!
//! A skip list stores its entries in a sorted linked list and stacks extra
//! forward links ("towers") on some nodes so that searches can skip ahead:
//!
//! ```text
//! level 2 : head ----------------------------> [9] -------->
//! level 1 : head ----------> [4] ------------> [9] -------->
//! level 0 : head -> [2] ---> [4] -> [6] -----> [9] -> [12] ->
//! ```
//!
//! The higher a node's tower, the earlier searches reach it. Every variant in
//! this crate shares that structure and the [`SkipList`] contract; they differ
//! in the policy that decides how tall each tower should be:
//!
//! - [`RandomSkipList`] draws heights from a geometric distribution at insert
//!   time, the classic balancing that needs no knowledge of the workload.
//! - [`FrequencySkipList`] accepts a predicted access count per key and sizes
//!   the tower for it up front, falling back to the random policy when no
//!   prediction is available.
//! - [`AdaptiveSkipList`] starts every key at the bottom and adjusts tower
//!   heights online from observed hit counters, converging towards the access
//!   distribution without any prior knowledge.
//! - [`SpanSkipList`] promotes a node whenever a traversal walks a long enough
//!   span at one level, a deterministic policy with no counters at all.
//!
//! The [`analysis`] module measures the structures the policies produce: exact
//! per-search hop counts, expected cost under a known access distribution,
//! structural validation, and ASCII rendering.
//!
//! # Examples
//!
//! ```
//! use adaptive_skiplist::{AdaptiveSkipList, SkipList, analysis};
//!
//! let mut list = AdaptiveSkipList::with_seed(1.0, 42)?;
//! for key in 0..100 {
//!     list.put(key, f64::from(key as u8));
//! }
//! // A skewed workload reshapes the towers.
//! for _ in 0..1_000 {
//!     list.get(7);
//! }
//! assert_eq!(list.get(7), Some(7.0));
//! analysis::check_structure(&mut list)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adaptive;
pub mod analysis;
pub mod frequency;
pub mod level_generator;
pub mod map;
pub mod node;
pub mod random;
pub mod span;

pub use crate::adaptive::AdaptiveSkipList;
pub use crate::analysis::{SearchCost, StructureError};
pub use crate::frequency::FrequencySkipList;
pub use crate::map::{Key, NodeView, SkipList, Value};
pub use crate::node::MAX_HEIGHT;
pub use crate::random::RandomSkipList;
pub use crate::span::SpanSkipList;
