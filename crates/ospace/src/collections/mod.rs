//! The ten artifact kinds.
//!
//! | Kind | Layout |
//! |------|--------|
//! | [`PersistedValue`] | `items/value` |
//! | [`PersistedArray`] | `items/<i>`, `metadata/length` |
//! | [`PersistedList`] | `items/<i>`, `metadata/length` |
//! | [`PersistedStack`] | `items/<i>` (bottom at 0) |
//! | [`PersistedQueue`] | `items/<position>`, `metadata/head`, `metadata/tail` |
//! | [`PersistedDictionary`], [`PersistedSortedDictionary`] | `items/<slot>` -> `(key, value)` |
//! | [`PersistedSet`], [`PersistedSortedSet`] | `items/<slot>` -> element |
//! | [`PersistedLinkedList`] | `data/<slot>` -> value, `metadata/<slot>` -> links |

mod array;
mod compare;
mod dictionary;
mod keyed;
mod linked_list;
mod list;
mod queue;
mod set;
mod sorted_dictionary;
mod sorted_set;
mod stack;
mod value;

pub use array::PersistedArray;
pub use dictionary::PersistedDictionary;
pub use linked_list::{DetachedNode, NodeId, PersistedLinkedList};
pub use list::PersistedList;
pub use queue::PersistedQueue;
pub use set::PersistedSet;
pub use sorted_dictionary::PersistedSortedDictionary;
pub use sorted_set::{PersistedSortedSet, SortedSetView};
pub use stack::PersistedStack;
pub use value::PersistedValue;
