//! Doubly linked list over a slot arena.
//!
//! Each node occupies one slot. Its value is persisted as `data/<slot>` and
//! its links as `metadata/<slot>`:
//!
//! ```text
//!   data/0      -> "a"          metadata/0 -> { previous: null, next: 2 }
//!   data/2      -> "b"          metadata/2 -> { previous: 0,    next: null }
//! ```
//!
//! Splicing a node in or out rewrites the links of the node and of its
//! neighbours. A removed node keeps its slot number; re-adding it claims that
//! slot again if it is still free, rewriting both its value and its links.

use std::iter;

use ospace_state::{Subcategory, ValueCodec};
use serde::{Deserialize, Serialize};

use crate::arena::SlotArena;
use crate::artifact::{impl_artifact, ArtifactCore, ArtifactKind, Element, Restore, StoredEntries};
use crate::error::{SpaceError, SpaceResult};
use crate::tracker::{EntryKey, EntryName, EntrySource};

/// Handle to a node in a [`PersistedLinkedList`].
///
/// Handles go stale when their node is removed; using a stale handle fails
/// with `InvalidArgument`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    slot: usize,
    generation: u64,
}

impl NodeId {
    /// The slot the node occupies.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// A node removed from a list, holding its value and its former slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetachedNode<T> {
    value: T,
    slot: usize,
}

impl<T> DetachedNode<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// The slot the node occupied before removal.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Persisted form of a node's links.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Links {
    previous: Option<u64>,
    next: Option<u64>,
}

#[derive(Clone, Debug)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
    generation: u64,
}

#[derive(Debug)]
pub struct PersistedLinkedList<T: Element> {
    core: ArtifactCore,
    nodes: SlotArena<Node<T>>,
    first: Option<usize>,
    last: Option<usize>,
    generation: u64,
}

impl<T: Element> PersistedLinkedList<T> {
    pub(crate) fn new(core: ArtifactCore) -> Self {
        Self {
            core,
            nodes: SlotArena::new(),
            first: None,
            last: None,
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn handle(&self, slot: usize) -> Option<NodeId> {
        self.nodes.get(slot).map(|node| NodeId {
            slot,
            generation: node.generation,
        })
    }

    fn resolve(&self, id: NodeId) -> SpaceResult<&Node<T>> {
        match self.nodes.get(id.slot) {
            Some(node) if node.generation == id.generation => Ok(node),
            _ => Err(SpaceError::invalid(format!(
                "node {} is not in {}",
                id.slot, self.core.id
            ))),
        }
    }

    fn mark_node(&mut self, slot: usize) {
        self.core.tracker.mark(EntryKey::data(slot));
        self.core.tracker.mark(EntryKey::links(slot));
    }

    fn mark_links(&mut self, slot: usize) {
        self.core.tracker.mark(EntryKey::links(slot));
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn first(&self) -> Option<NodeId> {
        self.first.and_then(|slot| self.handle(slot))
    }

    pub fn last(&self) -> Option<NodeId> {
        self.last.and_then(|slot| self.handle(slot))
    }

    pub fn next(&self, id: NodeId) -> SpaceResult<Option<NodeId>> {
        let node = self.resolve(id)?;
        Ok(node.next.and_then(|slot| self.handle(slot)))
    }

    pub fn previous(&self, id: NodeId) -> SpaceResult<Option<NodeId>> {
        let node = self.resolve(id)?;
        Ok(node.prev.and_then(|slot| self.handle(slot)))
    }

    pub fn value(&self, id: NodeId) -> SpaceResult<&T> {
        Ok(&self.resolve(id)?.value)
    }

    /// Replace a node's value. Only `data/<slot>` is rewritten.
    pub fn set_value(&mut self, id: NodeId, value: T) -> SpaceResult<()> {
        self.resolve(id)?;
        if let Some(node) = self.nodes.get_mut(id.slot) {
            node.value = value;
        }
        self.core.tracker.mark(EntryKey::data(id.slot));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    fn allocate(&mut self, value: T, preferred: Option<usize>) -> usize {
        self.generation += 1;
        let node = Node {
            value,
            prev: None,
            next: None,
            generation: self.generation,
        };
        match preferred {
            Some(slot) => match self.nodes.claim(slot, node) {
                Ok(()) => slot,
                Err(node) => self.nodes.insert(node),
            },
            None => self.nodes.insert(node),
        }
    }

    /// Splice the unlinked node at `slot` between `prev` and `next`.
    fn link(&mut self, slot: usize, prev: Option<usize>, next: Option<usize>) -> NodeId {
        if let Some(node) = self.nodes.get_mut(slot) {
            node.prev = prev;
            node.next = next;
        }
        self.mark_node(slot);

        match prev.and_then(|p| self.nodes.get_mut(p).map(|n| (p, n))) {
            Some((p, node)) => {
                node.next = Some(slot);
                self.mark_links(p);
            }
            None => self.first = Some(slot),
        }
        match next.and_then(|n| self.nodes.get_mut(n).map(|node| (n, node))) {
            Some((n, node)) => {
                node.prev = Some(slot);
                self.mark_links(n);
            }
            None => self.last = Some(slot),
        }

        self.handle(slot).unwrap_or(NodeId {
            slot,
            generation: self.generation,
        })
    }

    fn insert_first(&mut self, value: T, preferred: Option<usize>) -> NodeId {
        let slot = self.allocate(value, preferred);
        self.link(slot, None, self.first)
    }

    fn insert_last(&mut self, value: T, preferred: Option<usize>) -> NodeId {
        let slot = self.allocate(value, preferred);
        self.link(slot, self.last, None)
    }

    fn insert_after(&mut self, anchor: NodeId, value: T, preferred: Option<usize>) -> SpaceResult<NodeId> {
        let next = self.resolve(anchor)?.next;
        let slot = self.allocate(value, preferred);
        Ok(self.link(slot, Some(anchor.slot), next))
    }

    fn insert_before(&mut self, anchor: NodeId, value: T, preferred: Option<usize>) -> SpaceResult<NodeId> {
        let prev = self.resolve(anchor)?.prev;
        let slot = self.allocate(value, preferred);
        Ok(self.link(slot, prev, Some(anchor.slot)))
    }

    /// Append a value. Same as [`add_last`](Self::add_last).
    pub fn add(&mut self, value: T) -> NodeId {
        self.add_last(value)
    }

    pub fn add_first(&mut self, value: T) -> NodeId {
        self.insert_first(value, None)
    }

    pub fn add_last(&mut self, value: T) -> NodeId {
        self.insert_last(value, None)
    }

    pub fn add_after(&mut self, anchor: NodeId, value: T) -> SpaceResult<NodeId> {
        self.insert_after(anchor, value, None)
    }

    pub fn add_before(&mut self, anchor: NodeId, value: T) -> SpaceResult<NodeId> {
        self.insert_before(anchor, value, None)
    }

    /// Re-add a removed node at the front, back in its old slot if free.
    pub fn add_first_node(&mut self, node: DetachedNode<T>) -> NodeId {
        self.insert_first(node.value, Some(node.slot))
    }

    pub fn add_last_node(&mut self, node: DetachedNode<T>) -> NodeId {
        self.insert_last(node.value, Some(node.slot))
    }

    pub fn add_after_node(&mut self, anchor: NodeId, node: DetachedNode<T>) -> SpaceResult<NodeId> {
        self.insert_after(anchor, node.value, Some(node.slot))
    }

    pub fn add_before_node(&mut self, anchor: NodeId, node: DetachedNode<T>) -> SpaceResult<NodeId> {
        self.insert_before(anchor, node.value, Some(node.slot))
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Unlink a node and free its slot.
    pub fn remove(&mut self, id: NodeId) -> SpaceResult<DetachedNode<T>> {
        self.resolve(id)?;
        let node = self
            .nodes
            .remove(id.slot)
            .ok_or_else(|| SpaceError::invalid(format!("node {} is not live", id.slot)))?;

        match node.prev.and_then(|p| self.nodes.get_mut(p).map(|n| (p, n))) {
            Some((p, prev)) => {
                prev.next = node.next;
                self.mark_links(p);
            }
            None => self.first = node.next,
        }
        match node.next.and_then(|n| self.nodes.get_mut(n).map(|next| (n, next))) {
            Some((n, next)) => {
                next.prev = node.prev;
                self.mark_links(n);
            }
            None => self.last = node.prev,
        }
        self.mark_node(id.slot);

        Ok(DetachedNode {
            value: node.value,
            slot: id.slot,
        })
    }

    pub fn remove_first(&mut self) -> SpaceResult<T> {
        let first = self.first().ok_or_else(|| SpaceError::empty(&self.core.id))?;
        Ok(self.remove(first)?.into_value())
    }

    pub fn remove_last(&mut self) -> SpaceResult<T> {
        let last = self.last().ok_or_else(|| SpaceError::empty(&self.core.id))?;
        Ok(self.remove(last)?.into_value())
    }

    pub fn clear(&mut self) {
        let slots: Vec<usize> = self.nodes.indices().collect();
        for slot in slots {
            self.mark_node(slot);
        }
        self.nodes.clear();
        self.first = None;
        self.last = None;
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    fn forward(&self) -> impl Iterator<Item = usize> + '_ {
        iter::successors(self.first, move |&slot| {
            self.nodes.get(slot).and_then(|node| node.next)
        })
    }

    fn backward(&self) -> impl Iterator<Item = usize> + '_ {
        iter::successors(self.last, move |&slot| {
            self.nodes.get(slot).and_then(|node| node.prev)
        })
    }

    /// Values from first to last.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.forward()
            .filter_map(move |slot| self.nodes.get(slot).map(|node| &node.value))
    }

    /// Node handles from first to last.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.forward().filter_map(move |slot| self.handle(slot))
    }
}

impl<T: Element + PartialEq> PersistedLinkedList<T> {
    /// The first node holding `value`.
    pub fn find(&self, value: &T) -> Option<NodeId> {
        self.forward()
            .find(|&slot| self.nodes.get(slot).is_some_and(|n| n.value == *value))
            .and_then(|slot| self.handle(slot))
    }

    /// The last node holding `value`.
    pub fn find_last(&self, value: &T) -> Option<NodeId> {
        self.backward()
            .find(|&slot| self.nodes.get(slot).is_some_and(|n| n.value == *value))
            .and_then(|slot| self.handle(slot))
    }

    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    /// Remove the first node holding `value`.
    pub fn remove_value(&mut self, value: &T) -> bool {
        match self.find(value) {
            Some(id) => self.remove(id).is_ok(),
            None => false,
        }
    }
}

impl<T: Element> EntrySource for PersistedLinkedList<T> {
    fn live_keys(&self) -> Vec<EntryKey> {
        self.nodes
            .indices()
            .flat_map(|slot| [EntryKey::data(slot), EntryKey::links(slot)])
            .collect()
    }

    fn encode_entry(&self, key: &EntryKey, codec: ValueCodec) -> SpaceResult<Option<Vec<u8>>> {
        let EntryName::Slot(slot) = key.name else {
            return Ok(None);
        };
        let Some(node) = usize::try_from(slot).ok().and_then(|s| self.nodes.get(s)) else {
            return Ok(None);
        };
        match key.sub {
            Subcategory::Data => self.core.encode(codec, &node.value),
            Subcategory::Metadata => {
                let links = Links {
                    previous: node.prev.map(|p| p as u64),
                    next: node.next.map(|n| n as u64),
                };
                self.core.encode(codec, &links)
            }
            Subcategory::Items => Ok(None),
        }
    }
}

impl<T: Element> Restore for PersistedLinkedList<T> {
    const KIND: ArtifactKind = ArtifactKind::LinkedList;

    fn restore(core: ArtifactCore, stored: &StoredEntries) -> SpaceResult<Self> {
        let values = stored.slots::<T>(Subcategory::Data)?;
        let links: std::collections::BTreeMap<usize, Links> =
            stored.slots::<Links>(Subcategory::Metadata)?.into_iter().collect();
        if links.len() != values.len() {
            return Err(stored.corrupt(format!(
                "{} node values but {} link entries",
                values.len(),
                links.len()
            )));
        }

        let to_slot = |raw: Option<u64>| -> SpaceResult<Option<usize>> {
            raw.map(|s| {
                usize::try_from(s).map_err(|_| stored.corrupt(format!("link {s} out of range")))
            })
            .transpose()
        };

        let mut nodes = Vec::with_capacity(values.len());
        let mut first = None;
        let mut last = None;
        for (generation, (slot, value)) in values.into_iter().enumerate() {
            let link = links
                .get(&slot)
                .ok_or_else(|| stored.corrupt(format!("node {slot} has no links")))?;
            let prev = to_slot(link.previous)?;
            let next = to_slot(link.next)?;
            if prev.is_none() {
                first = Some(slot);
            }
            if next.is_none() {
                last = Some(slot);
            }
            nodes.push((
                slot,
                Node {
                    value,
                    prev,
                    next,
                    generation: generation as u64 + 1,
                },
            ));
        }

        let list = Self {
            core,
            generation: nodes.len() as u64,
            nodes: SlotArena::from_entries(nodes),
            first,
            last,
        };
        if list.forward().take(list.len() + 1).count() != list.len() {
            return Err(stored.corrupt("links do not form a single chain".to_string()));
        }
        Ok(list)
    }
}

impl_artifact!(PersistedLinkedList<T: Element>);
