use std::collections::VecDeque;

use ospace_state::{Subcategory, ValueCodec};

use crate::artifact::{impl_artifact, ArtifactCore, ArtifactKind, Element, Restore, StoredEntries};
use crate::error::{SpaceError, SpaceResult};
use crate::tracker::{EntryKey, EntryName, EntrySource};

const HEAD: &str = "head";
const TAIL: &str = "tail";

/// FIFO queue over absolute positions.
///
/// The element at the front lives at `items/<head>`, the next at
/// `items/<head+1>`, and so on up to `tail` (exclusive). Enqueue writes
/// `items/<tail>` and advances `tail`; dequeue deletes `items/<head>` and
/// advances `head`. Both cursors are metadata entries written on creation and
/// tracked independently.
#[derive(Debug)]
pub struct PersistedQueue<T: Element> {
    core: ArtifactCore,
    head: u64,
    values: VecDeque<T>,
}

impl<T: Element> PersistedQueue<T> {
    pub(crate) fn new(mut core: ArtifactCore) -> Self {
        core.tracker.mark_metadata(HEAD);
        core.tracker.mark_metadata(TAIL);
        Self {
            core,
            head: 0,
            values: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn tail(&self) -> u64 {
        self.head + self.values.len() as u64
    }

    fn mark_position(&mut self, position: u64) {
        self.core.tracker.mark(EntryKey::slot(Subcategory::Items, position));
    }

    /// Append at the back.
    pub fn enqueue(&mut self, value: T) {
        let position = self.tail();
        self.values.push_back(value);
        self.mark_position(position);
        self.core.tracker.mark_metadata(TAIL);
    }

    /// Remove from the front.
    pub fn dequeue(&mut self) -> SpaceResult<T> {
        self.try_dequeue()
            .ok_or_else(|| SpaceError::empty(&self.core.id))
    }

    /// Remove from the front, or `None` when empty.
    pub fn try_dequeue(&mut self) -> Option<T> {
        let value = self.values.pop_front()?;
        let position = self.head;
        self.head += 1;
        self.mark_position(position);
        self.core.tracker.mark_metadata(HEAD);
        Some(value)
    }

    /// The front element without removing it.
    pub fn peek(&self) -> SpaceResult<&T> {
        self.values
            .front()
            .ok_or_else(|| SpaceError::empty(&self.core.id))
    }

    /// Remove every element. The cursors keep counting from where they were.
    pub fn clear(&mut self) {
        if self.values.is_empty() {
            return;
        }
        for position in self.head..self.tail() {
            self.mark_position(position);
        }
        self.head = self.tail();
        self.values.clear();
        self.core.tracker.mark_metadata(HEAD);
    }

    /// Iterate front to back.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.values.iter()
    }
}

impl<T: Element + PartialEq> PersistedQueue<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.values.contains(value)
    }
}

impl<T: Element> EntrySource for PersistedQueue<T> {
    fn live_keys(&self) -> Vec<EntryKey> {
        let mut keys: Vec<EntryKey> = (self.head..self.tail())
            .map(|p| EntryKey::slot(Subcategory::Items, p))
            .collect();
        keys.push(EntryKey::metadata(HEAD));
        keys.push(EntryKey::metadata(TAIL));
        keys
    }

    fn encode_entry(&self, key: &EntryKey, codec: ValueCodec) -> SpaceResult<Option<Vec<u8>>> {
        match (&key.sub, &key.name) {
            (Subcategory::Items, EntryName::Slot(position)) => {
                if *position < self.head {
                    return Ok(None);
                }
                match self.values.get((*position - self.head) as usize) {
                    Some(value) => self.core.encode(codec, value),
                    None => Ok(None),
                }
            }
            (Subcategory::Metadata, EntryName::Named(name)) if name == HEAD => {
                self.core.encode(codec, &self.head)
            }
            (Subcategory::Metadata, EntryName::Named(name)) if name == TAIL => {
                self.core.encode(codec, &self.tail())
            }
            _ => Ok(None),
        }
    }
}

impl<T: Element> Restore for PersistedQueue<T> {
    const KIND: ArtifactKind = ArtifactKind::Queue;

    fn restore(core: ArtifactCore, stored: &StoredEntries) -> SpaceResult<Self> {
        let head: u64 = stored.require_metadata(HEAD)?;
        let tail: u64 = stored.require_metadata(TAIL)?;
        if tail < head {
            return Err(stored.corrupt(format!("queue tail {tail} before head {head}")));
        }
        let mut values = VecDeque::with_capacity((tail - head) as usize);
        for position in head..tail {
            let value = stored
                .decode(&EntryKey::slot(Subcategory::Items, position))?
                .ok_or_else(|| stored.corrupt(format!("missing queue item {position}")))?;
            values.push_back(value);
        }
        Ok(Self { core, head, values })
    }
}

impl_artifact!(PersistedQueue<T: Element>);
