//! Slot arena: dense, index-addressed storage with a free list.
//!
//! ```text
//!   slots:  [ Some(a) | None | Some(c) | None ]
//!   free:   [ 3, 1 ]            pop() -> 1 is reused next
//! ```
//!
//! Freed slots are always reused before the dense area grows. Reuse is LIFO:
//! the most recently freed index comes back first. The arena is the physical
//! layout persisted by dictionaries, sets and linked lists, so the reuse order
//! is observable in the keys a save writes.

/// Dense slot storage with free-list reuse.
#[derive(Clone, Debug)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Rebuild an arena from live `(index, value)` pairs, e.g. after a load.
    ///
    /// Gaps below the highest index become free slots, queued so that the
    /// lowest gap is reused first.
    pub fn from_entries(entries: impl IntoIterator<Item = (usize, T)>) -> Self {
        let mut slots: Vec<Option<T>> = Vec::new();
        let mut len = 0;
        for (index, value) in entries {
            if index >= slots.len() {
                slots.resize_with(index + 1, || None);
            }
            if slots[index].replace(value).is_none() {
                len += 1;
            }
        }
        let free = (0..slots.len())
            .rev()
            .filter(|&i| slots[i].is_none())
            .collect();
        Self { slots, free, len }
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot is live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the dense area (live plus free slots).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The index the next [`insert`](Self::insert) will use.
    pub fn next_index(&self) -> usize {
        self.free.last().copied().unwrap_or(self.slots.len())
    }

    /// Store a value, reusing a free slot if any, and return its index.
    pub fn insert(&mut self, value: T) -> usize {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };
        self.slots[index] = Some(value);
        self.len += 1;
        index
    }

    /// Store a value at a specific free slot.
    ///
    /// Returns the value back if `index` is live or beyond the dense area.
    pub fn claim(&mut self, index: usize, value: T) -> Result<(), T> {
        let Some(position) = self.free.iter().rposition(|&i| i == index) else {
            return Err(value);
        };
        self.free.remove(position);
        self.slots[index] = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Free a slot and return its value, or `None` if it was not live.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let value = self.slots.get_mut(index)?.take()?;
        self.free.push(index);
        self.len -= 1;
        Some(value)
    }

    /// Returns `true` if `index` holds a live value.
    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Read a live slot.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.as_ref()
    }

    /// Mutate a live slot.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Live `(index, value)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (i, v)))
    }

    /// Live indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter().map(|(i, _)| i)
    }

    /// Drop every value and reset the dense area to empty.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
