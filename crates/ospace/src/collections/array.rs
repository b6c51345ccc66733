use ospace_state::{Subcategory, ValueCodec};

use crate::artifact::{impl_artifact, ArtifactCore, ArtifactKind, Element, Restore, StoredEntries};
use crate::error::{SpaceError, SpaceResult};
use crate::tracker::{EntryKey, EntryName, EntrySource};

const LENGTH: &str = "length";

/// Fixed-length, slot-addressed storage. Slot `i` is persisted as
/// `items/i`; the length as `metadata/length`.
#[derive(Debug)]
pub struct PersistedArray<T: Element> {
    core: ArtifactCore,
    values: Vec<T>,
}

impl<T: Element> PersistedArray<T> {
    pub(crate) fn new(mut core: ArtifactCore, values: Vec<T>) -> Self {
        core.tracker.mark_items(0..values.len());
        core.tracker.mark_metadata(LENGTH);
        Self { core, values }
    }

    /// The fixed length given at creation.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for a zero-length array.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check(&self, index: usize) -> SpaceResult<()> {
        if index >= self.values.len() {
            return Err(SpaceError::out_of_range(
                &self.core.id,
                "index",
                format!("{index} not in [0, {})", self.values.len()),
            ));
        }
        Ok(())
    }

    /// Read slot `index`.
    pub fn get(&self, index: usize) -> SpaceResult<&T> {
        self.check(index)?;
        Ok(&self.values[index])
    }

    /// Overwrite slot `index`.
    pub fn set(&mut self, index: usize, value: T) -> SpaceResult<()> {
        self.check(index)?;
        self.values[index] = value;
        self.core.tracker.mark_item(index);
        Ok(())
    }

    /// Iterate over all slots in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// View the slots as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }
}

impl<T: Element> EntrySource for PersistedArray<T> {
    fn live_keys(&self) -> Vec<EntryKey> {
        let mut keys: Vec<EntryKey> = (0..self.values.len()).map(EntryKey::item).collect();
        keys.push(EntryKey::metadata(LENGTH));
        keys
    }

    fn encode_entry(&self, key: &EntryKey, codec: ValueCodec) -> SpaceResult<Option<Vec<u8>>> {
        match (&key.sub, &key.name) {
            (Subcategory::Items, EntryName::Slot(slot)) => match self.values.get(*slot as usize) {
                Some(value) => self.core.encode(codec, value),
                None => Ok(None),
            },
            (Subcategory::Metadata, EntryName::Named(name)) if name == LENGTH => {
                self.core.encode(codec, &(self.values.len() as u64))
            }
            _ => Ok(None),
        }
    }
}

impl<T: Element> Restore for PersistedArray<T> {
    const KIND: ArtifactKind = ArtifactKind::Array;

    fn restore(core: ArtifactCore, stored: &StoredEntries) -> SpaceResult<Self> {
        let length: u64 = stored.require_metadata(LENGTH)?;
        let values: Vec<T> = stored.dense(Subcategory::Items)?;
        if values.len() as u64 != length {
            return Err(stored.corrupt(format!(
                "array length {length} but {} slots",
                values.len()
            )));
        }
        Ok(Self { core, values })
    }
}

impl_artifact!(PersistedArray<T: Element>);

#[cfg(test)]
mod tests {
    use super::*;

    fn array(n: usize) -> PersistedArray<i32> {
        PersistedArray::new(ArtifactCore::new("arr", true), vec![0; n])
    }

    #[test]
    fn get_set_within_bounds() {
        let mut a = array(3);
        a.set(1, 42).unwrap();
        assert_eq!(*a.get(1).unwrap(), 42);
        assert_eq!(a.as_slice(), &[0, 42, 0]);
    }

    #[test]
    fn out_of_bounds_is_out_of_range() {
        let mut a = array(2);
        assert!(matches!(a.get(2), Err(SpaceError::OutOfRange { .. })));
        assert!(matches!(a.set(5, 1), Err(SpaceError::OutOfRange { .. })));
        assert_eq!(a.as_slice(), &[0, 0]);
    }

    #[test]
    fn live_keys_cover_slots_and_length() {
        let a = array(2);
        assert_eq!(
            a.live_keys(),
            vec![EntryKey::item(0), EntryKey::item(1), EntryKey::metadata(LENGTH)]
        );
        assert_eq!(
            a.encode_entry(&EntryKey::metadata(LENGTH), ValueCodec::Json)
                .unwrap(),
            Some(b"2".to_vec())
        );
    }
}
