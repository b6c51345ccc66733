use ospace_state::ValueCodec;

use crate::artifact::{impl_artifact, ArtifactCore, ArtifactKind, Element, Restore, StoredEntries};
use crate::error::SpaceResult;
use crate::tracker::{EntryKey, EntrySource};

const VALUE_KEY: &str = "value";

fn value_key() -> EntryKey {
    EntryKey::named(ospace_state::Subcategory::Items, VALUE_KEY)
}

/// A single persisted scalar, stored as `items/value`.
#[derive(Debug)]
pub struct PersistedValue<T: Element> {
    core: ArtifactCore,
    value: T,
}

impl<T: Element> PersistedValue<T> {
    pub(crate) fn new(mut core: ArtifactCore, value: T) -> Self {
        core.tracker.mark(value_key());
        Self { core, value }
    }

    /// The current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.core.tracker.mark(value_key());
    }

    /// Replace the value and return the previous one.
    pub fn replace(&mut self, value: T) -> T {
        self.core.tracker.mark(value_key());
        std::mem::replace(&mut self.value, value)
    }

    /// Modify the value in place.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.value);
        self.core.tracker.mark(value_key());
    }
}

impl<T: Element> EntrySource for PersistedValue<T> {
    fn live_keys(&self) -> Vec<EntryKey> {
        vec![value_key()]
    }

    fn encode_entry(&self, key: &EntryKey, codec: ValueCodec) -> SpaceResult<Option<Vec<u8>>> {
        if *key == value_key() {
            self.core.encode(codec, &self.value)
        } else {
            Ok(None)
        }
    }
}

impl<T: Element> Restore for PersistedValue<T> {
    const KIND: ArtifactKind = ArtifactKind::Value;

    fn restore(core: ArtifactCore, stored: &StoredEntries) -> SpaceResult<Self> {
        let value = stored
            .decode(&value_key())?
            .ok_or_else(|| stored.corrupt("missing value entry".into()))?;
        Ok(Self { core, value })
    }
}

impl_artifact!(PersistedValue<T: Element>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Artifact;

    #[test]
    fn set_and_update_mark_value_dirty() {
        let mut v = PersistedValue::new(ArtifactCore::new("v", true), 1u32);
        assert!(v.has_pending_changes());
        assert_eq!(*v.get(), 1);

        v.set(5);
        assert_eq!(v.replace(6), 5);
        v.update(|x| *x += 1);
        assert_eq!(*v.get(), 7);
        assert_eq!(v.kind(), ArtifactKind::Value);
    }

    #[test]
    fn only_the_value_key_is_live() {
        let v = PersistedValue::new(ArtifactCore::new("v", true), "hi".to_string());
        assert_eq!(v.live_keys(), vec![value_key()]);
        assert_eq!(
            v.encode_entry(&EntryKey::item(0), ValueCodec::Json).unwrap(),
            None
        );
    }
}
