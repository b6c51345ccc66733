/// Counts behind the set predicates.
///
/// `other_len` counts distinct elements of the other sequence; `common`
/// counts how many of those are also in this set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SetComparison {
    pub self_len: usize,
    pub other_len: usize,
    pub common: usize,
}

impl SetComparison {
    pub fn set_equals(&self) -> bool {
        self.common == self.self_len && self.common == self.other_len
    }

    pub fn is_subset(&self) -> bool {
        self.common == self.self_len
    }

    pub fn is_proper_subset(&self) -> bool {
        self.is_subset() && self.other_len > self.self_len
    }

    pub fn is_superset(&self) -> bool {
        self.common == self.other_len
    }

    pub fn is_proper_superset(&self) -> bool {
        self.is_superset() && self.self_len > self.other_len
    }

    pub fn overlaps(&self) -> bool {
        self.common > 0
    }
}
