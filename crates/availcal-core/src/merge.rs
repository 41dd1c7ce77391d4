//! Merging booked days from many sources.

use std::collections::BTreeSet;

use crate::time::BookedDay;

/// Accumulates booked days from any number of sources.
///
/// Duplicates collapse and insertion order does not matter: merging the same
/// per-source lists in any order produces the same output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayMerger {
    days: BTreeSet<BookedDay>,
}

impl DayMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the days of one source, returning how many were new.
    pub fn merge<I>(&mut self, days: I) -> usize
    where
        I: IntoIterator<Item = BookedDay>,
    {
        let before = self.days.len();
        self.days.extend(days);
        self.days.len() - before
    }

    /// Adds several per-source lists at once.
    pub fn merge_all<I, L>(&mut self, lists: I) -> usize
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = BookedDay>,
    {
        lists.into_iter().map(|days| self.merge(days)).sum()
    }

    pub fn contains(&self, day: &BookedDay) -> bool {
        self.days.contains(day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Emits the merged days in ascending order.
    pub fn finish(self) -> Vec<BookedDay> {
        self.days.into_iter().collect()
    }

    pub fn into_set(self) -> BTreeSet<BookedDay> {
        self.days
    }
}

impl Extend<BookedDay> for DayMerger {
    fn extend<T: IntoIterator<Item = BookedDay>>(&mut self, iter: T) {
        self.merge(iter);
    }
}

impl FromIterator<BookedDay> for DayMerger {
    fn from_iter<T: IntoIterator<Item = BookedDay>>(iter: T) -> Self {
        let mut merger = Self::new();
        merger.merge(iter);
        merger
    }
}
