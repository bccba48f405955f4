//! Step-function-by-year container for salary and bonus history
//!
//! The value effective in year Y is the entry with the greatest year <= Y.
//! Entries are keyed by year, so inserting a second entry for the same year
//! replaces the first.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

/// Entries that take effect from a calendar year onward
pub trait YearKeyed {
    fn year(&self) -> i32;
}

/// Ordered map of year -> entry with "latest at or before" lookup
#[derive(Debug, Clone, PartialEq)]
pub struct StepSchedule<T> {
    entries: BTreeMap<i32, T>,
}

impl<T> StepSchedule<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry effective in `year`, if any entry starts at or before it
    pub fn at_or_before(&self, year: i32) -> Option<&T> {
        self.entries.range(..=year).next_back().map(|(_, entry)| entry)
    }

    /// Entries in ascending year order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }
}

impl<T: YearKeyed> StepSchedule<T> {
    /// Insert an entry; returns the entry it replaced for the same year
    pub fn insert(&mut self, entry: T) -> Option<T> {
        self.entries.insert(entry.year(), entry)
    }
}

impl<T> Default for StepSchedule<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: YearKeyed> FromIterator<T> for StepSchedule<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut schedule = Self::new();
        for entry in iter {
            schedule.insert(entry);
        }
        schedule
    }
}

impl<T: YearKeyed> Extend<T> for StepSchedule<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for entry in iter {
            self.insert(entry);
        }
    }
}

impl<T: Serialize> Serialize for StepSchedule<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

impl<'de, T> Deserialize<'de> for StepSchedule<T>
where
    T: Deserialize<'de> + YearKeyed,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScheduleVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for ScheduleVisitor<T>
        where
            T: Deserialize<'de> + YearKeyed,
        {
            type Value = StepSchedule<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of year-keyed entries")
            }

            // Later list entries win for duplicate years
            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut schedule = StepSchedule::new();
                while let Some(entry) = seq.next_element::<T>()? {
                    schedule.insert(entry);
                }
                Ok(schedule)
            }
        }

        deserializer.deserialize_seq(ScheduleVisitor(PhantomData))
    }
}
