//! Ordered collections of intervals and the agenda operations over them.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticSink;
use crate::interval::Interval;

/// A list of intervals with agenda-specific operations.
///
/// Insertion order is kept as-is until [`IntervalSet::normalize`] sorts and
/// merges. Equality compares time spans pairwise and ignores labels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a line-oriented agenda document.
    ///
    /// Blank lines and lines starting with `#` are ignored. A line that
    /// fails to parse is reported to `sink` and skipped; the remaining
    /// lines still contribute.
    pub fn parse<S>(text: &str, sink: &mut S) -> Self
    where
        S: DiagnosticSink + ?Sized,
    {
        let mut set = IntervalSet::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match Interval::parse(line) {
                Ok(interval) => set.append(interval),
                Err(e) => sink.skipped(line, &e.reason()),
            }
        }
        set
    }

    /// Add an interval at the end. No ordering or dedup is enforced.
    pub fn append(&mut self, interval: Interval) {
        self.intervals.push(interval);
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    /// Overlaps between intervals of this set and intervals of `other`.
    ///
    /// Every overlapping pair contributes its intersection, in this set's
    /// order then `other`'s order. Each result is labeled `label` when
    /// given, otherwise with the label of the interval from this set.
    pub fn intersect(&self, other: &IntervalSet, label: Option<&str>) -> IntervalSet {
        let mut result = IntervalSet::new();
        for mine in &self.intervals {
            let label = label.unwrap_or(mine.label());
            for theirs in other.intervals.iter().filter(|theirs| mine.overlaps(theirs)) {
                result.append(mine.common(theirs, label));
            }
        }
        result
    }

    /// Sort by begin time and merge overlapping intervals in place.
    ///
    /// Afterwards the set is ordered and no two intervals overlap. Merged
    /// intervals carry the joined labels of their parts.
    pub fn normalize(&mut self) {
        self.intervals.sort_by_key(Interval::begin);

        let mut sorted = std::mem::take(&mut self.intervals).into_iter();
        let Some(mut current) = sorted.next() else {
            return;
        };

        for next in sorted {
            if next.follows(&current) {
                self.intervals.push(current);
                current = next;
            } else {
                // Sorted by begin, so anything not strictly after overlaps.
                current = current.hull(&next, None);
            }
        }
        self.intervals.push(current);
    }

    /// Non-destructive [`IntervalSet::normalize`].
    pub fn normalized(&self) -> IntervalSet {
        let mut copy = self.clone();
        copy.normalize();
        copy
    }

    /// Free periods within `bound` that no interval of this set covers.
    ///
    /// Every gap takes `bound`'s label. Neither this set nor `bound` is
    /// modified, so the same bound can be reused across calls.
    pub fn complement(&self, bound: &Interval) -> IntervalSet {
        let busy = self.normalized();
        let mut free = IntervalSet::new();
        let label = bound.label();
        let mut cursor = bound.begin();

        for interval in &busy.intervals {
            if interval.precedes(bound) {
                continue;
            }
            if interval.follows(bound) {
                break;
            }
            if cursor < interval.begin() {
                free.append(Interval::spanning(cursor, interval.begin(), label.to_string()));
            }
            cursor = cursor.max(interval.end());
        }

        if cursor < bound.end() {
            free.append(Interval::spanning(cursor, bound.end(), label.to_string()));
        }
        free
    }

    /// Intervals beginning on `day`, in stored order.
    pub fn on_day(&self, day: NaiveDate) -> IntervalSet {
        self.intervals
            .iter()
            .filter(|interval| interval.day() == day)
            .cloned()
            .collect()
    }

    /// Sum of all interval durations. Overlaps are counted twice unless
    /// the set is normalized first.
    pub fn total_duration(&self) -> Duration {
        self.intervals
            .iter()
            .fold(Duration::zero(), |total, interval| total + interval.duration())
    }
}

impl PartialEq for IntervalSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .intervals
                .iter()
                .zip(&other.intervals)
                .all(|(mine, theirs)| mine.same_span(theirs))
    }
}

impl Eq for IntervalSet {}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{interval}")?;
        }
        Ok(())
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        IntervalSet {
            intervals: iter.into_iter().collect(),
        }
    }
}

impl Extend<Interval> for IntervalSet {
    fn extend<I: IntoIterator<Item = Interval>>(&mut self, iter: I) {
        self.intervals.extend(iter);
    }
}

impl IntoIterator for IntervalSet {
    type Item = Interval;
    type IntoIter = std::vec::IntoIter<Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.into_iter()
    }
}

impl<'a> IntoIterator for &'a IntervalSet {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}
