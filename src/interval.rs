//! Closed column/row intervals.
//!
//! An [`Interval`] is inclusive on both ends. It is the shape used for
//! hidden column regions, hidden row runs, gap runs of a sequence and the
//! position ranges of a coordinate mapping.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// A closed interval `[begin, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub begin: usize,
    pub end: usize,
}

impl Interval {
    /// Creates a new interval, swapping the bounds if given in reverse.
    pub fn new(begin: usize, end: usize) -> Self {
        if begin <= end {
            Self { begin, end }
        } else {
            Self { begin: end, end: begin }
        }
    }

    /// Interval covering a single position.
    pub fn single(pos: usize) -> Self {
        Self { begin: pos, end: pos }
    }

    /// Number of positions covered.
    pub fn width(&self) -> usize {
        self.end - self.begin + 1
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.begin <= pos && pos <= self.end
    }

    /// True when the two intervals share at least one position.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.begin <= other.end && other.begin <= self.end
    }

    /// Smallest interval covering both.
    pub fn union(&self, other: &Interval) -> Interval {
        Interval {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
        }
    }

    /// Shared positions, if any.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let begin = self.begin.max(other.begin);
        let end = self.end.min(other.end);
        (begin <= end).then_some(Interval { begin, end })
    }

    /// Iterates over every position in the interval.
    pub fn positions(&self) -> RangeInclusive<usize> {
        self.begin..=self.end
    }
}

impl From<(usize, usize)> for Interval {
    fn from((begin, end): (usize, usize)) -> Self {
        Interval::new(begin, end)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.begin, self.end)
    }
}
