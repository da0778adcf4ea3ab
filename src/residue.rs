//! Residue index of a single sequence.
//!
//! Translates between 1-based residue numbers and 0-based columns of the
//! row's own gapped buffer. Lookups never fail: out-of-range input is
//! clamped.

use crate::interval::Interval;
use crate::model::{is_gap, Sequence};

impl Sequence {
    /// Returns the column holding residue number `residue`.
    ///
    /// Residue numbers below `start` give 0. Numbers past `end`, or past the
    /// last residue actually present, give the column after the last residue.
    /// Callers compare against that sentinel, so it is kept as is.
    pub fn find_index(&self, residue: usize) -> usize {
        if residue < self.start() {
            return 0;
        }
        let mut number = self.start();
        let mut last = None;
        for (col, &c) in self.as_bytes().iter().enumerate() {
            if is_gap(c) {
                continue;
            }
            if number > self.end() {
                break;
            }
            if number == residue {
                return col;
            }
            last = Some(col);
            number += 1;
        }
        last.map_or(0, |col| col + 1)
    }

    /// Returns the residue number at or left of `col`.
    ///
    /// Gap columns take the number of the nearest residue to their left;
    /// columns before the first residue give `start - 1`.
    pub fn find_position(&self, col: usize) -> usize {
        let data = self.as_bytes();
        if data.is_empty() {
            return self.start() - 1;
        }
        let col = col.min(data.len() - 1);
        let seen = data[..=col].iter().filter(|&&c| !is_gap(c)).count();
        self.start() + seen - 1
    }

    /// Residue numbers covered by the columns `[first_col, last_col]`, or
    /// `None` when those columns hold only gaps.
    pub fn find_positions(&self, first_col: usize, last_col: usize) -> Option<Interval> {
        let span = Interval::new(first_col, last_col);
        let data = self.as_bytes();
        let first = span.positions().find(|&col| data.get(col).is_some_and(|&c| !is_gap(c)))?;
        let last = span
            .positions()
            .rev()
            .find(|&col| data.get(col).is_some_and(|&c| !is_gap(c)))?;
        Some(Interval::new(self.find_position(first), self.find_position(last)))
    }

    /// Column of every residue, in order.
    pub fn gap_map(&self) -> Vec<usize> {
        self.as_bytes()
            .iter()
            .enumerate()
            .filter(|&(_, &c)| !is_gap(c))
            .map(|(col, _)| col)
            .collect()
    }

    /// Residue number for every column (see [`Sequence::find_position`]).
    pub fn find_position_map(&self) -> Vec<usize> {
        let mut number = self.start() - 1;
        self.as_bytes()
            .iter()
            .map(|&c| {
                if !is_gap(c) {
                    number += 1;
                }
                number
            })
            .collect()
    }

    /// Every maximal run of gap columns.
    pub fn insertions(&self) -> Vec<Interval> {
        let mut runs = Vec::new();
        let mut run_start = None;
        for (col, &c) in self.as_bytes().iter().enumerate() {
            match (is_gap(c), run_start) {
                (true, None) => run_start = Some(col),
                (false, Some(begin)) => {
                    runs.push(Interval::new(begin, col - 1));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(begin) = run_start {
            runs.push(Interval::new(begin, self.len() - 1));
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_map_and_position() {
        let seq = Sequence::new("s", "A-CD-E");
        assert_eq!(seq.gap_map(), vec![0, 2, 3, 5]);
        assert_eq!(seq.find_position(4), 3);
        assert_eq!(seq.find_position(1), 1);
        assert_eq!(seq.find_position(5), 4);
    }

    #[test]
    fn test_find_index() {
        let seq = Sequence::new("s", "A-CD-E");
        assert_eq!(seq.find_index(1), 0);
        assert_eq!(seq.find_index(2), 2);
        assert_eq!(seq.find_index(3), 3);
        assert_eq!(seq.find_index(4), 5);
    }

    #[test]
    fn test_find_index_past_end_returns_sentinel() {
        let seq = Sequence::new("s", "A-CD-E--");
        // last residue sits in column 5
        assert_eq!(seq.find_index(5), 6);
        assert_eq!(seq.find_index(500), 6);
    }

    #[test]
    fn test_find_index_below_start() {
        let seq = Sequence::with_range("s", "--AC", 10, 11);
        assert_eq!(seq.find_index(3), 0);
        assert_eq!(seq.find_index(10), 2);
        assert_eq!(seq.find_index(11), 3);
    }

    #[test]
    fn test_end_beyond_residues() {
        let seq = Sequence::with_range("s", "AC-", 1, 10);
        assert_eq!(seq.find_index(2), 1);
        assert_eq!(seq.find_index(7), 2);
    }

    #[test]
    fn test_leading_gaps_and_clamping() {
        let seq = Sequence::with_range("s", "--AC", 5, 6);
        assert_eq!(seq.find_position(0), 4);
        assert_eq!(seq.find_position(2), 5);
        assert_eq!(seq.find_position(99), 6);
        assert_eq!(seq.find_position_map(), vec![4, 4, 5, 6]);
    }

    #[test]
    fn test_all_gap_sequence() {
        let seq = Sequence::new("s", "----");
        assert!(seq.gap_map().is_empty());
        assert_eq!(seq.find_index(1), 0);
        assert_eq!(seq.find_position(2), 0);
        assert_eq!(seq.insertions(), vec![Interval::new(0, 3)]);
        assert_eq!(seq.find_positions(0, 3), None);

        let empty = Sequence::new("e", "");
        assert!(empty.gap_map().is_empty());
        assert!(empty.insertions().is_empty());
        assert_eq!(empty.find_position(0), 0);
    }

    #[test]
    fn test_insertions() {
        let seq = Sequence::new("s", "--AC---G-");
        assert_eq!(
            seq.insertions(),
            vec![Interval::new(0, 1), Interval::new(4, 6), Interval::new(8, 8)]
        );
    }

    #[test]
    fn test_find_positions() {
        let seq = Sequence::new("s", "A-CD-E");
        assert_eq!(seq.find_positions(1, 4), Some(Interval::new(2, 3)));
        assert_eq!(seq.find_positions(4, 1), Some(Interval::new(2, 3)));
        assert_eq!(seq.find_positions(1, 1), None);
        assert_eq!(seq.find_positions(4, 40), Some(Interval::new(4, 4)));
    }

    #[test]
    fn test_position_map_monotonic() {
        let seq = Sequence::new("s", "-A-CD-E-");
        let map = seq.find_position_map();
        assert_eq!(map.len(), seq.len());
        assert!(map.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(map, vec![0, 1, 1, 2, 3, 3, 4, 4]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn gapped_seq(max_len: usize) -> impl Strategy<Value = String> {
        proptest::collection::vec(prop_oneof![Just('A'), Just('C'), Just('-'), Just('.')], 0..=max_len)
            .prop_map(|chars| chars.into_iter().collect())
    }

    proptest! {
        #[test]
        fn index_position_round_trip(data in gapped_seq(40), start in 1usize..50) {
            let residues = data.chars().filter(|c| c.is_ascii_alphabetic()).count();
            let seq = Sequence::with_range("p", data, start, 0);
            for r in start..start + residues {
                prop_assert_eq!(seq.find_position(seq.find_index(r)), r);
            }
        }

        #[test]
        fn gap_map_matches_residue_count(data in gapped_seq(40)) {
            let seq = Sequence::new("p", data);
            let map = seq.gap_map();
            prop_assert_eq!(map.len(), seq.residue_count());
            let gaps: usize = seq.insertions().iter().map(Interval::width).sum();
            prop_assert_eq!(gaps + map.len(), seq.len());
        }
    }
}
