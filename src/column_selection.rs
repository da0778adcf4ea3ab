//! Column selection and hidden columns.
//!
//! [`ColumnSelection`] keeps the set of selected columns and the sorted,
//! non-overlapping list of hidden column intervals. Renderers and exporters
//! only ever walk the visible part of an alignment through
//! [`ColumnSelection::get_visible_contigs`] and the absolute/visible column
//! conversions. Column edits on the alignment are reported here through
//! [`ColumnSelection::compensate_for_edit`] or
//! [`ColumnSelection::prune_deletions`] so both sets follow the edit.

use std::collections::BTreeSet;

use log::{debug, warn};
use thiserror::Error;

use crate::annotation::AlignmentAnnotation;
use crate::interval::Interval;
use crate::model::Sequence;

/// Errors raised by batch ledger updates.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Deletion at column {position} overlaps or precedes the previous deletion")]
    UnorderedDeletions { position: usize },

    #[error("Deletion of {length} columns at column {position} runs past the last column index")]
    DeletionOverflow { position: usize, length: usize },
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Selected and hidden columns of an alignment view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    selected: BTreeSet<usize>,
    /// Sorted by `begin`, never overlapping.
    hidden: Vec<Interval>,
}

impl ColumnSelection {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- selection ----

    pub fn add_element(&mut self, col: usize) {
        self.selected.insert(col);
    }

    /// Selects every column of `[begin, end]`.
    pub fn add_range(&mut self, begin: usize, end: usize) {
        self.selected.extend(Interval::new(begin, end).positions());
    }

    pub fn remove_element(&mut self, col: usize) -> bool {
        self.selected.remove(&col)
    }

    pub fn contains(&self, col: usize) -> bool {
        self.selected.contains(&col)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Selected columns in ascending order.
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Toggles the selection of every visible column in
    /// `[first, end_exclusive)`. Selected hidden columns are deselected.
    pub fn invert_column_selection(&mut self, first: usize, end_exclusive: usize) {
        for col in first..end_exclusive {
            if !self.selected.remove(&col) && self.is_visible(col) {
                self.selected.insert(col);
            }
        }
    }

    // ---- hiding ----

    /// Hides `[begin, end]`, merging it with every hidden interval it
    /// overlaps.
    pub fn hide_columns(&mut self, begin: usize, end: usize) {
        let mut region = Interval::new(begin, end);
        while let Some(i) = self.hidden.iter().position(|h| h.overlaps(&region)) {
            let merged = self.hidden.remove(i);
            region = region.union(&merged);
        }
        let at = self.hidden.partition_point(|h| h.begin < region.begin);
        self.hidden.insert(at, region);
        debug!("hid columns {region}, {} hidden regions", self.hidden.len());
        self.check_hidden();
    }

    /// Hides the run of selected columns around `col` (or `col` alone) and
    /// deselects it.
    pub fn hide_column_block(&mut self, col: usize) {
        self.selected.remove(&col);
        let mut begin = col;
        while begin > 0 && self.selected.remove(&(begin - 1)) {
            begin -= 1;
        }
        let mut end = col;
        while self.selected.remove(&(end + 1)) {
            end += 1;
        }
        self.hide_columns(begin, end);
    }

    /// Hides every run of selected columns and empties the selection.
    pub fn hide_selected_columns(&mut self) {
        while let Some(&col) = self.selected.iter().next() {
            self.hide_column_block(col);
        }
    }

    /// Hides every gap run of `reference`.
    pub fn hide_insertions_for(&mut self, reference: &Sequence) {
        for run in reference.insertions() {
            self.hide_columns(run.begin, run.end);
        }
    }

    /// Reveals the hidden interval containing `col`. Its columns become
    /// selected.
    pub fn reveal_hidden_columns(&mut self, col: usize) -> Option<Interval> {
        let i = self.hidden.iter().position(|h| h.contains(col))?;
        let region = self.hidden.remove(i);
        self.selected.extend(region.positions());
        debug!("revealed columns {region}");
        Some(region)
    }

    /// Reveals every hidden interval, selecting all their columns.
    pub fn reveal_all_hidden_columns(&mut self) -> Vec<Interval> {
        let revealed: Vec<Interval> = self.hidden.drain(..).collect();
        for region in &revealed {
            self.selected.extend(region.positions());
        }
        revealed
    }

    pub fn has_hidden_columns(&self) -> bool {
        !self.hidden.is_empty()
    }

    /// Hidden intervals, sorted.
    pub fn hidden_columns(&self) -> &[Interval] {
        &self.hidden
    }

    /// Total number of hidden columns.
    pub fn hidden_width(&self) -> usize {
        self.hidden.iter().map(Interval::width).sum()
    }

    pub fn is_visible(&self, col: usize) -> bool {
        let after = self.hidden.partition_point(|h| h.begin <= col);
        after == 0 || self.hidden[after - 1].end < col
    }

    /// End of the nearest hidden interval lying wholly left of `col`.
    pub fn hidden_boundary_left(&self, col: usize) -> Option<usize> {
        self.hidden.iter().rev().find(|h| h.end < col).map(|h| h.end)
    }

    /// Start of the nearest hidden interval lying wholly right of `col`.
    pub fn hidden_boundary_right(&self, col: usize) -> Option<usize> {
        self.hidden.iter().find(|h| h.begin > col).map(|h| h.begin)
    }

    // ---- coordinate conversion ----

    /// Converts a column counted over visible columns only into an absolute
    /// column.
    pub fn adjust_for_hidden_columns(&self, visible: usize) -> usize {
        let mut result = visible;
        for h in &self.hidden {
            if result >= h.begin {
                result += h.width();
            }
        }
        result
    }

    /// Converts an absolute column into its visible position. A hidden
    /// column maps to where its interval's left edge is drawn.
    pub fn find_column_position(&self, absolute: usize) -> usize {
        let mut result = absolute;
        for h in &self.hidden {
            if absolute > h.end {
                result -= h.width();
            } else {
                if absolute >= h.begin {
                    result -= absolute - h.begin;
                }
                break;
            }
        }
        result
    }

    /// Maximal runs of visible columns within `[start, end_exclusive)` as
    /// inclusive `(begin, end)` pairs.
    pub fn get_visible_contigs(&self, start: usize, end_exclusive: usize) -> Vec<(usize, usize)> {
        let mut contigs = Vec::new();
        let mut vstart = start;
        for h in &self.hidden {
            if vstart >= end_exclusive || h.begin >= end_exclusive {
                break;
            }
            if h.end < vstart {
                continue;
            }
            if h.begin > vstart {
                contigs.push((vstart, h.begin - 1));
            }
            vstart = h.end + 1;
        }
        if vstart < end_exclusive {
            contigs.push((vstart, end_exclusive - 1));
        }
        contigs
    }

    /// The visible part of each sequence between `start` and
    /// `end_exclusive`.
    pub fn get_visible_sequence_strings(
        &self,
        start: usize,
        end_exclusive: usize,
        seqs: &[Sequence],
    ) -> Vec<String> {
        let contigs = self.get_visible_contigs(start, end_exclusive);
        seqs.iter()
            .map(|seq| {
                let mut visible = Vec::with_capacity(seq.len());
                for &(begin, end) in &contigs {
                    visible.extend_from_slice(seq.slice(begin..end + 1));
                }
                String::from_utf8_lossy(&visible).into_owned()
            })
            .collect()
    }

    /// Replaces the annotation row with the values of its visible columns in
    /// `[start, end_exclusive)`. A row shorter than `end_exclusive` is read
    /// up to its own length.
    pub fn make_visible_annotation(
        &self,
        start: usize,
        end_exclusive: usize,
        row: &mut AlignmentAnnotation,
    ) {
        let end_exclusive = end_exclusive.min(row.annotations.len());
        let mut visible = Vec::new();
        for (begin, end) in self.get_visible_contigs(start, end_exclusive) {
            visible.extend_from_slice(&row.annotations[begin..=end]);
        }
        row.annotations = visible;
    }

    // ---- edit compensation ----

    /// Follows a column edit at `edit_start`.
    ///
    /// A positive `delta` deletes the columns `[edit_start, edit_start +
    /// delta)`; a negative one inserts `-delta` columns before `edit_start`.
    /// An insertion at the first column of a hidden interval widens it, so an
    /// insertion undoes a deletion made at the same column.
    /// Hidden intervals lying wholly inside a deletion are removed and
    /// returned. Selected columns inside a deletion are deselected.
    pub fn compensate_for_edit(&mut self, edit_start: usize, delta: isize) -> Vec<Interval> {
        let removed = if delta > 0 {
            self.delete_span(edit_start, delta.unsigned_abs())
        } else {
            self.insert_span(edit_start, delta.unsigned_abs());
            Vec::new()
        };
        self.check_hidden();
        removed
    }

    /// Applies several edits in order; each position is read after the
    /// previous edit.
    pub fn compensate_for_edits(&mut self, edits: &[(usize, isize)]) -> Vec<Interval> {
        edits
            .iter()
            .flat_map(|&(start, delta)| self.compensate_for_edit(start, delta))
            .collect()
    }

    fn delete_span(&mut self, start: usize, width: usize) -> Vec<Interval> {
        let stop = start.saturating_add(width);
        let width = stop - start;
        self.selected = self
            .selected
            .iter()
            .filter(|&&c| c < start || c >= stop)
            .map(|&c| if c >= stop { c - width } else { c })
            .collect();

        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.hidden.len());
        for h in self.hidden.drain(..) {
            if h.begin >= start && h.end < stop {
                removed.push(h);
                continue;
            }
            let begin = match h.begin {
                b if b < start => b,
                b if b >= stop => b - width,
                _ => start,
            };
            let end = match h.end {
                e if e < start => e,
                e if e >= stop => e - width,
                _ => start - 1,
            };
            kept.push(Interval { begin, end });
        }
        self.hidden = kept;
        if !removed.is_empty() {
            debug!("deletion at {start} removed {} hidden regions", removed.len());
        }
        removed
    }

    fn insert_span(&mut self, start: usize, width: usize) {
        if width == 0 {
            return;
        }
        self.selected = self
            .selected
            .iter()
            .map(|&c| if c >= start { c.saturating_add(width) } else { c })
            .collect();
        // a region starting at `start` grows rather than moves
        for h in &mut self.hidden {
            if h.begin > start {
                h.begin = h.begin.saturating_add(width);
            }
            if h.end >= start {
                h.end = h.end.saturating_add(width);
            }
        }
    }

    /// Removes a batch of deleted columns given as `(position, length)` in
    /// pre-edit coordinates, sorted and non-overlapping.
    ///
    /// Selected columns and hidden intervals wholly inside a deletion are
    /// dropped, everything else shifts left. On invalid input nothing is
    /// changed.
    pub fn prune_deletions(&mut self, deletions: &[(usize, usize)]) -> LedgerResult<()> {
        let spans = deletions
            .iter()
            .filter(|&&(_, len)| len > 0)
            .map(|&(pos, len)| {
                pos.checked_add(len)
                    .map(|end| (pos, end))
                    .ok_or(LedgerError::DeletionOverflow { position: pos, length: len })
            })
            .collect::<LedgerResult<Vec<(usize, usize)>>>()?;
        if let Some(pair) = spans.windows(2).find(|pair| pair[1].0 < pair[0].1) {
            return Err(LedgerError::UnorderedDeletions { position: pair[1].0 });
        }
        if spans.is_empty() {
            return Ok(());
        }

        let deleted = |x: usize| spans.iter().any(|&(b, e)| b <= x && x < e);
        let shift = |x: usize| {
            x - spans
                .iter()
                .take_while(|&&(_, e)| e <= x)
                .map(|&(b, e)| e - b)
                .sum::<usize>()
        };

        self.selected = self
            .selected
            .iter()
            .filter(|&&c| !deleted(c))
            .map(|&c| shift(c))
            .collect();

        let mut kept = Vec::with_capacity(self.hidden.len());
        for h in &self.hidden {
            let mut begin = h.begin;
            for &(b, e) in &spans {
                if b <= begin && begin < e {
                    begin = e;
                }
            }
            if begin > h.end {
                continue;
            }
            let mut end = h.end;
            for &(b, e) in spans.iter().rev() {
                if b <= end && end < e {
                    end = b - 1;
                }
            }
            kept.push(Interval {
                begin: shift(begin),
                end: shift(end),
            });
        }
        self.hidden = kept;
        debug!("pruned {} deletions", spans.len());
        self.check_hidden();
        Ok(())
    }

    /// Drops any hidden interval breaking the sorted/disjoint invariant.
    fn check_hidden(&mut self) {
        let consistent = self.hidden.iter().all(|h| h.begin <= h.end)
            && self.hidden.windows(2).all(|w| w[0].end < w[1].begin);
        debug_assert!(consistent, "hidden columns out of order: {:?}", self.hidden);
        if !consistent {
            warn!("hidden column list inconsistent, dropping invalid regions");
            let mut last_end = None;
            self.hidden.retain(|h| {
                let ok = h.begin <= h.end && last_end.map_or(true, |e| e < h.begin);
                if ok {
                    last_end = Some(h.end);
                }
                ok
            });
        }
    }
}
