//! An alignment together with its column ledger and representative map.
//!
//! Column edits go through [`AlignmentView`] so that every row (hidden rows
//! included) and the [`ColumnSelection`] move together.

use log::{debug, info};

use crate::column_selection::{ColumnSelection, LedgerResult};
use crate::hidden_rows::RepresentativeMap;
use crate::interval::Interval;
use crate::model::{is_gap, Alignment, Sequence};

#[derive(Debug, Clone)]
pub struct AlignmentView {
    alignment: Alignment,
    columns: ColumnSelection,
    representatives: RepresentativeMap,
}

impl AlignmentView {
    pub fn new(alignment: Alignment) -> Self {
        Self {
            alignment,
            columns: ColumnSelection::new(),
            representatives: RepresentativeMap::new(),
        }
    }

    pub fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    pub fn columns(&self) -> &ColumnSelection {
        &self.columns
    }

    /// Mutable access to the column ledger, for selection changes.
    pub fn columns_mut(&mut self) -> &mut ColumnSelection {
        &mut self.columns
    }

    pub fn representatives(&self) -> &RepresentativeMap {
        &self.representatives
    }

    // ---- columns ----

    pub fn hide_columns(&mut self, begin: usize, end: usize) {
        self.columns.hide_columns(begin, end);
    }

    pub fn hide_selected_columns(&mut self) {
        self.columns.hide_selected_columns();
    }

    pub fn reveal_hidden_columns(&mut self, col: usize) -> Option<Interval> {
        self.columns.reveal_hidden_columns(col)
    }

    pub fn reveal_all_hidden_columns(&mut self) -> Vec<Interval> {
        self.columns.reveal_all_hidden_columns()
    }

    // ---- rows ----

    pub fn hide_sequence(&mut self, index: usize) -> bool {
        self.alignment.hide_sequence_at(index)
    }

    /// Hides the rows `members` behind the row `representative` (all visible
    /// indices). Revealing at the representative's row releases the group.
    /// Returns how many rows were hidden.
    pub fn hide_group_behind(&mut self, representative: usize, members: &[usize]) -> usize {
        let Some(rep_id) = self.alignment.get(representative).map(|s| s.id.clone()) else {
            return 0;
        };
        let mut targets: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&i| i != representative && i < self.alignment.height())
            .collect();
        targets.sort_unstable();
        targets.dedup();

        // bottom-up, so the remaining member indices stay valid
        let mut hidden_ids = Vec::with_capacity(targets.len());
        for &index in targets.iter().rev() {
            let Some(id) = self.alignment.get(index).map(|s| s.id.clone()) else {
                continue;
            };
            if self.alignment.hide_sequence_at(index) {
                hidden_ids.push(id);
            }
        }
        hidden_ids.reverse();
        if !hidden_ids.is_empty() {
            debug!("{} now represents {} rows", rep_id, hidden_ids.len());
            self.representatives.entry(rep_id).or_default().extend(hidden_ids.iter().cloned());
        }
        hidden_ids.len()
    }

    /// Reveals the hidden rows just above visible row `index`.
    pub fn reveal_sequences(&mut self, index: usize) -> Vec<Sequence> {
        self.alignment.reveal_sequences(index, &mut self.representatives)
    }

    pub fn reveal_all_sequences(&mut self) -> Vec<Sequence> {
        self.alignment.reveal_all(&mut self.representatives)
    }

    // ---- edits ----

    /// Deletes the columns `[start, end_exclusive)` from every row. Hidden
    /// column regions lying wholly inside the span are returned.
    pub fn delete_columns(&mut self, start: usize, end_exclusive: usize) -> Vec<Interval> {
        let end_exclusive = end_exclusive.min(self.alignment.width());
        if start >= end_exclusive {
            return Vec::new();
        }
        self.alignment.edit_all(|s| s.delete_chars(start, end_exclusive));
        self.columns.compensate_for_edit(start, (end_exclusive - start) as isize)
    }

    /// Inserts `count` gap columns before column `col` in every row.
    pub fn insert_gap_columns(&mut self, col: usize, count: usize) {
        if count == 0 {
            return;
        }
        let gap = self.alignment.gap_character();
        self.alignment.edit_all(|s| s.insert_gap_at(col, count, gap));
        self.columns.compensate_for_edit(col, -(count as isize));
    }

    /// Removes every column that is a gap in all rows, hidden rows included.
    /// Returns the number of columns removed.
    pub fn remove_gapped_columns(&mut self) -> LedgerResult<usize> {
        let rows = self.alignment.full_alignment();
        let width = self.alignment.width();
        let mut runs: Vec<(usize, usize)> = Vec::new();
        for col in 0..width {
            if rows.iter().all(|s| s.char_at(col).map_or(true, is_gap)) {
                match runs.last_mut() {
                    Some((pos, len)) if *pos + *len == col => *len += 1,
                    _ => runs.push((col, 1)),
                }
            }
        }
        if runs.is_empty() {
            return Ok(0);
        }

        self.columns.prune_deletions(&runs)?;
        // right to left so earlier positions stay valid
        for &(pos, len) in runs.iter().rev() {
            self.alignment.edit_all(|s| s.delete_chars(pos, pos + len));
        }
        let removed = runs.iter().map(|&(_, len)| len).sum();
        info!("removed {removed} all-gap columns");
        Ok(removed)
    }

    // ---- export ----

    /// Visible rows restricted to their visible columns.
    pub fn visible_sequence_strings(&self) -> Vec<String> {
        self.columns
            .get_visible_sequence_strings(0, self.alignment.width(), self.alignment.sequences())
    }

    /// Number of visible columns.
    pub fn visible_width(&self) -> usize {
        self.columns
            .get_visible_contigs(0, self.alignment.width())
            .iter()
            .map(|&(begin, end)| end - begin + 1)
            .sum()
    }

    /// Every row, hidden ones included, in original order.
    pub fn full_alignment(&self) -> Vec<Sequence> {
        self.alignment.full_alignment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> AlignmentView {
        AlignmentView::new(Alignment::new(vec![
            Sequence::new("a", "AC-GT-A"),
            Sequence::new("b", "AC-GTTA"),
            Sequence::new("c", "TC-GT-A"),
        ]))
    }

    fn ids(seqs: &[Sequence]) -> Vec<&str> {
        seqs.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_visible_strings_skip_hidden_columns() {
        let mut v = view();
        v.hide_columns(1, 2);
        assert_eq!(v.visible_width(), 5);
        assert_eq!(v.visible_sequence_strings(), vec!["AGT-A", "AGTTA", "TGT-A"]);
        assert_eq!(v.reveal_hidden_columns(2), Some(Interval::new(1, 2)));
        assert_eq!(v.visible_width(), 7);
    }

    #[test]
    fn test_delete_columns_keeps_ledger_in_step() {
        let mut v = view();
        v.hide_columns(5, 6);
        v.columns_mut().add_element(4);
        let removed = v.delete_columns(1, 3);
        assert!(removed.is_empty());
        assert_eq!(v.alignment().get(0).unwrap().to_string(), "AGT-A");
        assert_eq!(v.columns().hidden_columns(), &[Interval::new(3, 4)]);
        assert!(v.columns().contains(2));

        let removed = v.delete_columns(3, 100);
        assert_eq!(removed, vec![Interval::new(3, 4)]);
        assert!(!v.columns().has_hidden_columns());
    }

    #[test]
    fn test_insert_gap_columns_shifts_hidden_regions() {
        let mut v = view();
        v.hide_columns(3, 4);
        v.insert_gap_columns(2, 2);
        assert_eq!(v.alignment().get(1).unwrap().to_string(), "AC---GTTA");
        assert_eq!(v.columns().hidden_columns(), &[Interval::new(5, 6)]);
        assert!(v.alignment().is_aligned());
    }

    #[test]
    fn test_remove_gapped_columns_includes_hidden_rows() {
        let mut v = view();
        v.hide_sequence(1);
        v.hide_columns(5, 6);
        // column 5 is only filled in the hidden row b
        assert_eq!(v.remove_gapped_columns().unwrap(), 1);
        let full = v.full_alignment();
        assert_eq!(full[0].to_string(), "ACGT-A");
        assert_eq!(full[1].to_string(), "ACGTTA");
        assert_eq!(v.columns().hidden_columns(), &[Interval::new(4, 5)]);
        assert_eq!(v.remove_gapped_columns().unwrap(), 0);
    }

    #[test]
    fn test_group_hidden_behind_representative() {
        let mut v = AlignmentView::new(Alignment::new(vec![
            Sequence::new("a", "AAAA"),
            Sequence::new("b", "AAAT"),
            Sequence::new("rep", "AAAA"),
            Sequence::new("d", "CCCC"),
        ]));
        assert_eq!(v.hide_group_behind(2, &[0, 1, 2]), 2);
        assert_eq!(ids(v.alignment().sequences()), vec!["rep", "d"]);
        assert_eq!(v.representatives()["rep"], vec!["a".to_string(), "b".to_string()]);

        let revealed = v.reveal_sequences(0);
        assert_eq!(ids(&revealed), vec!["rep", "b", "a"]);
        assert!(v.representatives().is_empty());
        assert_eq!(ids(v.alignment().sequences()), vec!["a", "b", "rep", "d"]);
    }

    #[test]
    fn test_group_member_identical_to_representative() {
        let mut v = AlignmentView::new(Alignment::new(vec![
            Sequence::new("x", "AC"),
            Sequence::new("x", "AC"),
            Sequence::new("y", "GG"),
        ]));
        assert_eq!(v.hide_group_behind(0, &[1, 1, 0]), 1);
        assert_eq!(ids(v.alignment().sequences()), vec!["x", "y"]);
        // the representative keeps slot 0, the copy below it is hidden
        assert_eq!(v.alignment().hidden().adjust_for_hidden_seqs(0), 0);
        assert_eq!(v.alignment().hidden().adjust_for_hidden_seqs(1), 2);

        let revealed = v.reveal_sequences(1);
        assert_eq!(ids(&revealed), vec!["x"]);
        assert_eq!(v.alignment().height(), 3);
    }

    #[test]
    fn test_reveal_all_sequences() {
        let mut v = view();
        v.hide_sequence(0);
        v.hide_sequence(1);
        assert_eq!(v.alignment().height(), 1);
        v.reveal_all_sequences();
        assert_eq!(ids(v.alignment().sequences()), vec!["a", "b", "c"]);
        assert!(v.alignment().hidden().is_empty());
    }
}
