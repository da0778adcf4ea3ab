//! Hidden sequences of an alignment.
//!
//! [`HiddenSequences`] is a slot array with one slot per row of the full
//! alignment. Occupied slots hold a hidden sequence; empty slots stand for
//! the visible rows, in order. The slot array always has
//! `visible height + hidden count` entries.

use std::collections::HashMap;

use log::{debug, warn};

use crate::model::{AlignmentRows, Sequence};

/// Visible representative sequence id -> ids of the sequences it stands in
/// for while they are hidden.
pub type RepresentativeMap = HashMap<String, Vec<String>>;

#[derive(Debug, Clone, Default)]
pub struct HiddenSequences {
    slots: Vec<Option<Sequence>>,
}

impl HiddenSequences {
    /// Creates an empty ledger for an alignment of `height` visible rows.
    pub fn new(height: usize) -> Self {
        Self {
            slots: vec![None; height],
        }
    }

    /// Number of hidden sequences.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Number of slots (visible and hidden rows).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Hidden sequences in original row order.
    pub fn hidden_sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.slots.iter().flatten()
    }

    pub(crate) fn hidden_sequences_mut(&mut self) -> impl Iterator<Item = &mut Sequence> {
        self.slots.iter_mut().flatten()
    }

    /// Length of the longest hidden sequence.
    pub fn width(&self) -> usize {
        self.hidden_sequences().map(Sequence::len).max().unwrap_or(0)
    }

    pub fn is_hidden(&self, seq: &Sequence) -> bool {
        self.hidden_sequences().any(|s| s == seq)
    }

    /// Hides `seq`, found among the visible rows by value (the first equal
    /// row wins).
    pub fn hide_sequence<R: AlignmentRows>(&mut self, rows: &mut R, seq: &Sequence) -> bool {
        match rows.find_index(seq) {
            Some(index) => self.hide_sequence_at(rows, index),
            None => false,
        }
    }

    /// Hides the visible row at `index`.
    pub fn hide_sequence_at<R: AlignmentRows>(&mut self, rows: &mut R, index: usize) -> bool {
        if index >= rows.height() || !self.check_invariants(rows) {
            return false;
        }
        let slot = self.adjust_for_hidden_seqs(index);
        if self.slots[slot].is_some() {
            warn!("slot {slot} of visible row {index} is already occupied");
            return false;
        }
        let Some(seq) = rows.delete_sequence(index) else {
            return false;
        };
        debug!("hiding {} at slot {slot}", seq.id);
        self.slots[slot] = Some(seq);
        true
    }

    /// Reveals the run of hidden sequences sitting just above visible row
    /// `alignment_index` (or after the last row when it equals the height).
    ///
    /// If the row at `alignment_index` represents a hidden group, it is
    /// removed from `reps` and listed first among the revealed sequences.
    /// Sequences emptied while hidden are dropped.
    pub fn reveal_sequences<R: AlignmentRows>(
        &mut self,
        rows: &mut R,
        alignment_index: usize,
        reps: &mut RepresentativeMap,
    ) -> Vec<Sequence> {
        let mut revealed = Vec::new();
        if let Some(rep) = rows.sequence_at(alignment_index) {
            if reps.remove(&rep.id).is_some() {
                revealed.push(rep.clone());
            }
        }
        if !self.check_invariants(rows) {
            return revealed;
        }

        let insert_at = alignment_index.min(rows.height());
        let mut slot = self.adjust_for_hidden_seqs(insert_at).min(self.slots.len());
        while slot > 0 {
            slot -= 1;
            let Some(seq) = self.slots[slot].take() else {
                break;
            };
            if seq.is_empty() {
                warn!("{} was deleted whilst hidden", seq.id);
                self.slots.remove(slot);
                continue;
            }
            debug!("revealing {} at row {insert_at}", seq.id);
            revealed.push(seq.clone());
            rows.insert_sequence_at(insert_at, seq);
        }
        revealed
    }

    /// Reveals every hidden sequence and clears `reps`.
    pub fn reveal_all<R: AlignmentRows>(&mut self, rows: &mut R, reps: &mut RepresentativeMap) -> Vec<Sequence> {
        let mut revealed = Vec::new();
        // bottom-up, so rows above `index` keep their positions
        let mut index = rows.height();
        loop {
            revealed.extend(self.reveal_sequences(rows, index, reps));
            if index == 0 {
                break;
            }
            index -= 1;
        }
        reps.clear();
        revealed
    }

    /// Slot of visible row `visible`. Rows past the end map past the last
    /// slot.
    pub fn adjust_for_hidden_seqs(&self, visible: usize) -> usize {
        let mut index = 0;
        for (slot, entry) in self.slots.iter().enumerate() {
            if entry.is_some() {
                continue;
            }
            if index == visible {
                return slot;
            }
            index += 1;
        }
        visible + self.len()
    }

    /// Visible row index of `slot`, counting only visible rows before it.
    pub fn find_index_without_hidden_seqs(&self, slot: usize) -> usize {
        if self.slots.is_empty() {
            return slot;
        }
        let slot = slot.min(self.slots.len() - 1);
        let hidden = self.slots[..=slot].iter().filter(|s| s.is_some()).count();
        slot.saturating_sub(hidden)
    }

    /// Visible and hidden rows together, in original order.
    pub fn full_alignment<R: AlignmentRows>(&self, rows: &R) -> Vec<Sequence> {
        let mut visible = 0;
        let mut full = Vec::with_capacity(self.slots.len());
        for entry in &self.slots {
            match entry {
                Some(seq) => full.push(seq.clone()),
                None => {
                    if let Some(seq) = rows.sequence_at(visible) {
                        full.push(seq.clone());
                    }
                    visible += 1;
                }
            }
        }
        full
    }

    /// Adds the slot of a row appended to the visible list.
    pub fn adjust_height_sequence_added(&mut self) {
        self.slots.push(None);
    }

    /// Removes the slot of visible row `index`, which is about to be
    /// deleted.
    pub fn adjust_height_sequence_deleted(&mut self, index: usize) {
        let slot = self.adjust_for_hidden_seqs(index);
        if slot < self.slots.len() && self.slots[slot].is_none() {
            self.slots.remove(slot);
        }
    }

    /// Checks that the slot array matches the visible row count.
    pub fn check_invariants<R: AlignmentRows>(&self, rows: &R) -> bool {
        let consistent = self.slots.len() == rows.height() + self.len();
        debug_assert!(
            consistent,
            "{} slots for {} visible and {} hidden rows",
            self.slots.len(),
            rows.height(),
            self.len()
        );
        if !consistent {
            warn!("hidden row slots out of step with the alignment, ignoring request");
        }
        consistent
    }
}
