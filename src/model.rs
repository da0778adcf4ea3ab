//! Data model for aligned sequences.
//!
//! This module contains:
//! - [`Sequence`]: a gapped row with its residue numbering and dataset link
//! - [`AlignmentRows`]: the narrow row capability the hidden-row ledger needs
//! - [`Alignment`]: visible rows plus the hidden-row ledger, owned together
//!
//! Residue/column lookups on a sequence live in [`crate::residue`].

use std::fmt;
use std::ops::Range;

use log::debug;

use crate::dataset::{DatasetId, DatasetStore};
use crate::hidden_rows::{HiddenSequences, RepresentativeMap};

/// Default gap character used when inserting gaps.
pub const DEFAULT_GAP: u8 = b'-';

/// Returns true for the characters treated as gaps.
pub fn is_gap(c: u8) -> bool {
    matches!(c, b'-' | b'.' | b' ')
}

/// A single aligned sequence.
///
/// `start` and `end` are the 1-based residue numbers of the first and last
/// non-gap characters. `end` is never below `start - 1 + residue_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// The sequence identifier
    pub id: String,
    data: Vec<u8>,
    start: usize,
    end: usize,
    dataset: Option<DatasetId>,
}

impl Sequence {
    /// Creates a new sequence numbered from residue 1.
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self::from_bytes(id, data.into().into_bytes())
    }

    /// Creates a new sequence from raw bytes, numbered from residue 1.
    pub fn from_bytes(id: impl Into<String>, data: Vec<u8>) -> Self {
        let residues = data.iter().filter(|&&c| !is_gap(c)).count();
        Self {
            id: id.into(),
            data,
            start: 1,
            end: residues,
            dataset: None,
        }
    }

    /// Creates a sequence whose first residue is numbered `start`.
    ///
    /// `start` is raised to 1 if zero and `end` is raised to cover every
    /// residue in `data`.
    pub fn with_range(id: impl Into<String>, data: impl Into<String>, start: usize, end: usize) -> Self {
        let mut seq = Self::new(id, data);
        seq.start = start.max(1);
        seq.end = end.max(seq.start - 1 + seq.residue_count());
        seq
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Gets the character at a column.
    pub fn char_at(&self, col: usize) -> Option<u8> {
        self.data.get(col).copied()
    }

    /// Gets a slice of the sequence data, clamped to its length.
    pub fn slice(&self, range: Range<usize>) -> &[u8] {
        let end = range.end.min(self.data.len());
        let start = range.start.min(end);
        &self.data[start..end]
    }

    /// 1-based number of the first residue.
    pub fn start(&self) -> usize {
        self.start
    }

    /// 1-based number of the last residue.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of non-gap characters.
    pub fn residue_count(&self) -> usize {
        self.data.iter().filter(|&&c| !is_gap(c)).count()
    }

    /// The residues with every gap removed.
    pub fn ungapped(&self) -> Vec<u8> {
        self.data.iter().copied().filter(|&c| !is_gap(c)).collect()
    }

    /// The canonical dataset sequence this row is a view of, if any.
    pub fn dataset(&self) -> Option<DatasetId> {
        self.dataset
    }

    pub fn set_dataset(&mut self, dataset: Option<DatasetId>) {
        self.dataset = dataset;
    }

    /// Registers the ungapped residues of this row as a dataset sequence and
    /// links the row to it. Returns the existing link if there is one.
    pub fn create_dataset_sequence(&mut self, store: &mut DatasetStore) -> DatasetId {
        if let Some(id) = self.dataset {
            return id;
        }
        let id = store.add(self.id.clone(), self.ungapped(), self.start);
        self.dataset = Some(id);
        id
    }

    /// Removes the columns in `[from, to)`.
    ///
    /// Deleting leading residues moves `start` forward; deleting any other
    /// residue shortens `end` and detaches the dataset link, since the row no
    /// longer shows the dataset residues contiguously.
    pub fn delete_chars(&mut self, from: usize, to: usize) {
        let to = to.min(self.data.len());
        if from >= to {
            return;
        }
        let leading = self.data[..from].iter().all(|&c| is_gap(c));
        let removed = self.data[from..to].iter().filter(|&&c| !is_gap(c)).count();
        self.data.drain(from..to);
        if removed == 0 {
            return;
        }
        if leading {
            self.start += removed;
        } else {
            self.end = self.end.saturating_sub(removed).max(self.start - 1);
            if self.dataset.take().is_some() {
                debug!("{}: residues deleted, dataset link dropped", self.id);
            }
        }
    }

    /// Inserts `count` gap characters before column `col`; appends when
    /// `col` is past the end.
    pub fn insert_gap_at(&mut self, col: usize, count: usize, gap: u8) {
        let col = col.min(self.data.len());
        self.data.splice(col..col, std::iter::repeat(gap).take(count));
    }

    /// Pads the row with gaps up to `width` columns.
    pub fn pad_to(&mut self, width: usize, gap: u8) {
        if self.data.len() < width {
            self.data.resize(width, gap);
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.data))
    }
}

/// Row operations the hidden-row ledger relies on.
pub trait AlignmentRows {
    /// Number of visible rows.
    fn height(&self) -> usize;
    fn sequence_at(&self, index: usize) -> Option<&Sequence>;
    /// Appends a visible row.
    fn add_sequence(&mut self, seq: Sequence);
    /// Inserts a visible row; `index` past the end appends.
    fn insert_sequence_at(&mut self, index: usize, seq: Sequence);
    fn delete_sequence(&mut self, index: usize) -> Option<Sequence>;
    fn gap_character(&self) -> u8;
    /// Visible row index of the first row equal to `seq`.
    fn find_index(&self, seq: &Sequence) -> Option<usize>;
}

/// Plain ordered list of visible rows.
#[derive(Debug, Clone)]
pub struct SequenceList {
    sequences: Vec<Sequence>,
    gap: u8,
}

impl SequenceList {
    pub fn new(sequences: Vec<Sequence>, gap: u8) -> Self {
        Self { sequences, gap }
    }

    pub fn as_slice(&self) -> &[Sequence] {
        &self.sequences
    }
}

impl AlignmentRows for SequenceList {
    fn height(&self) -> usize {
        self.sequences.len()
    }

    fn sequence_at(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    fn add_sequence(&mut self, seq: Sequence) {
        self.sequences.push(seq);
    }

    fn insert_sequence_at(&mut self, index: usize, seq: Sequence) {
        let index = index.min(self.sequences.len());
        self.sequences.insert(index, seq);
    }

    fn delete_sequence(&mut self, index: usize) -> Option<Sequence> {
        (index < self.sequences.len()).then(|| self.sequences.remove(index))
    }

    fn gap_character(&self) -> u8 {
        self.gap
    }

    fn find_index(&self, seq: &Sequence) -> Option<usize> {
        self.sequences.iter().position(|s| s == seq)
    }
}

/// An alignment: its visible rows and the ledger of hidden rows.
///
/// Every row addition or deletion goes through this type so the hidden-row
/// slot array is resized together with the visible list.
#[derive(Debug, Clone)]
pub struct Alignment {
    rows: SequenceList,
    hidden: HiddenSequences,
}

impl Alignment {
    /// Creates a new alignment using `-` as gap character.
    pub fn new(sequences: Vec<Sequence>) -> Self {
        Self::with_gap(sequences, DEFAULT_GAP)
    }

    pub fn with_gap(sequences: Vec<Sequence>, gap: u8) -> Self {
        let hidden = HiddenSequences::new(sequences.len());
        Self {
            rows: SequenceList::new(sequences, gap),
            hidden,
        }
    }

    /// Visible rows.
    pub fn sequences(&self) -> &[Sequence] {
        self.rows.as_slice()
    }

    /// Number of visible rows.
    pub fn height(&self) -> usize {
        self.rows.height()
    }

    pub fn get(&self, index: usize) -> Option<&Sequence> {
        self.rows.sequence_at(index)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.height() == 0
    }

    pub fn gap_character(&self) -> u8 {
        self.rows.gap_character()
    }

    pub fn find_index(&self, seq: &Sequence) -> Option<usize> {
        self.rows.find_index(seq)
    }

    /// Longest row, hidden rows included.
    pub fn width(&self) -> usize {
        self.rows
            .as_slice()
            .iter()
            .chain(self.hidden.hidden_sequences())
            .map(Sequence::len)
            .max()
            .unwrap_or(0)
    }

    /// True when every row, hidden ones included, has the same length.
    pub fn is_aligned(&self) -> bool {
        let width = self.width();
        self.rows
            .as_slice()
            .iter()
            .chain(self.hidden.hidden_sequences())
            .all(|s| s.len() == width)
    }

    /// Appends a visible row.
    pub fn add_sequence(&mut self, seq: Sequence) {
        self.rows.add_sequence(seq);
        self.hidden.adjust_height_sequence_added();
    }

    /// Deletes the visible row at `index`.
    pub fn delete_sequence(&mut self, index: usize) -> Option<Sequence> {
        if index >= self.rows.height() {
            return None;
        }
        self.hidden.adjust_height_sequence_deleted(index);
        self.rows.delete_sequence(index)
    }

    /// The hidden-row ledger.
    pub fn hidden(&self) -> &HiddenSequences {
        &self.hidden
    }

    /// Hides the first visible row equal to `seq`. Rows are compared by
    /// value, so among identical copies the topmost one is hidden; use
    /// [`Alignment::hide_sequence_at`] to pick a specific row.
    pub fn hide_sequence(&mut self, seq: &Sequence) -> bool {
        self.hidden.hide_sequence(&mut self.rows, seq)
    }

    pub fn hide_sequence_at(&mut self, index: usize) -> bool {
        self.hidden.hide_sequence_at(&mut self.rows, index)
    }

    /// Reveals the hidden rows sitting just above visible row `index`.
    pub fn reveal_sequences(&mut self, index: usize, reps: &mut RepresentativeMap) -> Vec<Sequence> {
        self.hidden.reveal_sequences(&mut self.rows, index, reps)
    }

    pub fn reveal_all(&mut self, reps: &mut RepresentativeMap) -> Vec<Sequence> {
        self.hidden.reveal_all(&mut self.rows, reps)
    }

    /// Visible and hidden rows in their original order.
    pub fn full_alignment(&self) -> Vec<Sequence> {
        self.hidden.full_alignment(&self.rows)
    }

    /// Applies `edit` to every row, hidden rows included.
    pub fn edit_all<F: FnMut(&mut Sequence)>(&mut self, mut edit: F) {
        self.rows.sequences.iter_mut().for_each(&mut edit);
        self.hidden.hidden_sequences_mut().for_each(edit);
    }
}
