//! Canonical dataset sequences.
//!
//! Aligned rows are views; the residues they show belong to a dataset
//! sequence kept here. Coordinate mappings refer to dataset sequences by
//! [`DatasetId`], so they outlive gap edits and alternative alignments of
//! the same data.

use serde::{Deserialize, Serialize};

/// Stable handle of a dataset sequence inside a [`DatasetStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetId(usize);

impl DatasetId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ungapped residues numbered from `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSequence {
    pub name: String,
    residues: Vec<u8>,
    start: usize,
}

impl DatasetSequence {
    pub fn residues(&self) -> &[u8] {
        &self.residues
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of the last residue (`start - 1` when empty).
    pub fn end(&self) -> usize {
        self.start + self.residues.len() - 1
    }

    /// Residue with 1-based number `pos`.
    pub fn residue_at(&self, pos: usize) -> Option<u8> {
        pos.checked_sub(self.start).and_then(|i| self.residues.get(i).copied())
    }
}

/// Arena of dataset sequences.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    sequences: Vec<DatasetSequence>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a dataset sequence and returns its handle.
    pub fn add(&mut self, name: impl Into<String>, residues: Vec<u8>, start: usize) -> DatasetId {
        self.sequences.push(DatasetSequence {
            name: name.into(),
            residues,
            start: start.max(1),
        });
        DatasetId(self.sequences.len() - 1)
    }

    pub fn get(&self, id: DatasetId) -> Option<&DatasetSequence> {
        self.sequences.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DatasetId, &DatasetSequence)> {
        self.sequences.iter().enumerate().map(|(i, s)| (DatasetId(i), s))
    }
}
