//! # alnview - alignment column and row ledgers
//!
//! Bookkeeping for an alignment viewer/editor: which columns and rows are
//! hidden, how aligned columns relate to residue numbers, and how residues
//! of one sequence map onto another (e.g. codons onto amino acids).
//!
//! ## Architecture
//!
//! - `interval`: closed `[begin, end]` ranges shared by every ledger
//! - `model`: aligned sequences and the [`model::Alignment`] that owns its
//!   visible rows and hidden-row ledger
//! - `residue`: column <-> residue number lookups on a sequence
//! - `column_selection`: selected and hidden columns, kept in step with edits
//! - `hidden_rows`: hidden rows and the representative map
//! - `dataset`: canonical ungapped sequences behind aligned rows
//! - `mapping`: ratio-based coordinate mappings between dataset sequences
//! - `genetic_code`: NCBI tables and cDNA translation
//! - `annotation`: per-column annotation rows
//! - `view`: an alignment with its ledgers, routing column edits

pub mod annotation;
pub mod column_selection;
pub mod dataset;
pub mod genetic_code;
pub mod hidden_rows;
pub mod interval;
pub mod mapping;
pub mod model;
pub mod residue;
pub mod view;
