//! Ratio-based coordinate mappings between dataset sequences.
//!
//! A [`MapList`] relates positions of a "from" sequence to positions of a
//! "to" sequence: both sides are ordered lists of 1-based residue ranges and
//! every `from_ratio` consecutive positions on the from side correspond to
//! `to_ratio` positions on the to side (3:1 for a coding sequence and its
//! translation, 1:1 for a plain copy). Split ranges express spliced gene
//! models.
//!
//! [`MappingRegistry`] owns every registered mapping and answers lookups by
//! either endpoint.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::{DatasetId, DatasetStore};
use crate::interval::Interval;
use crate::model::{is_gap, Sequence};

/// Errors that can occur when building mappings.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MappingError {
    #[error("Mapping ratio must be positive (got {from}:{to})")]
    InvalidRatio { from: usize, to: usize },

    #[error("Invalid mapping range {begin}-{end}: ranges are 1-based with begin <= end")]
    InvalidRange { begin: usize, end: usize },

    #[error("Mapping needs at least one range on each side")]
    EmptyRanges,

    #[error("Sequence {0} has no dataset sequence")]
    NoDataset(String),

    #[error("Sequence {name} is too short to translate ({length} residues)")]
    TooShortToTranslate { name: String, length: usize },
}

/// Result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Ordered range correspondence with a position ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MapListRepr", into = "MapListRepr")]
pub struct MapList {
    from_ranges: Vec<Interval>,
    to_ranges: Vec<Interval>,
    from_ratio: usize,
    to_ratio: usize,
}

/// Serialized form of a [`MapList`]; validated on the way back in.
#[derive(Serialize, Deserialize)]
struct MapListRepr {
    from_ranges: Vec<(usize, usize)>,
    to_ranges: Vec<(usize, usize)>,
    from_ratio: usize,
    to_ratio: usize,
}

impl TryFrom<MapListRepr> for MapList {
    type Error = MappingError;

    fn try_from(repr: MapListRepr) -> MappingResult<Self> {
        MapList::new(&repr.from_ranges, &repr.to_ranges, repr.from_ratio, repr.to_ratio)
    }
}

impl From<MapList> for MapListRepr {
    fn from(map: MapList) -> Self {
        let pairs = |ranges: &[Interval]| ranges.iter().map(|r| (r.begin, r.end)).collect();
        MapListRepr {
            from_ranges: pairs(&map.from_ranges),
            to_ranges: pairs(&map.to_ranges),
            from_ratio: map.from_ratio,
            to_ratio: map.to_ratio,
        }
    }
}

fn checked_ranges(ranges: &[(usize, usize)]) -> MappingResult<Vec<Interval>> {
    if ranges.is_empty() {
        return Err(MappingError::EmptyRanges);
    }
    ranges
        .iter()
        .map(|&(begin, end)| {
            if begin == 0 || begin > end {
                Err(MappingError::InvalidRange { begin, end })
            } else {
                Ok(Interval { begin, end })
            }
        })
        .collect()
}

/// Offset of `pos` counted over `ranges`. The first range containing it wins.
fn offset_of(ranges: &[Interval], pos: usize) -> Option<usize> {
    let mut offset = 0;
    for r in ranges {
        if r.contains(pos) {
            return Some(offset + pos - r.begin);
        }
        offset += r.width();
    }
    None
}

/// Position at `offset` counted over `ranges`.
fn position_at(ranges: &[Interval], mut offset: usize) -> Option<usize> {
    for r in ranges {
        if offset < r.width() {
            return Some(r.begin + offset);
        }
        offset -= r.width();
    }
    None
}

/// Splits the offsets `[first, last]` into position intervals, one per range
/// they cross.
fn intervals_for(ranges: &[Interval], first: usize, last: usize) -> Vec<Interval> {
    let mut out = Vec::new();
    let mut offset = 0;
    for r in ranges {
        let lo = first.max(offset);
        let hi = last.min(offset + r.width() - 1);
        if lo <= hi {
            out.push(Interval {
                begin: r.begin + lo - offset,
                end: r.begin + hi - offset,
            });
        }
        offset += r.width();
        if offset > last {
            break;
        }
    }
    out
}

fn total_width(ranges: &[Interval]) -> usize {
    ranges.iter().map(Interval::width).sum()
}

/// Maps `[begin, end]` from one side to the other, unit by unit.
fn project(
    src: &[Interval],
    src_ratio: usize,
    dst: &[Interval],
    dst_ratio: usize,
    begin: usize,
    end: usize,
) -> Vec<Interval> {
    let span = Interval::new(begin, end);
    let (Some(first), Some(last)) = (offset_of(src, span.begin), offset_of(src, span.end)) else {
        return Vec::new();
    };
    let (first, last) = (first.min(last), first.max(last));
    let dst_len = total_width(dst);
    let dst_first = first / src_ratio * dst_ratio;
    if dst_first >= dst_len {
        return Vec::new();
    }
    let dst_last = (last / src_ratio * dst_ratio + dst_ratio - 1).min(dst_len - 1);
    intervals_for(dst, dst_first, dst_last)
}

impl MapList {
    /// Creates a mapping from 1-based inclusive ranges.
    pub fn new(
        from_ranges: &[(usize, usize)],
        to_ranges: &[(usize, usize)],
        from_ratio: usize,
        to_ratio: usize,
    ) -> MappingResult<Self> {
        if from_ratio == 0 || to_ratio == 0 {
            return Err(MappingError::InvalidRatio {
                from: from_ratio,
                to: to_ratio,
            });
        }
        Ok(Self {
            from_ranges: checked_ranges(from_ranges)?,
            to_ranges: checked_ranges(to_ranges)?,
            from_ratio,
            to_ratio,
        })
    }

    pub fn from_ranges(&self) -> &[Interval] {
        &self.from_ranges
    }

    pub fn to_ranges(&self) -> &[Interval] {
        &self.to_ranges
    }

    pub fn from_ratio(&self) -> usize {
        self.from_ratio
    }

    pub fn to_ratio(&self) -> usize {
        self.to_ratio
    }

    /// Number of positions on the from side.
    pub fn from_length(&self) -> usize {
        total_width(&self.from_ranges)
    }

    pub fn to_length(&self) -> usize {
        total_width(&self.to_ranges)
    }

    /// A 1:1 mapping of one range onto the same range.
    pub fn is_trivial(&self) -> bool {
        self.from_ratio == 1
            && self.to_ratio == 1
            && self.from_ranges.len() == 1
            && self.from_ranges == self.to_ranges
    }

    /// The same correspondence read from the other side.
    pub fn inverse(&self) -> MapList {
        MapList {
            from_ranges: self.to_ranges.clone(),
            to_ranges: self.from_ranges.clone(),
            from_ratio: self.to_ratio,
            to_ratio: self.from_ratio,
        }
    }

    /// First to-position of the unit holding from-position `pos`, with the
    /// offset of `pos` inside its unit (e.g. the codon position).
    pub fn shift_from(&self, pos: usize) -> Option<(usize, usize)> {
        let offset = offset_of(&self.from_ranges, pos)?;
        let to = position_at(&self.to_ranges, offset / self.from_ratio * self.to_ratio)?;
        Some((to, offset % self.from_ratio))
    }

    /// Inverse of [`MapList::shift_from`].
    pub fn shift_to(&self, pos: usize) -> Option<(usize, usize)> {
        self.inverse().shift_from(pos)
    }

    /// To-side positions of the from-side range `[begin, end]`; empty when
    /// either end is unmapped.
    pub fn locate_in_to(&self, begin: usize, end: usize) -> Vec<Interval> {
        project(&self.from_ranges, self.from_ratio, &self.to_ranges, self.to_ratio, begin, end)
    }

    /// From-side positions of the to-side range `[begin, end]`.
    pub fn locate_in_from(&self, begin: usize, end: usize) -> Vec<Interval> {
        project(&self.to_ranges, self.to_ratio, &self.from_ranges, self.from_ratio, begin, end)
    }
}

/// Handle of a registered mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MappingId(usize);

/// A mapping between two dataset sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMapping {
    pub from: DatasetId,
    pub to: DatasetId,
    pub map: MapList,
}

impl SequenceMapping {
    pub fn involves(&self, seq: DatasetId) -> bool {
        self.from == seq || self.to == seq
    }
}

/// A range of positions in a mapped sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedRange {
    pub sequence: DatasetId,
    pub begin: usize,
    pub end: usize,
}

/// Every registered mapping, indexed by both endpoints.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: Vec<Option<SequenceMapping>>,
    by_sequence: HashMap<DatasetId, Vec<MappingId>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapping; an identical registration returns the existing
    /// handle.
    pub fn add_mapping(&mut self, from: DatasetId, to: DatasetId, map: MapList) -> MappingId {
        let mapping = SequenceMapping { from, to, map };
        if let Some((id, _)) = self.mappings_for(from).into_iter().find(|(_, m)| **m == mapping) {
            return id;
        }
        let id = MappingId(self.mappings.len());
        self.mappings.push(Some(mapping));
        self.by_sequence.entry(from).or_default().push(id);
        if to != from {
            self.by_sequence.entry(to).or_default().push(id);
        }
        debug!("registered mapping {id:?} between {from:?} and {to:?}");
        id
    }

    /// Registers a mapping between the dataset sequences behind two aligned
    /// rows.
    pub fn add_aligned_mapping(&mut self, from: &Sequence, to: &Sequence, map: MapList) -> MappingResult<MappingId> {
        let from_ds = from.dataset().ok_or_else(|| MappingError::NoDataset(from.id.clone()))?;
        let to_ds = to.dataset().ok_or_else(|| MappingError::NoDataset(to.id.clone()))?;
        Ok(self.add_mapping(from_ds, to_ds, map))
    }

    pub fn get(&self, id: MappingId) -> Option<&SequenceMapping> {
        self.mappings.get(id.0).and_then(Option::as_ref)
    }

    /// Unregisters a mapping.
    pub fn remove_mapping(&mut self, id: MappingId) -> Option<SequenceMapping> {
        let mapping = self.mappings.get_mut(id.0)?.take()?;
        for seq in [mapping.from, mapping.to] {
            if let Some(ids) = self.by_sequence.get_mut(&seq) {
                ids.retain(|&other| other != id);
                if ids.is_empty() {
                    self.by_sequence.remove(&seq);
                }
            }
        }
        Some(mapping)
    }

    /// Unregisters every mapping involving `seq`.
    pub fn remove_mappings_for(&mut self, seq: DatasetId) -> Vec<SequenceMapping> {
        let ids = self.by_sequence.get(&seq).cloned().unwrap_or_default();
        ids.into_iter().filter_map(|id| self.remove_mapping(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.mappings.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sequence.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MappingId, &SequenceMapping)> {
        self.mappings
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.as_ref().map(|m| (MappingId(i), m)))
    }

    /// True when `seq` is an endpoint of some mapping.
    pub fn involves(&self, seq: DatasetId) -> bool {
        self.by_sequence.contains_key(&seq)
    }

    /// Distinct mappings having `seq` as an endpoint.
    pub fn mappings_for(&self, seq: DatasetId) -> Vec<(MappingId, &SequenceMapping)> {
        self.by_sequence
            .get(&seq)
            .map(|ids| ids.iter().filter_map(|&id| self.get(id).map(|m| (id, m))).collect())
            .unwrap_or_default()
    }

    /// Ranges corresponding to position `pos` of `seq` in every sequence
    /// mapped to it.
    pub fn map_position(&self, seq: DatasetId, pos: usize) -> Vec<MappedRange> {
        self.map_range(seq, pos, pos)
    }

    /// Ranges corresponding to `[begin, end]` of `seq`.
    pub fn map_range(&self, seq: DatasetId, begin: usize, end: usize) -> Vec<MappedRange> {
        let mut out = Vec::new();
        for (_, m) in self.mappings_for(seq) {
            if m.from == seq {
                out.extend(m.map.locate_in_to(begin, end).into_iter().map(|iv| MappedRange {
                    sequence: m.to,
                    begin: iv.begin,
                    end: iv.end,
                }));
            }
            if m.to == seq {
                out.extend(m.map.locate_in_from(begin, end).into_iter().map(|iv| MappedRange {
                    sequence: m.from,
                    begin: iv.begin,
                    end: iv.end,
                }));
            }
        }
        out
    }

    /// The three nucleotides encoding residue `residue` of `protein`, from
    /// every mapping that resolves to exactly three positions.
    pub fn mapped_codons(&self, protein: DatasetId, residue: usize, store: &DatasetStore) -> Vec<[u8; 3]> {
        let mut codons = Vec::new();
        for (id, m) in self.mappings_for(protein) {
            let (nucleotide, ranges) = if m.to == protein {
                (m.from, m.map.locate_in_from(residue, residue))
            } else {
                (m.to, m.map.locate_in_to(residue, residue))
            };
            let positions: Vec<usize> = ranges.iter().flat_map(Interval::positions).collect();
            let Ok(positions) = <[usize; 3]>::try_from(positions) else {
                debug!("mapping {id:?} does not resolve residue {residue} to a codon");
                continue;
            };
            let Some(ds) = store.get(nucleotide) else {
                continue;
            };
            if let (Some(a), Some(b), Some(c)) = (
                ds.residue_at(positions[0]),
                ds.residue_at(positions[1]),
                ds.residue_at(positions[2]),
            ) {
                codons.push([a, b, c]);
            }
        }
        codons
    }

    /// The first codon found by [`MappingRegistry::mapped_codons`].
    pub fn mapped_codon(&self, protein: DatasetId, residue: usize, store: &DatasetStore) -> Option<[u8; 3]> {
        self.mapped_codons(protein, residue, store).into_iter().next()
    }

    /// Columns of `to` corresponding to column `col` of `from`, both aligned
    /// rows. Gap columns and unmapped rows give nothing.
    pub fn map_column(&self, from: &Sequence, col: usize, to: &Sequence) -> Vec<Interval> {
        let (Some(from_ds), Some(to_ds)) = (from.dataset(), to.dataset()) else {
            return Vec::new();
        };
        if from.char_at(col).map_or(true, is_gap) {
            return Vec::new();
        }
        let residue = from.find_position(col);
        let mut columns: Vec<usize> = self
            .map_position(from_ds, residue)
            .into_iter()
            .filter(|r| r.sequence == to_ds)
            .flat_map(|r| r.begin..=r.end)
            .filter(|&pos| pos >= to.start() && pos <= to.end())
            .map(|pos| to.find_index(pos))
            .filter(|&c| c < to.len())
            .collect();
        columns.sort_unstable();
        columns.dedup();

        let mut runs: Vec<Interval> = Vec::new();
        for c in columns {
            match runs.last_mut() {
                Some(run) if run.end + 1 == c => run.end = c,
                _ => runs.push(Interval::single(c)),
            }
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codon_map() -> MapList {
        MapList::new(&[(1, 12)], &[(1, 4)], 3, 1).unwrap()
    }

    #[test]
    fn test_invalid_maps() {
        assert_eq!(
            MapList::new(&[(1, 3)], &[(1, 1)], 0, 1),
            Err(MappingError::InvalidRatio { from: 0, to: 1 })
        );
        assert_eq!(
            MapList::new(&[(5, 3)], &[(1, 1)], 3, 1),
            Err(MappingError::InvalidRange { begin: 5, end: 3 })
        );
        assert_eq!(MapList::new(&[], &[(1, 1)], 1, 1), Err(MappingError::EmptyRanges));
    }

    #[test]
    fn test_codon_positions_share_a_residue() {
        let map = codon_map();
        assert_eq!(map.locate_in_to(4, 4), vec![Interval::single(2)]);
        assert_eq!(map.locate_in_to(5, 5), vec![Interval::single(2)]);
        assert_eq!(map.locate_in_to(6, 6), vec![Interval::single(2)]);
        assert_eq!(map.shift_from(5), Some((2, 1)));
        assert_eq!(map.locate_in_from(2, 2), vec![Interval::new(4, 6)]);
        assert_eq!(map.locate_in_from(2, 3), vec![Interval::new(4, 9)]);
    }

    #[test]
    fn test_unmapped_positions() {
        let map = codon_map();
        assert!(map.locate_in_to(13, 13).is_empty());
        assert!(map.locate_in_from(0, 0).is_empty());
        assert_eq!(map.shift_from(40), None);
    }

    #[test]
    fn test_spliced_mapping() {
        // exon 1: 10-14, exon 2: 20-23 -> 3 residues
        let map = MapList::new(&[(10, 14), (20, 23)], &[(1, 3)], 3, 1).unwrap();
        assert_eq!(map.from_length(), 9);
        assert_eq!(map.locate_in_from(2, 2), vec![Interval::new(13, 14), Interval::new(20, 20)]);
        assert_eq!(map.locate_in_to(21, 21), vec![Interval::single(3)]);
        assert_eq!(map.shift_to(3), Some((21, 0)));
    }

    #[test]
    fn test_boundary_tie_goes_to_earlier_segment() {
        let map = MapList::new(&[(1, 3), (3, 5)], &[(10, 15)], 1, 1).unwrap();
        assert_eq!(map.locate_in_to(3, 3), vec![Interval::single(12)]);
    }

    #[test]
    fn test_trivial_and_inverse() {
        let map = MapList::new(&[(1, 10)], &[(1, 10)], 1, 1).unwrap();
        assert!(map.is_trivial());
        assert!(!codon_map().is_trivial());
        let inv = codon_map().inverse();
        assert_eq!(inv.from_ratio(), 1);
        assert_eq!(inv.to_ratio(), 3);
        assert_eq!(inv.locate_in_to(3, 3), vec![Interval::new(7, 9)]);
    }

    #[test]
    fn test_maplist_serde_round_trip() {
        let map = MapList::new(&[(10, 14), (20, 23)], &[(1, 3)], 3, 1).unwrap();
        let json = serde_json::to_string(&map).unwrap();
        let back: MapList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);

        let bad = r#"{"from_ranges":[[1,3]],"to_ranges":[[1,1]],"from_ratio":0,"to_ratio":1}"#;
        assert!(serde_json::from_str::<MapList>(bad).is_err());
    }

    fn registry_with_cdna() -> (DatasetStore, MappingRegistry, DatasetId, DatasetId) {
        let mut store = DatasetStore::new();
        let dna = store.add("dna", b"ATGAAACCCTGA".to_vec(), 1);
        let pep = store.add("pep", b"MKP*".to_vec(), 1);
        let mut registry = MappingRegistry::new();
        registry.add_mapping(dna, pep, codon_map());
        (store, registry, dna, pep)
    }

    #[test]
    fn test_registry_lookup_by_either_end() {
        let (mut store, registry, dna, pep) = registry_with_cdna();
        let other = store.add("unmapped", b"ACGT".to_vec(), 1);

        assert!(registry.involves(dna));
        assert!(registry.involves(pep));
        assert!(!registry.involves(other));
        assert!(registry.map_position(other, 1).is_empty());

        let hits = registry.map_position(dna, 5);
        assert_eq!(hits, vec![MappedRange { sequence: pep, begin: 2, end: 2 }]);
        let hits = registry.map_position(pep, 3);
        assert_eq!(hits, vec![MappedRange { sequence: dna, begin: 7, end: 9 }]);
        assert_eq!(registry.map_range(pep, 1, 2)[0].end, 6);
    }

    #[test]
    fn test_duplicate_registration_is_shared() {
        let (_, mut registry, dna, pep) = registry_with_cdna();
        let again = registry.add_mapping(dna, pep, codon_map());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.mappings_for(dna).len(), 1);
        assert_eq!(registry.get(again).unwrap().to, pep);
    }

    #[test]
    fn test_mapped_codon() {
        let (store, registry, _, pep) = registry_with_cdna();
        assert_eq!(registry.mapped_codon(pep, 1, &store), Some(*b"ATG"));
        assert_eq!(registry.mapped_codon(pep, 3, &store), Some(*b"CCC"));
        assert_eq!(registry.mapped_codon(pep, 9, &store), None);
    }

    #[test]
    fn test_mapped_codon_needs_three_positions() {
        let mut store = DatasetStore::new();
        let a = store.add("a", b"ACGT".to_vec(), 1);
        let b = store.add("b", b"ACGT".to_vec(), 1);
        let mut registry = MappingRegistry::new();
        registry.add_mapping(a, b, MapList::new(&[(1, 4)], &[(1, 4)], 1, 1).unwrap());
        assert_eq!(registry.mapped_codon(b, 2, &store), None);

        // mapping points past the stored residues
        let short = store.add("short", b"AT".to_vec(), 1);
        let p = store.add("p", b"M".to_vec(), 1);
        registry.add_mapping(short, p, MapList::new(&[(1, 3)], &[(1, 1)], 3, 1).unwrap());
        assert_eq!(registry.mapped_codon(p, 1, &store), None);
    }

    #[test]
    fn test_remove_mappings() {
        let (_, mut registry, dna, pep) = registry_with_cdna();
        let removed = registry.remove_mappings_for(pep);
        assert_eq!(removed.len(), 1);
        assert!(!registry.involves(dna));
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_aligned_mapping_needs_dataset() {
        let mut registry = MappingRegistry::new();
        let dna = Sequence::new("dna", "ATG");
        let pep = Sequence::new("pep", "M");
        let map = MapList::new(&[(1, 3)], &[(1, 1)], 3, 1).unwrap();
        assert_eq!(
            registry.add_aligned_mapping(&dna, &pep, map),
            Err(MappingError::NoDataset("dna".to_string()))
        );
    }

    #[test]
    fn test_map_column_between_aligned_rows() {
        let mut store = DatasetStore::new();
        let mut dna = Sequence::new("dna", "ATG--AAACCC");
        let mut pep = Sequence::new("pep", "M-K-P");
        dna.create_dataset_sequence(&mut store);
        pep.create_dataset_sequence(&mut store);
        let mut registry = MappingRegistry::new();
        let map = MapList::new(&[(1, 9)], &[(1, 3)], 3, 1).unwrap();
        registry.add_aligned_mapping(&dna, &pep, map).unwrap();

        // column 6 is the second A of AAA -> K in column 2
        assert_eq!(registry.map_column(&dna, 6, &pep), vec![Interval::single(2)]);
        // K back to the three AAA columns
        assert_eq!(registry.map_column(&pep, 2, &dna), vec![Interval::new(5, 7)]);
        // codon split by gaps
        let mut split = Sequence::new("dna", "AT-G--AAACCC");
        split.set_dataset(dna.dataset());
        assert_eq!(
            registry.map_column(&pep, 0, &split),
            vec![Interval::new(0, 1), Interval::single(3)]
        );
        assert!(registry.map_column(&dna, 3, &pep).is_empty());
        assert!(registry.map_column(&pep, 1, &dna).is_empty());
    }
}
