//! Genetic codes and nucleotide translation.
//!
//! Holds the NCBI translation tables (1-33) as 64-byte strings in NCBI
//! codon order (TTT, TTC, TTA, TTG, TCT, ...), translates codons and whole
//! reading frames, and translates an aligned cDNA row into a peptide whose
//! residues stay linked to their codons through a 3:1 [`MapList`].

use log::debug;

use crate::dataset::DatasetStore;
use crate::mapping::{MapList, MappingError, MappingRegistry, MappingResult};
use crate::model::{is_gap, Sequence};

/// NCBI id, name and amino acid string of every supported table.
const NCBI_TABLES: &[(u8, &str, &[u8; 64])] = &[
    (1, "Standard", b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (2, "Vertebrate Mitochondrial", b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSS**VVVVAAAADDEEGGGG"),
    (3, "Yeast Mitochondrial", b"FFLLSSSSYY**CCWWTTTTPPPPHHQQRRRRIIMMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (4, "Mold/Protozoan/Coelenterate Mito...", b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (5, "Invertebrate Mitochondrial", b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSSSVVVVAAAADDEEGGGG"),
    (6, "Ciliate/Dasycladacean/Hexamita Nuclear", b"FFLLSSSSYYQQCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (9, "Echinoderm/Flatworm Mitochondrial", b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
    (10, "Euplotid Nuclear", b"FFLLSSSSYY**CCCWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (11, "Bacterial/Archaeal/Plant Plastid", b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (12, "Alternative Yeast Nuclear", b"FFLLSSSSYY**CC*WLLLSPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (13, "Ascidian Mitochondrial", b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNKKSSGGVVVVAAAADDEEGGGG"),
    (14, "Alternative Flatworm Mitochondrial", b"FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
    (15, "Blepharisma Macronuclear", b"FFLLSSSSYY*QCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (16, "Chlorophycean Mitochondrial", b"FFLLSSSSYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (21, "Trematode Mitochondrial", b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIMMTTTTNNNKSSSSVVVVAAAADDEEGGGG"),
    (22, "Scenedesmus obliquus Mitochondrial", b"FFLLSS*SYY*LCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (23, "Thraustochytrium Mitochondrial", b"FF*LSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (24, "Rhabdopleuridae Mitochondrial", b"FFLLSSSSYY**CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSKVVVVAAAADDEEGGGG"),
    (25, "Candidate Division SR1/Gracilibacteria", b"FFLLSSSSYY**CCGWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (26, "Pachysolen tannophilus Nuclear", b"FFLLSSSSYY**CC*WLLLAPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (27, "Karyorelict Nuclear", b"FFLLSSSSYYQQCCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (28, "Condylostoma Nuclear", b"FFLLSSSSYYQQCCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (29, "Mesodinium Nuclear", b"FFLLSSSSYYYYCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (30, "Peritrich Nuclear", b"FFLLSSSSYYEECC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (31, "Blastocrithidia Nuclear", b"FFLLSSSSYYEECCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (32, "Balanophoraceae Plastid", b"FFLLSSSSYY*WCC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG"),
    (33, "Cephalodiscidae Mitochondrial", b"FFLLSSSSYYY*CCWWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSSKVVVVAAAADDEEGGGG"),
];

/// Position of a nucleotide in NCBI codon order.
fn base_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

/// A genetic code table for translating codons to amino acids.
#[derive(Debug, Clone)]
pub struct GeneticCode {
    /// NCBI genetic code ID
    pub id: u8,
    pub name: &'static str,
    table: &'static [u8; 64],
}

impl GeneticCode {
    /// Translates a single codon to an amino acid.
    ///
    /// - all gaps or frameshifts (`---`, `!!!`) give `-`
    /// - gaps or frameshifts mixed with nucleotides (`C-T`, `A!G`) give `!`
    /// - ambiguous nucleotides, or anything that is not three characters, give `X`
    /// - `U` reads as `T` and case is ignored
    pub fn translate_codon(&self, codon: &[u8]) -> u8 {
        let [a, b, c] = codon else {
            return b'X';
        };
        let broken = |x: u8| is_gap(x) || x == b'!';
        match [*a, *b, *c].iter().filter(|&&x| broken(x)).count() {
            3 => return b'-',
            0 => {}
            _ => return b'!',
        }
        match (base_index(*a), base_index(*b), base_index(*c)) {
            (Some(i), Some(j), Some(k)) => self.table[i * 16 + j * 4 + k],
            _ => b'X',
        }
    }

    /// Translates a nucleotide sequence read from `frame` (0, 1 or 2).
    /// A trailing partial codon is not translated.
    pub fn translate_sequence(&self, sequence: &[u8], frame: usize) -> Vec<u8> {
        sequence
            .get(frame.min(2)..)
            .unwrap_or_default()
            .chunks_exact(3)
            .map(|codon| self.translate_codon(codon))
            .collect()
    }
}

/// All available genetic codes from NCBI.
#[derive(Debug, Clone)]
pub struct GeneticCodes {
    codes: Vec<GeneticCode>,
}

impl GeneticCodes {
    /// Creates the complete set of NCBI genetic codes.
    pub fn new() -> Self {
        let codes = NCBI_TABLES
            .iter()
            .map(|&(id, name, table)| GeneticCode { id, name, table })
            .collect();
        Self { codes }
    }

    pub fn all(&self) -> &[GeneticCode] {
        &self.codes
    }

    /// Gets a genetic code by NCBI id.
    pub fn get(&self, id: u8) -> Option<&GeneticCode> {
        self.codes.iter().find(|c| c.id == id)
    }

    /// The standard code (table 1, first in the list).
    pub fn default_code(&self) -> &GeneticCode {
        &self.codes[0]
    }
}

impl Default for GeneticCodes {
    fn default() -> Self {
        Self::new()
    }
}

/// Translates the residues of `cdna` from `frame` into a peptide row.
///
/// Both rows get dataset sequences, and a 3:1 mapping from the translated
/// nucleotides to the peptide residues is registered so codons can be
/// recovered later with [`MappingRegistry::mapped_codon`].
pub fn translate_cdna(
    cdna: &mut Sequence,
    code: &GeneticCode,
    frame: usize,
    store: &mut DatasetStore,
    registry: &mut MappingRegistry,
) -> MappingResult<Sequence> {
    let frame = frame.min(2);
    let residues = cdna.ungapped();
    let codons = residues.len().saturating_sub(frame) / 3;
    if codons == 0 {
        return Err(MappingError::TooShortToTranslate {
            name: cdna.id.clone(),
            length: residues.len(),
        });
    }

    let peptide_residues = code.translate_sequence(&residues, frame);
    let mut peptide = Sequence::from_bytes(cdna.id.clone(), peptide_residues);
    let first = cdna.start() + frame;
    let map = MapList::new(&[(first, first + 3 * codons - 1)], &[(1, codons)], 3, 1)?;

    cdna.create_dataset_sequence(store);
    peptide.create_dataset_sequence(store);
    registry.add_aligned_mapping(cdna, &peptide, map)?;
    debug!("{}: translated {} codons with table {}", cdna.id, codons, code.id);
    Ok(peptide)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_code_translation() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();
        assert_eq!(standard.id, 1);

        assert_eq!(standard.translate_codon(b"ATG"), b'M');
        assert_eq!(standard.translate_codon(b"TAA"), b'*');
        assert_eq!(standard.translate_codon(b"TAG"), b'*');
        assert_eq!(standard.translate_codon(b"TGA"), b'*');
        assert_eq!(standard.translate_codon(b"TTT"), b'F');
        assert_eq!(standard.translate_codon(b"GGG"), b'G');
    }

    #[test]
    fn test_rna_and_case() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();
        assert_eq!(standard.translate_codon(b"AUG"), b'M');
        assert_eq!(standard.translate_codon(b"uuu"), b'F');
        assert_eq!(standard.translate_codon(b"AtG"), b'M');
    }

    #[test]
    fn test_gap_handling() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();

        assert_eq!(standard.translate_codon(b"---"), b'-');
        assert_eq!(standard.translate_codon(b"!!!"), b'-');
        assert_eq!(standard.translate_codon(b"-.-"), b'-');

        assert_eq!(standard.translate_codon(b"A--"), b'!');
        assert_eq!(standard.translate_codon(b"AT."), b'!');
        assert_eq!(standard.translate_codon(b"A!G"), b'!');
    }

    #[test]
    fn test_ambiguous_nucleotides() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();
        assert_eq!(standard.translate_codon(b"ATN"), b'X');
        assert_eq!(standard.translate_codon(b"CTR"), b'X');
        assert_eq!(standard.translate_codon(b"AT"), b'X');
    }

    #[test]
    fn test_sequence_translation_frames() {
        let codes = GeneticCodes::new();
        let standard = codes.default_code();

        assert_eq!(standard.translate_sequence(b"ATGTTTTAG", 0), b"MF*");
        let seq = b"AATGTTTTAG";
        assert_eq!(standard.translate_sequence(seq, 0), b"NVL");
        assert_eq!(standard.translate_sequence(seq, 1), b"MF*");
        assert_eq!(standard.translate_sequence(seq, 2), b"CF");
        assert!(standard.translate_sequence(b"A", 2).is_empty());
    }

    #[test]
    fn test_tables() {
        let codes = GeneticCodes::new();
        assert_eq!(codes.all().len(), 27);
        assert_eq!(codes.get(2).unwrap().translate_codon(b"TGA"), b'W');
        assert_eq!(codes.get(6).unwrap().translate_codon(b"TAA"), b'Q');
        assert!(codes.get(7).is_none());
        assert!(codes.get(33).is_some());
    }

    #[test]
    fn test_translate_cdna_registers_codons() {
        let codes = GeneticCodes::new();
        let mut store = DatasetStore::new();
        let mut registry = MappingRegistry::new();
        let mut cdna = Sequence::new("gene", "C-ATG--AAACCCT");

        let peptide = translate_cdna(&mut cdna, codes.default_code(), 1, &mut store, &mut registry).unwrap();
        assert_eq!(peptide.to_string(), "MKP");
        assert_eq!(store.len(), 2);
        assert_eq!(registry.len(), 1);

        let pep_ds = peptide.dataset().unwrap();
        assert_eq!(registry.mapped_codon(pep_ds, 2, &store), Some(*b"AAA"));

        // K sits in column 1 of the peptide, AAA in columns 7-9 of the cDNA row
        assert_eq!(registry.map_column(&peptide, 1, &cdna), vec![crate::interval::Interval::new(7, 9)]);
    }

    #[test]
    fn test_translate_cdna_too_short() {
        let codes = GeneticCodes::new();
        let mut store = DatasetStore::new();
        let mut registry = MappingRegistry::new();
        let mut cdna = Sequence::new("tiny", "A-TG");

        let err = translate_cdna(&mut cdna, codes.default_code(), 1, &mut store, &mut registry).unwrap_err();
        assert_eq!(err, MappingError::TooShortToTranslate { name: "tiny".to_string(), length: 3 });
        assert!(store.is_empty());
        assert!(registry.is_empty());
    }
}
