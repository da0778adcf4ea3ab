//! alnview - alignment column and row ledger driver
//!
//! Builds an alignment from `NAME=SEQUENCE` arguments, applies hiding and
//! editing operations, and writes the visible alignment.
//!
//! ## Usage
//!
//! ```bash
//! alnview s1=AC-GT s2=ACTGT --hide-columns 2-3
//! alnview s1=ATGAAACCC -t --codon 2
//! alnview s1=A--C s2=A--G --remove-gapped-columns -f plain
//! ```

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};

use alnview::dataset::DatasetStore;
use alnview::genetic_code::{translate_cdna, GeneticCodes};
use alnview::mapping::MappingRegistry;
use alnview::model::{Alignment, Sequence, DEFAULT_GAP};
use alnview::view::AlignmentView;

/// Output layout
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// `>name` header then the row
    Fasta,
    /// One row per line, no names
    Plain,
}

/// alnview - hide, reveal and edit alignment columns and rows
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Alignment rows as NAME=SEQUENCE
    #[arg(required = true)]
    rows: Vec<String>,

    /// Hide a 1-based column or column range such as 5 or 2-4 (repeatable)
    #[arg(long = "hide-columns", value_name = "RANGE")]
    hide_columns: Vec<String>,

    /// Hide the row with this name (repeatable)
    #[arg(long = "hide-row", value_name = "NAME")]
    hide_rows: Vec<String>,

    /// Remove columns that are gaps in every row
    #[arg(long = "remove-gapped-columns")]
    remove_gapped_columns: bool,

    /// Translate nucleotide rows to amino acids
    #[arg(short = 't', long = "translate")]
    translate: bool,

    /// Genetic code for translation (1-33, default: 1 = Standard)
    #[arg(short = 'g', long = "genetic-code", default_value = "1")]
    genetic_code: u8,

    /// Reading frame for translation (1-3)
    #[arg(short = 'r', long = "reading-frame", default_value = "1")]
    reading_frame: u8,

    /// With --translate, print the codon behind this 1-based residue of
    /// every row instead of the alignment
    #[arg(long = "codon", value_name = "RESIDUE", requires = "translate")]
    codon: Option<usize>,

    #[arg(short = 'f', long = "format", value_enum, default_value = "fasta")]
    format: FormatArg,

    /// Output file. Use "-" for stdout.
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: String,

    /// Log ledger operations to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn parse_row(arg: &str) -> Result<Sequence> {
    let Some((name, data)) = arg.split_once('=') else {
        bail!("Row must be NAME=SEQUENCE (got {arg:?})");
    };
    if name.is_empty() {
        bail!("Row name is empty in {arg:?}");
    }
    Ok(Sequence::new(name, data))
}

/// Parses a 1-based `N` or `N-M` into 0-based inclusive columns.
fn parse_column_range(arg: &str) -> Result<(usize, usize)> {
    let (first, last) = arg.split_once('-').unwrap_or((arg, arg));
    let first: usize = first.trim().parse().with_context(|| format!("Invalid column range {arg:?}"))?;
    let last: usize = last.trim().parse().with_context(|| format!("Invalid column range {arg:?}"))?;
    if first == 0 || last == 0 {
        bail!("Columns are numbered from 1 (got {arg:?})");
    }
    Ok((first.min(last) - 1, first.max(last) - 1))
}

/// Translates every row, padding the peptides to a common width.
fn translate_rows(
    rows: &mut [Sequence],
    genetic_code: u8,
    frame: usize,
    store: &mut DatasetStore,
    registry: &mut MappingRegistry,
) -> Result<Vec<Sequence>> {
    let codes = GeneticCodes::new();
    let code = codes
        .get(genetic_code)
        .ok_or_else(|| anyhow::anyhow!("Unknown genetic code: {}", genetic_code))?;

    let mut peptides = rows
        .iter_mut()
        .map(|row| translate_cdna(row, code, frame, store, registry))
        .collect::<Result<Vec<_>, _>>()?;
    let width = peptides.iter().map(Sequence::len).max().unwrap_or(0);
    for p in &mut peptides {
        p.pad_to(width, DEFAULT_GAP);
    }
    info!("translated {} rows with genetic code {}", peptides.len(), code.id);
    Ok(peptides)
}

fn write_output(output: &str, lines: &[String]) -> Result<()> {
    if output == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for line in lines {
            writeln!(handle, "{line}")?;
        }
    } else {
        let mut file = std::fs::File::create(output).with_context(|| format!("Cannot create {output}"))?;
        for line in lines {
            writeln!(file, "{line}")?;
        }
        eprintln!("Wrote {} lines to {}", lines.len(), output);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if args.verbose {
        "debug"
    } else {
        "warn"
    }))
    .init();

    // Validate reading frame (1-3)
    if args.reading_frame < 1 || args.reading_frame > 3 {
        bail!("Reading frame must be 1-3 (got {})", args.reading_frame);
    }

    // Validate genetic code (1-33, with some gaps)
    if args.genetic_code < 1 || args.genetic_code > 33 {
        bail!("Genetic code must be 1-33 (got {})", args.genetic_code);
    }

    let mut rows = args.rows.iter().map(|r| parse_row(r)).collect::<Result<Vec<_>>>()?;
    let hidden_columns = args
        .hide_columns
        .iter()
        .map(|r| parse_column_range(r))
        .collect::<Result<Vec<_>>>()?;

    let mut store = DatasetStore::new();
    let mut registry = MappingRegistry::new();
    if args.translate {
        let frame = (args.reading_frame - 1) as usize;
        let peptides = translate_rows(&mut rows, args.genetic_code, frame, &mut store, &mut registry)?;

        if let Some(residue) = args.codon {
            let mut lines = Vec::with_capacity(peptides.len());
            for p in &peptides {
                let codon = p
                    .dataset()
                    .and_then(|ds| registry.mapped_codon(ds, residue, &store))
                    .map_or_else(|| "NA".to_string(), |c| String::from_utf8_lossy(&c).into_owned());
                lines.push(format!("{}\t{}\t{}", p.id, residue, codon));
            }
            return write_output(&args.output, &lines);
        }
        rows = peptides;
    }

    let mut view = AlignmentView::new(Alignment::new(rows));
    if args.remove_gapped_columns {
        view.remove_gapped_columns()?;
    }
    for name in &args.hide_rows {
        let Some(index) = view.alignment().sequences().iter().position(|s| &s.id == name) else {
            bail!("No visible row named {name}");
        };
        view.hide_sequence(index);
    }
    for &(first, last) in &hidden_columns {
        debug!("hiding columns {first}-{last}");
        view.hide_columns(first, last);
    }

    let visible = view.visible_sequence_strings();
    let lines: Vec<String> = match args.format {
        FormatArg::Fasta => view
            .alignment()
            .sequences()
            .iter()
            .zip(&visible)
            .flat_map(|(seq, data)| [format!(">{}", seq.id), data.clone()])
            .collect(),
        FormatArg::Plain => visible,
    };
    write_output(&args.output, &lines)
}
