/// Query genes in island order
use anyhow::Result;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::BlockError;
use crate::input::{is_skippable, open_text_input, split_fields};

/// A gene of a query island or reference genome. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gene {
    pub id: String,
    pub ordinal: usize, // 0-based position within its genome
    pub start: u64,
    pub end: u64,
    pub accession: String,
}

/// The ordered gene list of one query island
#[derive(Debug, Clone)]
pub struct QueryGeneList {
    accession: String,
    genes: Vec<Gene>,
    by_id: HashMap<String, usize>,
}

impl QueryGeneList {
    /// Build from genes already in island order; ordinals are reassigned
    pub fn from_genes(accession: &str, genes: Vec<Gene>) -> Result<Self, BlockError> {
        let mut by_id = HashMap::with_capacity(genes.len());
        let mut ordered = Vec::with_capacity(genes.len());

        for (ordinal, mut gene) in genes.into_iter().enumerate() {
            if by_id.insert(gene.id.clone(), ordinal).is_some() {
                return Err(BlockError::DuplicateGene {
                    gene: gene.id,
                    genome: accession.to_string(),
                });
            }
            gene.ordinal = ordinal;
            ordered.push(gene);
        }

        Ok(QueryGeneList {
            accession: accession.to_string(),
            genes: ordered,
            by_id,
        })
    }

    /// Read `gene_id start end [accession]` lines; file order is gene order.
    /// Without an accession column the fallback name is used for the island.
    pub fn read<R: BufRead>(reader: R, fallback_accession: &str) -> Result<Self> {
        let mut genes = Vec::new();
        let mut island: Option<String> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if is_skippable(&line) {
                continue;
            }
            let line_no = idx + 1;
            let fields = split_fields(&line);

            if fields.len() < 3 {
                return Err(BlockError::MalformedGeneRecord {
                    line: line_no,
                    reason: format!("expected at least 3 fields, found {}", fields.len()),
                }
                .into());
            }

            let start = parse_coordinate(fields[1], line_no)?;
            let end = parse_coordinate(fields[2], line_no)?;
            let accession = match fields.get(3) {
                Some(acc) if !acc.is_empty() => acc.to_string(),
                _ => fallback_accession.to_string(),
            };
            island.get_or_insert_with(|| accession.clone());

            genes.push(Gene {
                id: fields[0].to_string(),
                ordinal: genes.len(),
                start,
                end,
                accession,
            });
        }

        let accession = island.unwrap_or_else(|| fallback_accession.to_string());
        Ok(Self::from_genes(&accession, genes)?)
    }

    /// Read a gene list file; the file stem names the island when no accession is given
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let stem = query_stem(path);
        let reader = open_text_input(path)?;
        Self::read(reader, &stem)
    }

    pub fn accession(&self) -> &str {
        &self.accession
    }

    pub fn get(&self, ordinal: usize) -> Option<&Gene> {
        self.genes.get(ordinal)
    }

    /// Ordinal of a gene by identifier
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

pub(crate) fn parse_coordinate(field: &str, line: usize) -> Result<u64, BlockError> {
    field.parse::<u64>().map_err(|_| BlockError::MalformedGeneRecord {
        line,
        reason: format!("invalid coordinate '{field}'"),
    })
}

/// Suffixes stripped from input file names, longest first
const QUERY_SUFFIXES: [&str; 5] = [
    ".hits.tsv.bgz",
    ".hits.tsv.gz",
    ".genes.tsv",
    ".hits.tsv",
    ".tsv",
];

/// Query name from a gene list or hit file name, e.g. "NC_000913.3.genes.tsv" -> "NC_000913.3".
/// Dots inside versioned accessions are kept.
pub fn query_stem(path: &Path) -> String {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return "query".to_string();
    };
    QUERY_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(name)
        .to_string()
}
