/// Reference-genome metadata: gene order per accession
///
/// Loaded once per run and shared read-only by every query worker.
use anyhow::Result;
use log::debug;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::BlockError;
use crate::gene::{parse_coordinate, Gene};
use crate::input::{is_skippable, open_text_input, split_fields};

/// Dense genome identifier, the position of the genome in its catalog
pub type GenomeId = u32;

/// Location of a target gene on its reference genome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetLocus {
    pub genome: GenomeId,
    pub ordinal: u32,
}

/// Gene order of one reference genome
#[derive(Debug, Clone)]
struct ReferenceGenome {
    accession: String,
    genes: Vec<Gene>,
    ordinal_of: HashMap<String, u32>,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    genomes: Vec<ReferenceGenome>,
    genome_of: HashMap<String, GenomeId>,
}

impl ReferenceCatalog {
    /// Build from `(accession, gene_id, start, end)` entries in any order.
    /// Ordinals are assigned per accession by ascending start coordinate.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, BlockError>
    where
        I: IntoIterator<Item = (S, S, u64, u64)>,
        S: AsRef<str>,
    {
        let mut genome_of: HashMap<String, GenomeId> = HashMap::new();
        // Genomes in first-seen order: (accession, genes)
        let mut pending: Vec<(String, Vec<Gene>)> = Vec::new();

        for (accession, gene_id, start, end) in entries {
            let accession = accession.as_ref();
            let id = match genome_of.get(accession) {
                Some(&id) => id as usize,
                None => {
                    genome_of.insert(accession.to_string(), pending.len() as GenomeId);
                    pending.push((accession.to_string(), Vec::new()));
                    pending.len() - 1
                }
            };
            pending[id].1.push(Gene {
                id: gene_id.as_ref().to_string(),
                ordinal: 0,
                start,
                end,
                accession: accession.to_string(),
            });
        }

        let mut genomes = Vec::with_capacity(pending.len());
        for (accession, mut genes) in pending {
            genes.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.end.cmp(&b.end)));

            let mut ordinal_of = HashMap::with_capacity(genes.len());
            for (ordinal, gene) in genes.iter_mut().enumerate() {
                gene.ordinal = ordinal;
                if ordinal_of.insert(gene.id.clone(), ordinal as u32).is_some() {
                    return Err(BlockError::DuplicateGene {
                        gene: gene.id.clone(),
                        genome: gene.accession.clone(),
                    });
                }
            }
            genomes.push(ReferenceGenome {
                accession,
                genes,
                ordinal_of,
            });
        }

        Ok(ReferenceCatalog { genomes, genome_of })
    }

    /// Read `accession gene_id start end` lines
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut entries = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if is_skippable(&line) {
                continue;
            }
            let line_no = idx + 1;
            let fields = split_fields(&line);
            if fields.len() < 4 {
                return Err(BlockError::MalformedGeneRecord {
                    line: line_no,
                    reason: format!("expected 4 fields, found {}", fields.len()),
                }
                .into());
            }

            let start = parse_coordinate(fields[2], line_no)?;
            let end = parse_coordinate(fields[3], line_no)?;
            entries.push((fields[0].to_string(), fields[1].to_string(), start, end));
        }

        let catalog = Self::from_entries(entries)?;
        debug!(
            "Loaded {} reference genomes, average {:.1} genes",
            catalog.num_genomes(),
            catalog.average_gene_count()
        );
        Ok(catalog)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::read(open_text_input(path)?)
    }

    /// Position of a target gene, if the catalog knows it
    pub fn locate(&self, accession: &str, gene_id: &str) -> Option<TargetLocus> {
        let genome = *self.genome_of.get(accession)?;
        let ordinal = *self.genomes[genome as usize].ordinal_of.get(gene_id)?;
        Some(TargetLocus { genome, ordinal })
    }

    /// Accession of a genome id issued by this catalog
    pub fn accession(&self, genome: GenomeId) -> &str {
        &self.genomes[genome as usize].accession
    }

    /// Gene at an ordinal of a reference genome
    pub fn gene(&self, locus: TargetLocus) -> Option<&Gene> {
        self.genomes
            .get(locus.genome as usize)
            .and_then(|g| g.genes.get(locus.ordinal as usize))
    }

    pub fn gene_count(&self, genome: GenomeId) -> Option<usize> {
        self.genomes.get(genome as usize).map(|g| g.genes.len())
    }

    /// Mean gene count over all reference genomes (0 when empty)
    pub fn average_gene_count(&self) -> f64 {
        if self.genomes.is_empty() {
            return 0.0;
        }
        let total: usize = self.genomes.iter().map(|g| g.genes.len()).sum();
        total as f64 / self.genomes.len() as f64
    }

    pub fn num_genomes(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }
}
