/// Per-query result record
use serde::Serialize;

use crate::biclique::{BicliqueStats, Clique};
use crate::gene::QueryGeneList;
use crate::hit::{BestHitIndex, HitTable};
use crate::hit_parser::ParseStats;
use crate::interval::Block;
use crate::reference::{ReferenceCatalog, TargetLocus};

/// Run counters surfaced next to the result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub parse: ParseStats,
    pub unplaced_hits: usize,
    pub blocks: usize,
    pub bicliques: BicliqueStats,
}

/// Location of a member block on one supporting genome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetRegion {
    pub accession: String,
    pub first_gene: Option<String>,
    pub last_gene: Option<String>,
    pub span: u32,
    /// Mean identity of each block gene's best hit into this genome
    pub mean_identity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    pub start_index: usize,
    pub end_index: usize,
    pub genes: Vec<String>,
    pub best_evalue: f64,
    pub context_switches: u32,
    pub targets: Vec<TargetRegion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedClique {
    pub rank: usize, // 1-based
    pub score: f64,
    pub genomes: Vec<String>,
    pub blocks: Vec<BlockSummary>,
}

/// Ranked cliques of one query island plus the summary figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub accession: String,
    pub num_of_cliques: usize,
    #[serde(rename = "numOfBlocks")]
    pub num_of_blocks: usize,
    #[serde(rename = "avgBlockPerClique")]
    pub avg_block_per_clique: f64,
    pub max_pval: f64,
    pub context_switch: u64,
    pub cliques: Vec<RankedClique>,
    pub diagnostics: Diagnostics,
}

impl RankedResult {
    /// A query with no surviving clique (not a failure)
    pub fn is_empty(&self) -> bool {
        self.num_of_cliques == 0
    }
}

pub struct ResultAssembler<'a> {
    genes: &'a QueryGeneList,
    reference: &'a ReferenceCatalog,
    hits: &'a HitTable,
    best: &'a BestHitIndex,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(
        genes: &'a QueryGeneList,
        reference: &'a ReferenceCatalog,
        hits: &'a HitTable,
        best: &'a BestHitIndex,
    ) -> Self {
        ResultAssembler {
            genes,
            reference,
            hits,
            best,
        }
    }

    /// Fold ranked cliques into the result record
    pub fn assemble(
        &self,
        cliques: &[Clique],
        blocks: &[Block],
        diagnostics: Diagnostics,
    ) -> RankedResult {
        let num_of_cliques = cliques.len();
        let num_of_blocks: usize = cliques.iter().map(|c| c.num_blocks()).sum();
        let avg_block_per_clique = if num_of_cliques == 0 {
            0.0
        } else {
            num_of_blocks as f64 / num_of_cliques as f64
        };
        let max_pval = cliques
            .iter()
            .map(|c| c.score)
            .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
            .unwrap_or(0.0);
        let context_switch = cliques
            .iter()
            .flat_map(|c| c.blocks.iter())
            .map(|&id| blocks[id].context_switches as u64)
            .sum();

        let ranked = cliques
            .iter()
            .enumerate()
            .map(|(i, clique)| RankedClique {
                rank: i + 1,
                score: clique.score,
                genomes: clique
                    .support
                    .ids()
                    .iter()
                    .map(|&g| self.reference.accession(g).to_string())
                    .collect(),
                blocks: clique
                    .blocks
                    .iter()
                    .map(|&id| self.summarize(&blocks[id]))
                    .collect(),
            })
            .collect();

        RankedResult {
            accession: self.genes.accession().to_string(),
            num_of_cliques,
            num_of_blocks,
            avg_block_per_clique,
            max_pval,
            context_switch,
            cliques: ranked,
            diagnostics,
        }
    }

    fn summarize(&self, block: &Block) -> BlockSummary {
        let gene_name = |genome, ordinal| {
            self.reference
                .gene(TargetLocus { genome, ordinal })
                .map(|g| g.id.clone())
        };

        BlockSummary {
            start_index: block.start,
            end_index: block.end,
            genes: (block.start..=block.end)
                .filter_map(|i| self.genes.get(i).map(|g| g.id.clone()))
                .collect(),
            best_evalue: block.best_evalue,
            context_switches: block.context_switches,
            targets: block
                .spans
                .iter()
                .map(|span| {
                    let accession = self.reference.accession(span.genome);
                    TargetRegion {
                        accession: accession.to_string(),
                        first_gene: gene_name(span.genome, span.first),
                        last_gene: gene_name(span.genome, span.last),
                        span: span.span(),
                        mean_identity: self.mean_identity(block, accession),
                    }
                })
                .collect(),
        }
    }

    fn mean_identity(&self, block: &Block, accession: &str) -> Option<f64> {
        let identities: Vec<f64> = (block.start..=block.end)
            .filter_map(|gene| self.best.get(self.hits, gene, accession))
            .map(|hit| hit.identity)
            .collect();
        if identities.is_empty() {
            None
        } else {
            Some(identities.iter().sum::<f64>() / identities.len() as f64)
        }
    }
}
