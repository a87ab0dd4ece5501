//! Grouping of blocks into cliques by shared genome support
//!
//! Blocks and genomes form a bipartite incidence graph. Blocks with exactly the
//! same support form one biclique (support class). Classes whose supports are
//! nearly equal are then merged: a class is absorbed by the largest visited
//! root class whose support is a strict superset with at most `merge_slack`
//! extra genomes. The superset keeps its support and takes over the subset's
//! blocks.

use indexmap::IndexMap;
use log::debug;
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::config::BlockConfig;
use crate::interval::{Block, BlockId, GenomeSupport};
use crate::reference::{GenomeId, ReferenceCatalog};
use crate::scoring::RankScorer;
use crate::union_find::UnionFind;

/// A conserved cluster candidate: member blocks plus the support they share
#[derive(Debug, Clone, PartialEq)]
pub struct Clique {
    pub support: GenomeSupport,
    pub blocks: Vec<BlockId>, // ascending, i.e. by start then length
    pub classes: usize,       // support classes merged into this clique
    pub mean_block_len: f64,
    pub best_evalue: f64,
    pub score: f64,
}

impl Clique {
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Start/end of the first member block, the positional tie-break key
    pub fn anchor(&self, blocks: &[Block]) -> (usize, usize) {
        self.blocks
            .first()
            .map(|&id| (blocks[id].start, blocks[id].end))
            .unwrap_or((usize::MAX, usize::MAX))
    }
}

/// Counters from one clique computation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BicliqueStats {
    pub classes: usize,
    pub absorbed: usize,
    pub below_min_genomes: usize,
    pub below_min_rank: usize,
    pub cliques: usize,
}

/// Block x genome incidence, grouped into exact-support classes
#[derive(Debug, Clone, Default)]
pub struct Incidence {
    /// (support, member blocks), in first-seen order
    classes: Vec<(GenomeSupport, Vec<BlockId>)>,
    /// Genome -> classes whose support contains it
    columns: HashMap<GenomeId, Vec<usize>>,
}

impl Incidence {
    pub fn from_blocks(blocks: &[Block]) -> Self {
        let mut classes: IndexMap<GenomeSupport, Vec<BlockId>> = IndexMap::new();
        for (id, block) in blocks.iter().enumerate() {
            classes.entry(block.support.clone()).or_default().push(id);
        }

        let mut columns: HashMap<GenomeId, Vec<usize>> = HashMap::new();
        for (class, support) in classes.keys().enumerate() {
            for &genome in support.ids() {
                columns.entry(genome).or_default().push(class);
            }
        }

        Incidence {
            classes: classes.into_iter().collect(),
            columns,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn support(&self, class: usize) -> &GenomeSupport {
        &self.classes[class].0
    }

    pub fn members(&self, class: usize) -> &[BlockId] {
        &self.classes[class].1
    }

    /// Classes containing every genome of `support`: scans the column of its rarest genome
    pub fn supersets_of(&self, support: &GenomeSupport) -> Vec<usize> {
        let rarest = support
            .ids()
            .iter()
            .filter_map(|g| self.columns.get(g))
            .min_by_key(|column| column.len());

        match rarest {
            Some(column) => column
                .iter()
                .copied()
                .filter(|&c| support.is_subset_of(self.support(c)))
                .collect(),
            None => Vec::new(),
        }
    }
}

pub struct BicliqueComputer<'a> {
    config: &'a BlockConfig,
    scorer: RankScorer<'a>,
}

impl<'a> BicliqueComputer<'a> {
    pub fn new(config: &'a BlockConfig, reference: &'a ReferenceCatalog) -> Self {
        BicliqueComputer {
            config,
            scorer: RankScorer::new(reference, config.max_target_span()),
        }
    }

    /// Group, merge, score, filter and sort. An empty result is a normal outcome.
    pub fn compute(&self, blocks: &[Block]) -> (Vec<Clique>, BicliqueStats) {
        let incidence = Incidence::from_blocks(blocks);
        let mut stats = BicliqueStats {
            classes: incidence.num_classes(),
            ..Default::default()
        };

        let mut uf = self.merge_classes(&incidence, &mut stats);

        let mut cliques = Vec::new();
        for (root, members) in uf.get_sets() {
            let support = incidence.support(root);
            if support.len() < self.config.min_genomes_per_block {
                stats.below_min_genomes += 1;
                continue;
            }

            let mut block_ids: Vec<BlockId> = members
                .iter()
                .flat_map(|&class| incidence.members(class).iter().copied())
                .filter(|&id| blocks[id].len() >= self.config.min_genes_per_interval)
                .collect();
            if block_ids.is_empty() {
                continue;
            }
            block_ids.sort_unstable();

            let clique = self.score_clique(support.clone(), block_ids, members.len(), blocks);
            if clique.score < self.config.min_rank {
                stats.below_min_rank += 1;
                continue;
            }
            cliques.push(clique);
        }

        sort_cliques(&mut cliques, blocks);
        stats.cliques = cliques.len();
        debug!(
            "{} blocks in {} support classes, {} absorbed, {} cliques kept",
            blocks.len(),
            stats.classes,
            stats.absorbed,
            stats.cliques
        );

        (cliques, stats)
    }

    /// Absorb near-subset classes into supersets; returns the absorption forest
    fn merge_classes(&self, incidence: &Incidence, stats: &mut BicliqueStats) -> UnionFind {
        let n = incidence.num_classes();
        let mut uf = UnionFind::new(n);

        // Largest supports first, so every possible absorber is visited before its subsets
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            let (sa, sb) = (incidence.support(a), incidence.support(b));
            sb.len().cmp(&sa.len()).then_with(|| sa.cmp(sb))
        });

        let mut visited_at: Vec<Option<usize>> = vec![None; n];
        for (step, &class) in order.iter().enumerate() {
            let support = incidence.support(class);

            if self.config.merge_slack > 0 {
                let absorber = incidence
                    .supersets_of(support)
                    .into_iter()
                    .filter(|&c| c != class && visited_at[c].is_some())
                    .filter(|&c| {
                        let size = incidence.support(c).len();
                        size > support.len() && size - support.len() <= self.config.merge_slack
                    })
                    .filter(|&c| uf.is_root(c))
                    .min_by_key(|&c| (Reverse(incidence.support(c).len()), visited_at[c]));

                if let Some(parent) = absorber {
                    uf.absorb(class, parent);
                    stats.absorbed += 1;
                }
            }

            visited_at[class] = Some(step);
        }

        uf
    }

    fn score_clique(
        &self,
        support: GenomeSupport,
        block_ids: Vec<BlockId>,
        classes: usize,
        blocks: &[Block],
    ) -> Clique {
        let total_len: usize = block_ids.iter().map(|&id| blocks[id].len()).sum();
        let mean_block_len = total_len as f64 / block_ids.len() as f64;
        let best_evalue = block_ids
            .iter()
            .map(|&id| blocks[id].best_evalue)
            .fold(f64::INFINITY, f64::min);
        let score = self.scorer.score(&support, mean_block_len, best_evalue);

        Clique {
            support,
            blocks: block_ids,
            classes,
            mean_block_len,
            best_evalue,
            score,
        }
    }
}

/// Score descending, then support size descending, then first block position ascending
pub fn sort_cliques(cliques: &mut [Clique], blocks: &[Block]) {
    cliques.sort_by(|a, b| {
        OrderedFloat(b.score)
            .cmp(&OrderedFloat(a.score))
            .then_with(|| b.support.len().cmp(&a.support.len()))
            .then_with(|| a.anchor(blocks).cmp(&b.anchor(blocks)))
            .then_with(|| a.support.cmp(&b.support))
    });
}
