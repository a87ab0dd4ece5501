//! Candidate gene intervals ("blocks") and their genome support
//!
//! A block is a run of consecutive query genes. A reference genome supports the
//! block when every gene of the block has a hit into that genome and one hit per
//! gene can be chosen so that all chosen targets fall inside a window of at most
//! `window_size * span_factor` consecutive reference genes. Finding that window
//! is a minimum-covering-window sweep over the sorted target ordinals.

use std::collections::BTreeMap;

use crate::config::BlockConfig;
use crate::hit::HitTable;
use crate::reference::{GenomeId, ReferenceCatalog};

/// Index of a block in the arena returned by `IntervalBuilder::build`
pub type BlockId = usize;

/// Sorted, duplicate-free set of supporting genomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenomeSupport(Vec<GenomeId>);

impl GenomeSupport {
    pub fn from_ids<I: IntoIterator<Item = GenomeId>>(ids: I) -> Self {
        let mut ids: Vec<GenomeId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        GenomeSupport(ids)
    }

    pub fn ids(&self) -> &[GenomeId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn contains(&self, genome: GenomeId) -> bool {
        self.0.binary_search(&genome).is_ok()
    }

    /// Every genome of `self` is in `other`
    pub fn is_subset_of(&self, other: &GenomeSupport) -> bool {
        self.len() <= other.len() && self.0.iter().all(|g| other.contains(*g))
    }
}

/// Where a block's genes landed on one supporting genome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpan {
    pub genome: GenomeId,
    pub first: u32, // lowest chosen target ordinal
    pub last: u32,  // highest chosen target ordinal
}

impl TargetSpan {
    /// Span in genes, inclusive of both ends
    pub fn span(&self) -> u32 {
        self.last - self.first + 1
    }
}

/// A contiguous window of query genes with its genome support
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub start: usize, // first query gene ordinal
    pub end: usize,   // last query gene ordinal (inclusive)
    pub support: GenomeSupport,
    pub spans: Vec<TargetSpan>, // one per supporting genome, same order as support
    pub best_evalue: f64,
    pub context_switches: u32,
}

impl Block {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Hits of each query gene resolved to reference positions
#[derive(Debug, Clone, Default)]
pub struct ResolvedHits {
    /// Per query gene: genome -> (target ordinal, e-value), sorted by ordinal
    per_gene: Vec<BTreeMap<GenomeId, Vec<(u32, f64)>>>,
    unplaced: usize,
}

impl ResolvedHits {
    /// Place every hit on its reference genome; hits the catalog cannot place are counted
    pub fn resolve(table: &HitTable, reference: &ReferenceCatalog) -> Self {
        let mut unplaced = 0;
        let mut per_gene = Vec::with_capacity(table.num_genes());

        for gene in 0..table.num_genes() {
            let mut by_genome: BTreeMap<GenomeId, Vec<(u32, f64)>> = BTreeMap::new();
            for hit in table.hits_for(gene) {
                match reference.locate(&hit.accession, &hit.target_gene) {
                    Some(locus) => by_genome
                        .entry(locus.genome)
                        .or_default()
                        .push((locus.ordinal, hit.evalue)),
                    None => unplaced += 1,
                }
            }
            for targets in by_genome.values_mut() {
                targets.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));
            }
            per_gene.push(by_genome);
        }

        ResolvedHits { per_gene, unplaced }
    }

    pub fn num_genes(&self) -> usize {
        self.per_gene.len()
    }

    /// Hits that named a target gene unknown to the reference catalog
    pub fn unplaced(&self) -> usize {
        self.unplaced
    }

    fn targets(&self, gene: usize, genome: GenomeId) -> Option<&[(u32, f64)]> {
        self.per_gene.get(gene)?.get(&genome).map(|v| v.as_slice())
    }

    fn genomes_of(&self, gene: usize) -> Vec<GenomeId> {
        self.per_gene
            .get(gene)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }
}

/// Chosen targets of a block on one genome
#[derive(Debug, Clone)]
struct Placement {
    span: TargetSpan,
    chosen: Vec<(u32, f64)>, // one per block gene, in query order
}

impl Placement {
    /// Consecutive query genes whose targets are not neighbours
    fn context_switches(&self) -> u32 {
        self.chosen
            .windows(2)
            .filter(|pair| pair[0].0.abs_diff(pair[1].0) > 1)
            .count() as u32
    }

    fn best_evalue(&self) -> f64 {
        self.chosen
            .iter()
            .map(|&(_, e)| e)
            .fold(f64::INFINITY, f64::min)
    }
}

/// Sliding-window block enumeration
pub struct IntervalBuilder<'a> {
    config: &'a BlockConfig,
}

impl<'a> IntervalBuilder<'a> {
    pub fn new(config: &'a BlockConfig) -> Self {
        IntervalBuilder { config }
    }

    /// All blocks with non-empty support, start ascending then length ascending
    pub fn build(&self, hits: &ResolvedHits) -> Vec<Block> {
        let n = hits.num_genes();
        let max_span = self.config.max_target_span();
        let mut blocks = Vec::new();

        for start in 0..n {
            let mut candidates = hits.genomes_of(start);

            for len in 1..=self.config.window_size {
                let end = start + len - 1;
                if end >= n || candidates.is_empty() {
                    break;
                }

                let placements: Vec<(GenomeId, Placement)> = candidates
                    .iter()
                    .filter_map(|&genome| {
                        place_block(hits, start, end, genome, max_span).map(|p| (genome, p))
                    })
                    .collect();

                // Extending a block never enlarges its support
                candidates = placements.iter().map(|(g, _)| *g).collect();

                if len >= self.config.min_genes_per_interval && !placements.is_empty() {
                    blocks.push(make_block(start, end, placements));
                }
            }
        }

        blocks
    }
}

fn make_block(start: usize, end: usize, placements: Vec<(GenomeId, Placement)>) -> Block {
    let support = GenomeSupport::from_ids(placements.iter().map(|(g, _)| *g));
    let spans = placements.iter().map(|(_, p)| p.span).collect();
    let best_evalue = placements
        .iter()
        .map(|(_, p)| p.best_evalue())
        .fold(f64::INFINITY, f64::min);
    let context_switches = placements.iter().map(|(_, p)| p.context_switches()).sum();

    Block {
        start,
        end,
        support,
        spans,
        best_evalue,
        context_switches,
    }
}

/// Smallest window of target ordinals on `genome` holding one hit of every gene
/// in `start..=end`, if it is no wider than `max_span` genes
fn place_block(
    hits: &ResolvedHits,
    start: usize,
    end: usize,
    genome: GenomeId,
    max_span: u32,
) -> Option<Placement> {
    let width = end - start + 1;

    // (ordinal, gene label, e-value)
    let mut points: Vec<(u32, usize, f64)> = Vec::new();
    for gene in start..=end {
        let targets = hits.targets(gene, genome)?;
        points.extend(targets.iter().map(|&(ord, e)| (ord, gene - start, e)));
    }
    points.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut counts = vec![0usize; width];
    let mut covered = 0;
    let mut left = 0;
    let mut best: Option<(u32, u32)> = None;

    for right in 0..points.len() {
        let label = points[right].1;
        if counts[label] == 0 {
            covered += 1;
        }
        counts[label] += 1;

        while covered == width {
            let (lo, hi) = (points[left].0, points[right].0);
            // Strictly smaller only, so the leftmost minimal window is kept
            if best.map_or(true, |(blo, bhi)| hi - lo < bhi - blo) {
                best = Some((lo, hi));
            }
            let out = points[left].1;
            counts[out] -= 1;
            if counts[out] == 0 {
                covered -= 1;
            }
            left += 1;
        }
    }

    let (lo, hi) = best?;
    if hi - lo + 1 > max_span {
        return None;
    }

    let mut chosen: Vec<Option<(u32, f64)>> = vec![None; width];
    for &(ord, label, e) in points.iter().filter(|p| p.0 >= lo && p.0 <= hi) {
        // Points are ordinal-sorted, so ties on e-value keep the lowest ordinal
        if chosen[label].map_or(true, |(_, best_e)| e < best_e) {
            chosen[label] = Some((ord, e));
        }
    }

    Some(Placement {
        span: TargetSpan {
            genome,
            first: lo,
            last: hi,
        },
        chosen: chosen.into_iter().collect::<Option<Vec<_>>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::HitRecord;

    /// Reference with `genomes` genomes of `genes` genes named "<acc>_<i>"
    fn reference(genomes: usize, genes: usize) -> ReferenceCatalog {
        let mut entries = Vec::new();
        for g in 0..genomes {
            for i in 0..genes {
                let acc = format!("G{g}");
                let start = i as u64 * 1000;
                entries.push((acc.clone(), format!("{acc}_{i}"), start, start + 900));
            }
        }
        ReferenceCatalog::from_entries(entries).unwrap()
    }

    /// Hit table from (query ordinal, genome, target ordinal, evalue)
    fn table(num_genes: usize, hits: &[(usize, usize, usize, f64)]) -> HitTable {
        let mut per_gene = vec![Vec::new(); num_genes];
        for &(q, g, t, e) in hits {
            per_gene[q].push(HitRecord {
                query_gene: format!("q{q}"),
                target_gene: format!("G{g}_{t}"),
                accession: format!("G{g}"),
                evalue: e,
                identity: 90.0,
            });
        }
        HitTable::from_ranked(per_gene)
    }

    fn config(window_size: usize, min_genes: usize) -> BlockConfig {
        BlockConfig {
            window_size,
            min_genes_per_interval: min_genes,
            min_genomes_per_block: 2,
            min_rank: 1.0,
            span_factor: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_genome_support_sets() {
        let small = GenomeSupport::from_ids([3, 1, 2, 2]);
        let large = GenomeSupport::from_ids([1, 2, 3, 4]);
        assert_eq!(small.ids(), &[1, 2, 3]);
        assert!(small.is_subset_of(&large));
        assert!(!large.is_subset_of(&small));
        assert!(large.contains(4));
        assert!(!small.contains(4));
    }

    #[test]
    fn test_collinear_block_is_supported() {
        let reference = reference(2, 100);
        let hits = table(
            3,
            &[
                (0, 0, 10, 1e-30),
                (1, 0, 11, 1e-30),
                (2, 0, 12, 1e-30),
                (0, 1, 50, 1e-30),
                (1, 1, 51, 1e-30),
            ],
        );
        let resolved = ResolvedHits::resolve(&hits, &reference);
        let config = config(3, 2);
        let blocks = IntervalBuilder::new(&config).build(&resolved);

        let ranges: Vec<(usize, usize, Vec<GenomeId>)> = blocks
            .iter()
            .map(|b| (b.start, b.end, b.support.ids().to_vec()))
            .collect();
        assert_eq!(
            ranges,
            vec![(0, 1, vec![0, 1]), (0, 2, vec![0]), (1, 2, vec![0])]
        );
        assert!(blocks.iter().all(|b| b.context_switches == 0));
        assert_eq!(blocks[1].spans[0], TargetSpan { genome: 0, first: 10, last: 12 });
    }

    #[test]
    fn test_scattered_targets_do_not_support() {
        let reference = reference(1, 500);
        // window 3, span factor 2 -> at most 6 genes wide
        let hits = table(3, &[(0, 0, 10, 1e-30), (1, 0, 11, 1e-30), (2, 0, 300, 1e-30)]);
        let resolved = ResolvedHits::resolve(&hits, &reference);
        let config = config(3, 2);
        let blocks = IntervalBuilder::new(&config).build(&resolved);

        assert_eq!(blocks.len(), 1);
        assert_eq!((blocks[0].start, blocks[0].end), (0, 1));
    }

    #[test]
    fn test_minimal_window_picks_nearby_paralog() {
        let reference = reference(1, 500);
        // gene 1 has a far hit with a better e-value and a near one
        let hits = table(
            2,
            &[(0, 0, 100, 1e-10), (1, 0, 400, 1e-90), (1, 0, 103, 1e-20)],
        );
        let resolved = ResolvedHits::resolve(&hits, &reference);
        let config = config(2, 2);
        let blocks = IntervalBuilder::new(&config).build(&resolved);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].spans[0], TargetSpan { genome: 0, first: 100, last: 103 });
        assert_eq!(blocks[0].best_evalue, 1e-20);
        // 100 -> 103 skips genes
        assert_eq!(blocks[0].context_switches, 1);
    }

    #[test]
    fn test_unknown_targets_are_unplaced() {
        let reference = reference(1, 10);
        let base = table(1, &[(0, 0, 1, 1e-30)]);
        let hits = HitTable::from_ranked(vec![vec![
            base.hits_for(0)[0].clone(),
            HitRecord {
                query_gene: "q0".to_string(),
                target_gene: "missing".to_string(),
                accession: "G0".to_string(),
                evalue: 1e-5,
                identity: 50.0,
            },
        ]]);
        let resolved = ResolvedHits::resolve(&hits, &reference);
        assert_eq!(resolved.unplaced(), 1);
        assert_eq!(resolved.num_genes(), 1);
    }

    #[test]
    fn test_block_lengths_bounded() {
        let reference = reference(1, 100);
        let all: Vec<(usize, usize, usize, f64)> = (0..8).map(|q| (q, 0, 20 + q, 1e-30)).collect();
        let hits = table(8, &all);
        let resolved = ResolvedHits::resolve(&hits, &reference);
        let config = config(4, 3);
        let blocks = IntervalBuilder::new(&config).build(&resolved);

        assert!(blocks.iter().all(|b| b.len() >= 3 && b.len() <= 4));
        // starts 0..=4 give both lengths, start 5 only length 3
        assert_eq!(blocks.len(), 5 * 2 + 1);
        let order: Vec<(usize, usize)> = blocks.iter().map(|b| (b.start, b.len())).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }
}
