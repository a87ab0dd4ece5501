/// Rank score for candidate cliques
///
/// score = sum over supporting genomes g of (L - 1) * log10(max(1, N_g / w))
///       + clamp(-log10(max(e, 1e-100)), 0, 100) / 10
///
/// L is the mean member-block length, N_g the gene count of genome g, w the
/// target span limit in genes and e the best member e-value. The first term is
/// -log10 of the chance that L - 1 further genes fall inside a w-gene window
/// under uniform placement; the second rewards strong hits without letting
/// them dominate colocation evidence.
use crate::interval::GenomeSupport;
use crate::reference::{GenomeId, ReferenceCatalog};

pub const EVALUE_FLOOR: f64 = 1e-100;
pub const EVIDENCE_SCALE: f64 = 10.0;

pub struct RankScorer<'a> {
    reference: &'a ReferenceCatalog,
    max_span: f64,
}

impl<'a> RankScorer<'a> {
    pub fn new(reference: &'a ReferenceCatalog, max_span: u32) -> Self {
        RankScorer {
            reference,
            max_span: f64::from(max_span.max(1)),
        }
    }

    /// Gene count of a genome, the catalog average when unknown
    fn genome_size(&self, genome: GenomeId) -> f64 {
        match self.reference.gene_count(genome) {
            Some(n) if n > 0 => n as f64,
            _ => self.reference.average_gene_count(),
        }
    }

    /// -log10 chance of `mean_len` genes co-locating by accident on one genome
    pub fn colocation(&self, genome: GenomeId, mean_len: f64) -> f64 {
        let ratio = (self.genome_size(genome) / self.max_span).max(1.0);
        (mean_len - 1.0).max(0.0) * ratio.log10()
    }

    /// Hit-strength bonus in [0, 10]
    pub fn evidence(best_evalue: f64) -> f64 {
        let e = if best_evalue.is_nan() {
            1.0
        } else {
            best_evalue.max(EVALUE_FLOOR)
        };
        (-e.log10()).clamp(0.0, 100.0) / EVIDENCE_SCALE
    }

    pub fn score(&self, support: &GenomeSupport, mean_len: f64, best_evalue: f64) -> f64 {
        let colocation: f64 = support
            .ids()
            .iter()
            .map(|&g| self.colocation(g, mean_len))
            .sum();
        colocation + Self::evidence(best_evalue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(sizes: &[usize]) -> ReferenceCatalog {
        let mut entries = Vec::new();
        for (g, &n) in sizes.iter().enumerate() {
            for i in 0..n {
                entries.push((format!("G{g}"), format!("G{g}_{i}"), i as u64, i as u64 + 1));
            }
        }
        ReferenceCatalog::from_entries(entries).unwrap()
    }

    #[test]
    fn test_evidence_bounds() {
        assert!((RankScorer::evidence(0.0) - 10.0).abs() < 1e-9);
        assert!((RankScorer::evidence(1e-300) - 10.0).abs() < 1e-9);
        assert!((RankScorer::evidence(1e-30) - 3.0).abs() < 1e-9);
        assert_eq!(RankScorer::evidence(5.0), 0.0);
        assert_eq!(RankScorer::evidence(f64::NAN), 0.0);
    }

    #[test]
    fn test_colocation_uses_genome_size() {
        let reference = catalog(&[1000, 100]);
        let scorer = RankScorer::new(&reference, 10);

        assert!((scorer.colocation(0, 3.0) - 4.0).abs() < 1e-9); // 2 * log10(100)
        assert!((scorer.colocation(1, 3.0) - 2.0).abs() < 1e-9); // 2 * log10(10)
        assert_eq!(scorer.colocation(0, 1.0), 0.0);
        // unknown genome falls back to the average (550 genes)
        assert!((scorer.colocation(7, 2.0) - 55.0f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn test_more_genomes_score_higher() {
        let reference = catalog(&[500, 500, 500]);
        let scorer = RankScorer::new(&reference, 10);

        let two = scorer.score(&GenomeSupport::from_ids([0, 1]), 4.0, 1e-20);
        let three = scorer.score(&GenomeSupport::from_ids([0, 1, 2]), 4.0, 1e-20);
        assert!(three > two);

        let longer = scorer.score(&GenomeSupport::from_ids([0, 1]), 5.0, 1e-20);
        assert!(longer > two);

        let stronger = scorer.score(&GenomeSupport::from_ids([0, 1]), 4.0, 1e-60);
        assert!(stronger > two);
    }

    #[test]
    fn test_tiny_genomes_give_no_colocation_credit() {
        let reference = catalog(&[5]);
        let scorer = RankScorer::new(&reference, 10);
        assert_eq!(scorer.colocation(0, 5.0), 0.0);
    }
}
