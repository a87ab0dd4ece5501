/// Normalized ortholog hits for one query island
use std::cmp::Ordering;
use std::collections::HashMap;

/// One similarity hit of a query gene against a reference gene
#[derive(Debug, Clone, PartialEq)]
pub struct HitRecord {
    pub query_gene: String,
    pub target_gene: String,
    pub accession: String, // target genome
    pub evalue: f64,
    pub identity: f64, // percent, 0-100
}

impl HitRecord {
    /// Hit ranking: e-value ascending, identity descending
    pub fn rank_cmp(&self, other: &HitRecord) -> Ordering {
        self.evalue
            .total_cmp(&other.evalue)
            .then_with(|| other.identity.total_cmp(&self.identity))
    }
}

/// Hits grouped by query gene, in query gene order then rank order
#[derive(Debug, Clone, Default)]
pub struct HitTable {
    records: Vec<HitRecord>,
    /// Per query gene ordinal: range into `records`
    ranges: Vec<(usize, usize)>,
}

impl HitTable {
    /// Build from per-gene hit lists indexed by query gene ordinal (already ranked)
    pub fn from_ranked(per_gene: Vec<Vec<HitRecord>>) -> Self {
        let total = per_gene.iter().map(|v| v.len()).sum();
        let mut records = Vec::with_capacity(total);
        let mut ranges = Vec::with_capacity(per_gene.len());

        for hits in per_gene {
            let begin = records.len();
            records.extend(hits);
            ranges.push((begin, records.len()));
        }

        HitTable { records, ranges }
    }

    /// Hits of one query gene, best first
    pub fn hits_for(&self, gene_ordinal: usize) -> &[HitRecord] {
        match self.ranges.get(gene_ordinal) {
            Some(&(begin, end)) => &self.records[begin..end],
            None => &[],
        }
    }

    /// Number of query genes covered by the table
    pub fn num_genes(&self) -> usize {
        self.ranges.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the best hit per (query gene, genome accession)
    pub fn best_hit_index(&self) -> BestHitIndex {
        let mut best: HashMap<String, HashMap<usize, usize>> = HashMap::new();
        for (gene, &(begin, end)) in self.ranges.iter().enumerate() {
            for idx in begin..end {
                let accession = self.records[idx].accession.as_str();
                // Records are rank-ordered, so the first seen per genome wins
                match best.get_mut(accession) {
                    Some(per_gene) => {
                        per_gene.entry(gene).or_insert(idx);
                    }
                    None => {
                        best.insert(accession.to_string(), HashMap::from([(gene, idx)]));
                    }
                }
            }
        }
        BestHitIndex { best }
    }
}

/// Best hit per (genome accession, query gene ordinal), as indices into a HitTable
#[derive(Debug, Clone, Default)]
pub struct BestHitIndex {
    best: HashMap<String, HashMap<usize, usize>>,
}

impl BestHitIndex {
    pub fn get<'a>(
        &self,
        table: &'a HitTable,
        gene_ordinal: usize,
        accession: &str,
    ) -> Option<&'a HitRecord> {
        let idx = *self.best.get(accession)?.get(&gene_ordinal)?;
        table.records.get(idx)
    }

    pub fn len(&self) -> usize {
        self.best.values().map(|per_gene| per_gene.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}
