use anyhow::Result;
use log::{debug, warn};
use serde::Serialize;
use std::io::BufRead;
use std::path::Path;

use crate::config::BlockConfig;
use crate::error::BlockError;
use crate::gene::QueryGeneList;
use crate::hit::{BestHitIndex, HitRecord, HitTable};
use crate::input::{is_skippable, open_text_input, split_fields};

/// Counters from one hit file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub lines: usize,
    pub records: usize,
    pub malformed: usize,
    pub unknown_query: usize,
    pub self_hits: usize,
    pub above_threshold: usize,
    pub capped: usize,
}

/// Output of the hit parser for one query island
#[derive(Debug, Clone)]
pub struct ParsedHits {
    pub table: HitTable,
    pub best: BestHitIndex,
    pub stats: ParseStats,
}

/// Reads raw alignment output (`query target accession evalue identity` per line)
pub struct HitParser {
    e_val: f64,
    hit_cap: usize,
    keep_self: bool,
}

impl HitParser {
    pub fn new(e_val: f64, hit_cap: usize) -> Self {
        HitParser {
            e_val,
            hit_cap,
            keep_self: false,
        }
    }

    pub fn from_config(config: &BlockConfig) -> Self {
        Self::new(config.e_val, config.hit_cap).with_keep_self(config.keep_self)
    }

    pub fn with_keep_self(mut self, keep_self: bool) -> Self {
        self.keep_self = keep_self;
        self
    }

    pub fn parse_path<P: AsRef<Path>>(&self, path: P, genes: &QueryGeneList) -> Result<ParsedHits> {
        let reader = open_text_input(path)?;
        self.parse(reader, genes)
    }

    /// Parse, filter and cap the hits of one query island.
    /// Malformed lines are skipped and counted; only I/O errors are returned.
    pub fn parse<R: BufRead>(&self, reader: R, genes: &QueryGeneList) -> Result<ParsedHits> {
        let mut stats = ParseStats::default();
        let mut per_gene: Vec<Vec<HitRecord>> = vec![Vec::new(); genes.len()];

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if is_skippable(&line) {
                continue;
            }
            stats.lines += 1;

            let record = match parse_hit_line(&line, idx + 1) {
                Ok(record) => record,
                Err(e) => {
                    debug!("Skipping {e}");
                    stats.malformed += 1;
                    continue;
                }
            };

            let Some(gene) = genes.position(&record.query_gene) else {
                stats.unknown_query += 1;
                continue;
            };
            if !self.keep_self && record.accession == genes.accession() {
                stats.self_hits += 1;
                continue;
            }
            if record.evalue > self.e_val {
                stats.above_threshold += 1;
                continue;
            }

            per_gene[gene].push(record);
        }

        for hits in per_gene.iter_mut() {
            // Stable sort keeps input order among equal hits
            hits.sort_by(|a, b| a.rank_cmp(b));
            if hits.len() > self.hit_cap {
                stats.capped += hits.len() - self.hit_cap;
                hits.truncate(self.hit_cap);
            }
        }

        let table = HitTable::from_ranked(per_gene);
        stats.records = table.len();
        if stats.malformed > 0 {
            warn!(
                "{}: skipped {} malformed hit line(s)",
                genes.accession(),
                stats.malformed
            );
        }

        let best = table.best_hit_index();
        Ok(ParsedHits { table, best, stats })
    }
}

/// Parse one hit line into a record
pub fn parse_hit_line(line: &str, line_no: usize) -> Result<HitRecord, BlockError> {
    let malformed = |reason: String| BlockError::MalformedHitRecord {
        line: line_no,
        reason,
    };

    let fields = split_fields(line);
    if fields.len() < 5 {
        return Err(malformed(format!(
            "expected 5 fields, found {}",
            fields.len()
        )));
    }
    if fields[..3].iter().any(|f| f.is_empty()) {
        return Err(malformed("empty identifier field".to_string()));
    }

    let evalue: f64 = fields[3]
        .parse()
        .map_err(|_| malformed(format!("invalid e-value '{}'", fields[3])))?;
    if evalue.is_nan() || evalue < 0.0 {
        return Err(malformed(format!("invalid e-value '{}'", fields[3])));
    }

    let identity: f64 = fields[4]
        .parse()
        .map_err(|_| malformed(format!("invalid identity '{}'", fields[4])))?;
    if !(0.0..=100.0).contains(&identity) {
        return Err(malformed(format!("identity {identity} outside 0-100")));
    }

    Ok(HitRecord {
        query_gene: fields[0].to_string(),
        target_gene: fields[1].to_string(),
        accession: fields[2].to_string(),
        evalue,
        identity,
    })
}
