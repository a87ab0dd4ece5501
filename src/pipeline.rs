//! Per-query pipeline: hits -> blocks -> cliques -> result
//!
//! One query island is processed start to finish on one thread. Independent
//! queries fan out over the rayon pool; they share only the read-only
//! configuration and reference catalog.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::biclique::BicliqueComputer;
use crate::config::BlockConfig;
use crate::gene::{query_stem, QueryGeneList};
use crate::hit_parser::{HitParser, ParsedHits};
use crate::input::open_text_input;
use crate::interval::{IntervalBuilder, ResolvedHits};
use crate::reference::ReferenceCatalog;
use crate::result::{Diagnostics, RankedResult, ResultAssembler};

/// Everything a query computation reads besides its own inputs
#[derive(Clone, Copy)]
pub struct QueryContext<'a> {
    pub config: &'a BlockConfig,
    pub reference: &'a ReferenceCatalog,
}

impl<'a> QueryContext<'a> {
    pub fn new(config: &'a BlockConfig, reference: &'a ReferenceCatalog) -> Self {
        QueryContext { config, reference }
    }

    /// Run the full pipeline on an island and a reader over its raw hits
    pub fn run<R: BufRead>(&self, genes: &QueryGeneList, hits: R) -> Result<RankedResult> {
        self.config.validate()?;
        let parsed = HitParser::from_config(self.config).parse(hits, genes)?;
        Ok(self.run_parsed(genes, parsed))
    }

    /// Blocks, cliques and result from already-parsed hits
    pub fn run_parsed(&self, genes: &QueryGeneList, parsed: ParsedHits) -> RankedResult {
        let ParsedHits { table, best, stats } = parsed;
        let resolved = ResolvedHits::resolve(&table, self.reference);
        if resolved.unplaced() > 0 {
            debug!(
                "{}: {} hits name genes missing from the reference catalog",
                genes.accession(),
                resolved.unplaced()
            );
        }

        let blocks = IntervalBuilder::new(self.config).build(&resolved);
        let (cliques, biclique_stats) =
            BicliqueComputer::new(self.config, self.reference).compute(&blocks);

        if cliques.is_empty() {
            info!("{}: no gene block met the thresholds", genes.accession());
        }

        let diagnostics = Diagnostics {
            parse: stats,
            unplaced_hits: resolved.unplaced(),
            blocks: blocks.len(),
            bicliques: biclique_stats,
        };

        ResultAssembler::new(genes, self.reference, &table, &best).assemble(
            &cliques,
            &blocks,
            diagnostics,
        )
    }
}

/// Gene list and hit file of one query island
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryInput {
    pub name: String,
    pub genes_path: PathBuf,
    pub hits_path: PathBuf,
}

impl QueryInput {
    pub fn run(&self, ctx: &QueryContext) -> Result<RankedResult> {
        let genes = QueryGeneList::from_path(&self.genes_path)
            .with_context(|| format!("Reading gene list {}", self.genes_path.display()))?;
        let hits = open_text_input(&self.hits_path)?;
        ctx.run(&genes, hits)
            .with_context(|| format!("Processing query {}", self.name))
    }
}

/// Pair every `<name>.genes.tsv` in `dir` with its `<name>.hits.tsv[.gz|.bgz]`
pub fn discover_queries<P: AsRef<Path>>(dir: P) -> Result<Vec<QueryInput>> {
    let dir = dir.as_ref();
    let mut queries = Vec::new();

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list query folder {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_gene_list = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(".genes.tsv"))
            .unwrap_or(false);
        if !is_gene_list {
            continue;
        }

        let name = query_stem(&path);
        let hits_path = ["hits.tsv", "hits.tsv.gz", "hits.tsv.bgz"]
            .iter()
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|p| p.exists());

        match hits_path {
            Some(hits_path) => queries.push(QueryInput {
                name,
                genes_path: path,
                hits_path,
            }),
            None => warn!("No hit file for query {name}, skipping"),
        }
    }

    // read_dir order is platform dependent
    queries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(queries)
}

/// Run independent queries in parallel; a failing query does not affect the others.
/// Results come back in input order.
pub fn run_queries(
    queries: &[QueryInput],
    ctx: &QueryContext,
) -> Vec<(String, Result<RankedResult>)> {
    queries
        .par_iter()
        .map(|query| {
            debug!("Starting query {}", query.name);
            (query.name.clone(), query.run(ctx))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn reference() -> ReferenceCatalog {
        let mut entries = Vec::new();
        for g in 0..3 {
            for i in 0..200u64 {
                entries.push((format!("R{g}"), format!("R{g}_{i}"), i * 100, i * 100 + 90));
            }
        }
        ReferenceCatalog::from_entries(entries).unwrap()
    }

    fn config() -> BlockConfig {
        BlockConfig {
            window_size: 4,
            min_genes_per_interval: 3,
            min_genomes_per_block: 2,
            min_rank: 1.0,
            ..Default::default()
        }
    }

    fn island_files(dir: &Path, name: &str) {
        let genes: String = (0..4)
            .map(|i| format!("g{i}\t{}\t{}\tISL\n", i * 100, i * 100 + 90))
            .collect();
        let hits: String = (0..3)
            .flat_map(|g| (0..3).map(move |i| format!("g{i}\tR{g}_{}\tR{g}\t1e-30\t90\n", 50 + i)))
            .collect();
        fs::write(dir.join(format!("{name}.genes.tsv")), genes).unwrap();
        fs::write(dir.join(format!("{name}.hits.tsv")), hits).unwrap();
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let reference = reference();
        let config = BlockConfig {
            window_size: 0,
            ..config()
        };
        let genes = QueryGeneList::read(Cursor::new("g0 1 2\n"), "x").unwrap();
        let err = QueryContext::new(&config, &reference)
            .run(&genes, Cursor::new(""))
            .unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn test_discover_and_run() -> Result<()> {
        let dir = TempDir::new()?;
        island_files(dir.path(), "ISL_b");
        island_files(dir.path(), "ISL_a");
        fs::write(dir.path().join("orphan.genes.tsv"), "g0\t1\t2\n")?;

        let queries = discover_queries(dir.path())?;
        let names: Vec<&str> = queries.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["ISL_a", "ISL_b"]);

        let reference = reference();
        let config = config();
        let ctx = QueryContext::new(&config, &reference);
        let results = run_queries(&queries, &ctx);

        assert_eq!(results.len(), 2);
        for (name, result) in &results {
            let result = result.as_ref().unwrap();
            assert_eq!(result.num_of_cliques, 1, "{name}");
            assert_eq!(result.cliques[0].genomes, vec!["R0", "R1", "R2"]);
            assert_eq!(result.diagnostics.parse.records, 9);
        }
        Ok(())
    }

    #[test]
    fn test_versioned_accession_query() -> Result<()> {
        let dir = TempDir::new()?;
        // No accession column: the file name names the island
        fs::write(dir.path().join("NC_000913.3.genes.tsv"), "g0\t0\t90\ng1\t100\t190\n")?;
        fs::write(
            dir.path().join("NC_000913.3.hits.tsv"),
            "g0\tself_7\tNC_000913.3\t1e-50\t100\ng0\tR0_5\tR0\t1e-30\t90\n",
        )?;

        let queries = discover_queries(dir.path())?;
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].name, "NC_000913.3");

        let reference = reference();
        let config = config();
        let result = queries[0].run(&QueryContext::new(&config, &reference))?;
        assert_eq!(result.accession, "NC_000913.3");
        assert_eq!(result.diagnostics.parse.self_hits, 1);
        assert_eq!(result.diagnostics.parse.records, 1);
        Ok(())
    }

    #[test]
    fn test_failing_query_is_isolated() -> Result<()> {
        let dir = TempDir::new()?;
        island_files(dir.path(), "good");
        fs::write(dir.path().join("bad.genes.tsv"), "g0\tnot_a_number\t5\n")?;
        fs::write(dir.path().join("bad.hits.tsv"), "")?;

        let queries = discover_queries(dir.path())?;
        let reference = reference();
        let config = config();
        let results = run_queries(&queries, &QueryContext::new(&config, &reference));

        let bad = results.iter().find(|(n, _)| n == "bad").unwrap();
        let good = results.iter().find(|(n, _)| n == "good").unwrap();
        assert!(bad.1.is_err());
        assert!(good.1.is_ok());
        Ok(())
    }
}
