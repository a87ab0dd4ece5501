use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use ragbi::pipeline::{discover_queries, run_queries, QueryContext};
use ragbi::reference::ReferenceCatalog;
use ragbi::report::{write_general_results, write_result_json, write_result_stats};
use ragbi::{BlockConfig, RankedResult};

/// ragbi - conserved gene-block discovery
///
/// Finds gene blocks of query islands that recur, in conserved order, across
/// reference genomes, from pre-computed BLAST hits
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Folder with <name>.genes.tsv gene lists and <name>.hits.tsv hit files
    #[clap(short = 'q', long = "qfolder")]
    qfolder: PathBuf,

    /// Reference gene table (accession, gene id, start, end)
    #[clap(short = 'g', long = "reference")]
    reference: PathBuf,

    /// Folder where results are written (created if missing)
    #[clap(short = 'o', long = "outfolder", default_value = "./OUT")]
    outfolder: PathBuf,

    /// Size of the window
    #[clap(short = 'd', long = "window", default_value = "15")]
    window_size: usize,

    /// Minimum genomes in a gene block
    #[clap(long = "min-genomes", default_value = "5")]
    min_genomes_per_block: usize,

    /// Minimum genes in a gene interval
    #[clap(long = "min-genes", default_value = "5")]
    min_genes_per_interval: usize,

    /// Minimum ranking score that will be reported
    #[clap(long = "min-rank", default_value = "20")]
    min_rank: f64,

    /// E-value cutoff for hits
    #[clap(short = 'e', long = "evalue", default_value = "0.01")]
    e_val: f64,

    /// Hits kept per query gene
    #[clap(long = "hit-cap", default_value = "10")]
    hit_cap: usize,

    /// Target span limit as a multiple of the window size
    #[clap(long = "span-factor", default_value = "2")]
    span_factor: usize,

    /// Genomes a support set may lack and still merge into a superset clique
    #[clap(long = "merge-slack", default_value = "1")]
    merge_slack: usize,

    /// Keep hits into the query island's own genome
    #[clap(long = "self")]
    keep_self: bool,

    /// Number of threads (one query per thread)
    #[clap(short = 't', long = "threads", default_value = "8")]
    threads: usize,

    /// Verbosity (-v info, -vv debug)
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (no progress output)
    #[clap(long = "quiet")]
    quiet: bool,
}

impl Args {
    fn block_config(&self) -> BlockConfig {
        BlockConfig {
            window_size: self.window_size,
            min_genes_per_interval: self.min_genes_per_interval,
            min_genomes_per_block: self.min_genomes_per_block,
            min_rank: self.min_rank,
            e_val: self.e_val,
            hit_cap: self.hit_cap,
            span_factor: self.span_factor,
            merge_slack: self.merge_slack,
            keep_self: self.keep_self,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let config = args.block_config();
    config.validate()?;

    if !args.qfolder.is_dir() {
        anyhow::bail!("The folder {} does not exist.", args.qfolder.display());
    }
    fs::create_dir_all(&args.outfolder)?;

    // Set up rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.max(1))
        .build_global()?;

    let reference = ReferenceCatalog::from_path(&args.reference)?;
    info!(
        "{} reference genomes, average {:.1} genes",
        reference.num_genomes(),
        reference.average_gene_count()
    );

    let queries = discover_queries(&args.qfolder)?;
    if queries.is_empty() {
        warn!("No query gene lists found in {}", args.qfolder.display());
    }

    // Progress indicator
    let progress = if !args.quiet {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message(format!("Computing gene blocks for {} queries...", queries.len()));
        Some(pb)
    } else {
        None
    };

    let ctx = QueryContext::new(&config, &reference);
    let results = run_queries(&queries, &ctx);

    let mut reported: Vec<&RankedResult> = Vec::new();
    let mut failed = 0;
    for (name, result) in &results {
        match result {
            Ok(result) => {
                write_result_json(args.outfolder.join(format!("{name}.json")), result)?;
                if !result.is_empty() {
                    reported.push(result);
                }
            }
            Err(e) => {
                failed += 1;
                error!("Query {name} failed: {e:#}");
            }
        }
    }

    write_result_stats(args.outfolder.join("resultStats.json"), &reported)?;
    let mut csv = BufWriter::new(File::create(args.outfolder.join("general_results.csv"))?);
    write_general_results(&mut csv, &reported)?;
    csv.flush()?;

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "{} queries, {} with gene blocks, {} failed",
            results.len(),
            reported.len(),
            failed
        ));
    }

    Ok(())
}
