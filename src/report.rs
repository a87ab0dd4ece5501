use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::result::RankedResult;

pub const GENERAL_RESULTS_HEADER: &str = concat!(
    "Accession Number- Start of Island - End of Island,",
    "Max Ranking Score,Number of Cliques,Number of Blocks,",
    "Avg Blocks per Clique,Context Switch"
);

/// Write one query's full result as pretty JSON
pub fn write_result_json<P: AsRef<Path>>(path: P, result: &RankedResult) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()?;
    Ok(())
}

/// Write the run-wide list of queries that produced at least one clique
pub fn write_result_stats<P: AsRef<Path>>(path: P, results: &[&RankedResult]) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, results)?;
    writer.flush()?;
    Ok(())
}

/// One CSV summary line per query
pub fn write_general_results<W: Write>(out: &mut W, results: &[&RankedResult]) -> Result<()> {
    writeln!(out, "{GENERAL_RESULTS_HEADER}")?;
    for result in results {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            csv_field(&result.accession),
            result.max_pval,
            result.num_of_cliques,
            result.num_of_blocks,
            result.avg_block_per_clique,
            result.context_switch
        )?;
    }
    Ok(())
}

/// Quote a CSV field when it contains separators or quotes
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
