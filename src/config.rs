use crate::error::BlockError;

/// Thresholds for one gene-block run
///
/// Passed by reference through every stage of the pipeline; nothing reads
/// process-wide state.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockConfig {
    pub window_size: usize,            // -d/--window
    pub min_genes_per_interval: usize, // --min-genes
    pub min_genomes_per_block: usize,  // --min-genomes
    pub min_rank: f64,                 // --min-rank
    pub e_val: f64,                    // -e/--evalue

    /// Keep at most this many hits per query gene (best first)
    pub hit_cap: usize,
    /// Target-side span limit, as a multiple of window_size (in genes)
    pub span_factor: usize,
    /// Max number of genomes a subset class may lack to be absorbed by a superset
    pub merge_slack: usize,
    /// Keep hits into the query island's own genome
    pub keep_self: bool,
}

impl Default for BlockConfig {
    fn default() -> Self {
        BlockConfig {
            window_size: 15,
            min_genes_per_interval: 5,
            min_genomes_per_block: 5,
            min_rank: 20.0,
            e_val: 0.01,
            hit_cap: 10,
            span_factor: 2,
            merge_slack: 1,
            keep_self: false,
        }
    }
}

impl BlockConfig {
    /// Largest allowed target-side span, in genes; `None` when it does not fit a u32
    fn checked_target_span(&self) -> Option<u32> {
        self.window_size
            .checked_mul(self.span_factor)
            .and_then(|span| u32::try_from(span).ok())
    }

    /// Largest allowed target-side span, in genes. Exact for validated configs.
    pub fn max_target_span(&self) -> u32 {
        self.checked_target_span().unwrap_or(u32::MAX)
    }

    pub fn validate(&self) -> Result<(), BlockError> {
        let invalid = |msg: String| Err(BlockError::InvalidConfiguration(msg));

        if self.window_size == 0 {
            return invalid("window_size must be a positive integer".to_string());
        }
        if self.min_genes_per_interval < 2 {
            return invalid(format!(
                "min_genes_per_interval is {}, must be at least 2",
                self.min_genes_per_interval
            ));
        }
        if self.min_genes_per_interval > self.window_size {
            return invalid(format!(
                "min_genes_per_interval ({}) exceeds window_size ({})",
                self.min_genes_per_interval, self.window_size
            ));
        }
        if self.min_genomes_per_block < 2 {
            return invalid(format!(
                "min_genomes_per_block is {}, must be at least 2",
                self.min_genomes_per_block
            ));
        }
        if !self.min_rank.is_finite() || self.min_rank <= 0.0 {
            return invalid(format!("min_rank {} must be a positive number", self.min_rank));
        }
        if !self.e_val.is_finite() || self.e_val < 0.0 {
            return invalid(format!("e-value cutoff {} must be a non-negative number", self.e_val));
        }
        if self.hit_cap == 0 {
            return invalid("hit cap must be at least 1".to_string());
        }
        if self.span_factor == 0 {
            return invalid("span factor must be at least 1".to_string());
        }
        if self.checked_target_span().is_none() {
            return invalid(format!(
                "target span window_size ({}) x span_factor ({}) is too large",
                self.window_size, self.span_factor
            ));
        }

        Ok(())
    }
}
