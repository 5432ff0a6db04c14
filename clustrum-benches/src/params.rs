//! Benchmark parameter types.

use std::fmt;

/// Parameters for a validation benchmark run.
#[derive(Clone, Debug)]
pub struct ValidationBenchParams {
    /// Number of labelled records.
    pub record_count: usize,
    /// Number of predicted clusters.
    pub cluster_count: usize,
}

impl fmt::Display for ValidationBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},k={}", self.record_count, self.cluster_count)
    }
}
