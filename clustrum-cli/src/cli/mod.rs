//! Command-line interface orchestration for clustrum.
//!
//! The CLI offers a `score` command that reads predicted clusters and
//! gold-standard classes from a delimited file and reports purity, NMI and
//! the majority class of every cluster.

mod commands;
mod input;

pub use commands::{
    ClassEntropyArg, Cli, CliError, ClusterSummary, Command, ScoreArgs, ScoreSummary,
    render_summary, run_cli,
};
pub use input::{InputLineError, LoadedAssignments, parse_assignments};
