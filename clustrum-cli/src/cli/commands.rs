//! Command implementations and argument parsing for the clustrum CLI.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use clustrum_core::{
    ClassEntropySource, ClusterId, ClustererBuilder, ClustrumError, Dataset,
    MembershipPredictor, ValidationError, ValidationMetrics,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use super::input::{InputLineError, open_assignments, parse_assignments};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "clustrum",
    about = "Score cluster assignments against gold-standard classes."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Compute purity and NMI for a delimited assignment file.
    Score(ScoreArgs),
}

/// Options accepted by the `score` command.
#[derive(Debug, Args, Clone)]
pub struct ScoreArgs {
    /// Path to a file with one `cluster<delim>class` pair per line.
    pub path: PathBuf,

    /// Field delimiter.
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Shard frequency counting across worker threads.
    #[arg(long)]
    pub parallel: bool,

    /// Frequency table used for the class entropy term of NMI.
    #[arg(long = "class-entropy", value_enum, default_value_t = ClassEntropyArg::ClassFrequencies)]
    pub class_entropy: ClassEntropyArg,

    /// Override name for the dataset (defaults to the file name).
    #[arg(long)]
    pub name: Option<String>,
}

/// Command-line spelling of [`ClassEntropySource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassEntropyArg {
    /// Entropy of the gold-standard class frequencies.
    ClassFrequencies,
    /// Entropy of the cluster frequencies, matching the legacy scorer.
    ClusterFrequencies,
}

impl From<ClassEntropyArg> for ClassEntropySource {
    fn from(value: ClassEntropyArg) -> Self {
        match value {
            ClassEntropyArg::ClassFrequencies => Self::ClassFrequencies,
            ClassEntropyArg::ClusterFrequencies => Self::ClusterFrequencies,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The input file could not be opened.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Reading a line from the input failed.
    #[error("failed to read line {line}: {source}")]
    Read {
        /// One-based line number.
        line: usize,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A line of the input was malformed.
    #[error("line {line}: {source}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        #[source]
        source: InputLineError,
    },
    /// The model configuration was rejected.
    #[error(transparent)]
    Config(#[from] ClustrumError),
    /// Scoring failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CliError {
    /// Stable machine-readable code of the underlying core error, if any.
    #[must_use]
    pub const fn core_code(&self) -> Option<&'static str> {
        match self {
            Self::Config(error) => Some(error.code().as_str()),
            Self::Validation(error) => Some(error.code().as_str()),
            Self::Io { .. } | Self::Read { .. } | Self::Parse { .. } => None,
        }
    }

    /// Stable code of the dataset error behind a validation failure.
    #[must_use]
    pub const fn dataset_code(&self) -> Option<&'static str> {
        match self {
            Self::Validation(error) => match error.dataset_code() {
                Some(code) => Some(code.as_str()),
                None => None,
            },
            _ => None,
        }
    }

    /// One-based input line the failure points at, if any.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::Read { line, .. } | Self::Parse { line, .. } => Some(*line),
            Self::Io { .. } | Self::Config(_) | Self::Validation(_) => None,
        }
    }
}

/// Per-cluster line of a score report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSummary {
    /// Cluster identifier from the input.
    pub id: ClusterId,
    /// Number of records assigned to the cluster.
    pub size: usize,
    /// Majority class, when scoring ran.
    pub label: Option<String>,
}

/// Summarises the outcome of the `score` command.
#[derive(Debug, Clone)]
pub struct ScoreSummary {
    /// Name of the scored dataset.
    pub data_source: String,
    /// Number of records read.
    pub records: usize,
    /// Purity and NMI.
    pub metrics: ValidationMetrics,
    /// Clusters in ascending id order.
    pub clusters: Vec<ClusterSummary>,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading or scoring fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clustrum_cli::cli::{ClassEntropyArg, Cli, Command, ScoreArgs, run_cli};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "1,a\n1,a\n2,b\n")?;
/// let cli = Cli {
///     command: Command::Score(ScoreArgs {
///         path: file.path().to_path_buf(),
///         delimiter: ',',
///         parallel: false,
///         class_entropy: ClassEntropyArg::ClassFrequencies,
///         name: None,
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.records, 3);
/// assert_eq!(summary.metrics.purity(), Some(1.0));
/// # Ok(())
/// # }
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ScoreSummary, CliError> {
    match cli.command {
        Command::Score(args) => {
            Span::current().record("command", field::display("score"));
            run_score(args)
        }
    }
}

#[instrument(
    name = "cli.score",
    err,
    skip(args),
    fields(path = field::Empty, parallel = args.parallel, class_entropy = ?args.class_entropy),
)]
pub(super) fn run_score(args: ScoreArgs) -> Result<ScoreSummary, CliError> {
    let ScoreArgs {
        path,
        delimiter,
        parallel,
        class_entropy,
        name,
    } = args;
    Span::current().record("path", field::display(path.display()));

    let builder = ClustererBuilder::new()
        .with_parallelized(parallel)
        .with_class_entropy(class_entropy.into());
    let chosen_name = derive_data_source_name(&path, name.as_deref());
    let reader = open_assignments(&path)?;
    let loaded = parse_assignments(&chosen_name, reader, delimiter)?;

    let mut dataset = loaded.dataset;
    let mut clusterer = builder.build(loaded.registry, MembershipPredictor)?;
    let metrics = clusterer.validate_model(&mut dataset)?;

    let clusters = clusterer
        .clusters()
        .values()
        .map(|cluster| ClusterSummary {
            id: cluster.id(),
            size: cluster.size(),
            label: cluster.label().cloned(),
        })
        .collect();

    info!(
        data_source = dataset.name(),
        records = dataset.len(),
        scored = metrics.is_scored(),
        "score command completed"
    );
    Ok(ScoreSummary {
        data_source: dataset.name().to_owned(),
        records: dataset.len(),
        metrics,
        clusters,
    })
}

pub(super) fn derive_data_source_name(path: &Path, override_name: Option<&str>) -> String {
    if let Some(name) = override_name {
        return name.to_owned();
    }

    path.file_stem()
        .and_then(|value| value.to_str())
        .map_or_else(|| "assignments".to_owned(), ToOwned::to_owned)
}

/// Renders `summary` to `writer` in a tab-separated text format.
///
/// Scores print with six decimals, or `n/a` when the input had no classes.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clustrum_cli::cli::{ScoreSummary, render_summary};
/// # use clustrum_core::ValidationMetrics;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ScoreSummary {
///     data_source: "demo".into(),
///     records: 0,
///     metrics: ValidationMetrics::empty(),
///     clusters: Vec::new(),
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(
///     String::from_utf8(buffer)?,
///     "data source: demo\nrecords: 0\npurity: n/a\nnmi: n/a\n"
/// );
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ScoreSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "data source: {}", summary.data_source)?;
    writeln!(writer, "records: {}", summary.records)?;
    write_score(&mut writer, "purity", summary.metrics.purity())?;
    write_score(&mut writer, "nmi", summary.metrics.nmi())?;
    for cluster in &summary.clusters {
        let label = cluster.label.as_deref().unwrap_or("-");
        writeln!(writer, "{}\t{}\t{label}", cluster.id, cluster.size)?;
    }
    Ok(())
}

fn write_score(writer: &mut impl Write, name: &str, score: Option<f64>) -> io::Result<()> {
    match score {
        Some(value) => writeln!(writer, "{name}: {value:.6}"),
        None => writeln!(writer, "{name}: n/a"),
    }
}
