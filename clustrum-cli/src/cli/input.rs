//! Loading of delimited `cluster<delim>class` assignment files.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader},
    num::ParseIntError,
    path::Path,
};

use clustrum_core::{
    Cluster, ClusterId, ClusterRegistry, GoldStandardClasses, InMemoryDataset, LabelledRecord,
    RecordId,
};
use thiserror::Error;
use tracing::{Span, debug, field, instrument};

use super::commands::CliError;

/// Reason a single input line was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputLineError {
    /// The line does not contain the field delimiter.
    #[error("expected `cluster{delimiter}class`")]
    MissingDelimiter {
        /// Delimiter the loader was configured with.
        delimiter: char,
    },
    /// The cluster field is not an unsigned integer.
    #[error("invalid cluster id `{raw}`: {source}")]
    InvalidClusterId {
        /// Raw cluster field.
        raw: String,
        /// Integer parse failure.
        #[source]
        source: ParseIntError,
    },
    /// The class field is empty after trimming.
    #[error("class must not be empty")]
    EmptyClass,
}

/// Registry and dataset reconstructed from an assignment file.
///
/// Records are numbered from zero in file order and each cluster lists its
/// records as members. Classes become the gold standard in first-seen order.
#[derive(Debug, Clone)]
pub struct LoadedAssignments {
    /// Clusters and gold-standard classes.
    pub registry: ClusterRegistry<Cluster<String>>,
    /// Labelled records awaiting prediction.
    pub dataset: InMemoryDataset<String>,
}

#[instrument(name = "cli.open_assignments", err, fields(path = field::Empty))]
pub(super) fn open_assignments(path: &Path) -> Result<BufReader<File>, CliError> {
    Span::current().record("path", field::display(path.display()));
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Parses assignment lines from `reader`.
///
/// Blank lines and lines starting with `#` are skipped. Fields are split on
/// the first `delimiter` and trimmed.
///
/// # Errors
/// Returns [`CliError::Read`] when the reader fails and [`CliError::Parse`]
/// with the one-based line number for malformed lines.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use clustrum_cli::cli::parse_assignments;
///
/// let loaded = parse_assignments("demo", Cursor::new("# header\n1,a\n2,b\n\n2,a\n"), ',')?;
/// assert_eq!(loaded.registry.cluster_count(), 2);
/// assert_eq!(loaded.registry.gold_standard_classes().len(), 2);
/// # Ok::<(), clustrum_cli::cli::CliError>(())
/// ```
#[instrument(name = "cli.parse_assignments", err, skip(reader), fields(records = field::Empty))]
pub fn parse_assignments<R: BufRead>(
    name: &str,
    reader: R,
    delimiter: char,
) -> Result<LoadedAssignments, CliError> {
    let mut clusters: BTreeMap<ClusterId, Cluster<String>> = BTreeMap::new();
    let mut classes = GoldStandardClasses::new();
    let mut records = Vec::new();
    let mut next_record = 0_u64;

    for (line, raw) in (1_usize..).zip(reader.lines()) {
        let content = raw.map_err(|source| CliError::Read { line, source })?;
        let trimmed = content.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (cluster, class) =
            parse_line(trimmed, delimiter).map_err(|source| CliError::Parse { line, source })?;

        let record = RecordId::new(next_record);
        next_record += 1;
        clusters
            .entry(cluster)
            .or_insert_with(|| Cluster::new(cluster))
            .add(record);
        classes.insert(class.clone());
        records.push(LabelledRecord::new(record, Some(class)));
    }

    Span::current().record("records", records.len());
    debug!(
        clusters = clusters.len(),
        classes = classes.len(),
        "assignments parsed"
    );

    let mut registry = ClusterRegistry::new();
    registry.set_clusters(clusters.into_values());
    registry.set_gold_standard_classes(classes);
    Ok(LoadedAssignments {
        registry,
        dataset: InMemoryDataset::new(name, records),
    })
}

fn parse_line(line: &str, delimiter: char) -> Result<(ClusterId, String), InputLineError> {
    let (raw_cluster, raw_class) = line
        .split_once(delimiter)
        .ok_or(InputLineError::MissingDelimiter { delimiter })?;
    let raw_cluster = raw_cluster.trim();
    let cluster = raw_cluster
        .parse::<u64>()
        .map_err(|source| InputLineError::InvalidClusterId {
            raw: raw_cluster.to_owned(),
            source,
        })?;
    let class = raw_class.trim();
    if class.is_empty() {
        return Err(InputLineError::EmptyClass);
    }
    Ok((ClusterId::new(cluster), class.to_owned()))
}
