//! External validation of a clustering against gold-standard classes.
//!
//! Scoring follows the information-retrieval definitions of purity and
//! normalized mutual information:
//!
//! - purity is the share of records covered by their cluster's majority
//!   class;
//! - `I(W, C)` sums `(Nwc / n) * ln(n * Nwc / (Nw * Nc))` over non-empty
//!   cells;
//! - NMI divides `I(W, C)` by the mean of the clustering and class entropies.
//!
//! Every logarithm is guarded: empty clusters, empty classes and empty cells
//! contribute exactly zero.

use std::{collections::BTreeMap, hash::Hash};

use tracing::{debug, info, instrument};
#[cfg(not(feature = "parallel"))]
use tracing::warn;

use crate::{
    builder::ClassEntropySource,
    cluster::{AsCluster, ClusterId, sealed::Internal},
    contingency::ContingencyTable,
    dataset::{Dataset, Record},
    error::{Result, ValidationError},
    metrics::ValidationMetrics,
    registry::{ClusterRegistry, GoldStandardClasses},
};

/// Knobs controlling a single validation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Shard the frequency counting across rayon workers.
    pub parallelized: bool,
    /// Frequency table used for the class entropy term.
    pub class_entropy: ClassEntropySource,
}

/// Scores the registry's clusters against the dataset's gold-standard
/// classes.
///
/// Every record must already carry a predicted cluster. When the registry
/// has no gold-standard classes the call returns
/// [`ValidationMetrics::empty`] and touches nothing. Otherwise each cluster's
/// label is set to its majority class once every score has been computed.
///
/// # Errors
/// Returns [`ValidationError::EmptyDataset`] for an empty dataset,
/// [`ValidationError::MissingPrediction`], [`ValidationError::MissingClass`]
/// or [`ValidationError::UnknownClass`] for malformed records, and
/// [`ValidationError::UnknownClusterId`] when a prediction names a cluster
/// the registry does not hold. No label is written when an error is returned.
///
/// # Examples
/// ```
/// use clustrum_core::{
///     Cluster, ClusterId, ClusterRegistry, InMemoryDataset, ValidationOptions, validate_model,
/// };
///
/// let mut registry: ClusterRegistry<Cluster<&str>> = ClusterRegistry::new();
/// registry.set_clusters([Cluster::new(ClusterId::new(1)), Cluster::new(ClusterId::new(2))]);
/// registry.set_gold_standard_classes(["a", "b"].into_iter().collect());
/// let dataset = InMemoryDataset::from_assignments(
///     "toy",
///     [("a", 1), ("a", 1), ("a", 1), ("b", 2), ("b", 2), ("b", 2)],
/// );
///
/// let metrics = validate_model(&mut registry, &dataset, ValidationOptions::default())?;
/// assert_eq!(metrics.purity(), Some(1.0));
/// assert!((metrics.nmi().unwrap_or_default() - 1.0).abs() < 1e-12);
/// assert_eq!(registry.cluster(ClusterId::new(2)).and_then(|c| c.label()), Some(&"b"));
/// # Ok::<(), clustrum_core::ValidationError>(())
/// ```
#[instrument(
    name = "core.validate",
    err,
    skip(registry, dataset, options),
    fields(
        dataset = %dataset.name(),
        records = dataset.len(),
        clusters = registry.cluster_count(),
        classes = registry.gold_standard_classes().len(),
        parallelized = options.parallelized,
        class_entropy = ?options.class_entropy,
    ),
)]
pub fn validate_model<K, D>(
    registry: &mut ClusterRegistry<K>,
    dataset: &D,
    options: ValidationOptions,
) -> Result<ValidationMetrics>
where
    K: AsCluster,
    K::Class: Eq + Hash + Clone + Send + Sync,
    D: Dataset,
    D::Record: Record<Class = K::Class> + Sync,
{
    if registry.gold_standard_classes().is_empty() {
        debug!("no gold-standard classes; skipping external validation");
        return Ok(ValidationMetrics::empty());
    }
    if dataset.is_empty() {
        return Err(ValidationError::EmptyDataset {
            dataset: dataset.name().into(),
        });
    }

    let table = build_contingency(registry, dataset.records(), options.parallelized)?;
    let majority = majority_classes(&table);
    let purity = purity_score(&table, &majority);
    let nmi = normalized_mutual_information(&table, options.class_entropy)?;

    let classes = registry.gold_standard_classes();
    let mut labels = BTreeMap::new();
    for &(cluster, position, _) in &majority {
        let class = classes
            .get(position)
            .cloned()
            .ok_or(ValidationError::InvariantViolation {
                context: "resolving a majority class",
            })?;
        labels.insert(cluster, class);
    }
    for (id, cluster) in registry.clusters_mut().iter_mut() {
        if let Some(label) = labels.remove(id) {
            cluster.as_cluster_mut(Internal(())).set_label(label);
        }
    }

    info!(purity, nmi, "external validation completed");
    Ok(ValidationMetrics::scored(purity, nmi))
}

#[instrument(
    name = "core.build_contingency",
    err,
    skip(registry, records),
    fields(records = records.len()),
)]
fn build_contingency<K, R>(
    registry: &ClusterRegistry<K>,
    records: &[R],
    parallelized: bool,
) -> Result<ContingencyTable>
where
    K: AsCluster,
    K::Class: Eq + Hash + Clone + Send + Sync,
    R: Record<Class = K::Class> + Sync,
{
    let clusters: Vec<ClusterId> = registry.clusters().keys().copied().collect();
    let classes = registry.gold_standard_classes();

    if parallelized {
        return count_sharded(&clusters, classes, records);
    }
    ContingencyTable::from_records(&clusters, classes, records)
}

#[cfg(feature = "parallel")]
fn count_sharded<R, C>(
    clusters: &[ClusterId],
    classes: &GoldStandardClasses<C>,
    records: &[R],
) -> Result<ContingencyTable>
where
    R: Record<Class = C> + Sync,
    C: Eq + Hash + Clone + Sync,
{
    ContingencyTable::from_records_parallel(clusters, classes, records)
}

#[cfg(not(feature = "parallel"))]
fn count_sharded<R, C>(
    clusters: &[ClusterId],
    classes: &GoldStandardClasses<C>,
    records: &[R],
) -> Result<ContingencyTable>
where
    R: Record<Class = C> + Sync,
    C: Eq + Hash + Clone + Sync,
{
    warn!("parallel feature disabled; counting sequentially");
    ContingencyTable::from_records(clusters, classes, records)
}

/// Majority class position and its count for every cluster, in identifier
/// order. Ties go to the earliest gold-standard class.
fn majority_classes(table: &ContingencyTable) -> Vec<(ClusterId, usize, usize)> {
    table
        .rows()
        .map(|(cluster, row)| {
            let (position, count) = row.iter().copied().enumerate().fold(
                (0, 0),
                |(best_position, best_count), (position, count)| {
                    if count > best_count {
                        (position, count)
                    } else {
                        (best_position, best_count)
                    }
                },
            );
            (cluster, position, count)
        })
        .collect()
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "purity is a ratio of counts."
)]
fn purity_score(table: &ContingencyTable, majority: &[(ClusterId, usize, usize)]) -> f64 {
    let covered: usize = majority.iter().map(|&(_, _, count)| count).sum();
    covered as f64 / table.total() as f64
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "mutual information requires floating-point logarithms."
)]
fn mutual_information(table: &ContingencyTable) -> Result<f64> {
    let total = table.total() as f64;
    let log_total = total.ln();
    let mut information = 0.0_f64;
    for (cluster, row) in table.rows() {
        let cluster_count = table.cluster_count(cluster)? as f64;
        for (position, &cell) in row.iter().enumerate() {
            if cell == 0 {
                continue;
            }
            let class_count = table.class_count(position)? as f64;
            let cell_count = cell as f64;
            information += (cell_count / total)
                * (cell_count.ln() - class_count.ln() - cluster_count.ln() + log_total);
        }
    }
    Ok(information)
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "entropy requires floating-point logarithms."
)]
fn entropy(counts: impl Iterator<Item = usize>, total: usize) -> f64 {
    let total_f64 = total as f64;
    let log_total = total_f64.ln();
    let mut entropy = 0.0_f64;
    for count in counts.filter(|&count| count > 0) {
        let count_f64 = count as f64;
        entropy -= (count_f64 / total_f64) * (count_f64.ln() - log_total);
    }
    entropy
}

#[expect(
    clippy::float_arithmetic,
    reason = "NMI definition requires floating-point arithmetic."
)]
fn normalized_mutual_information(
    table: &ContingencyTable,
    class_entropy: ClassEntropySource,
) -> Result<f64> {
    let information = mutual_information(table)?;
    let cluster_entropy = entropy(table.cluster_counts(), table.total());
    let true_class_entropy = entropy(table.class_counts(), table.total());
    if cluster_entropy <= 0.0 && true_class_entropy <= 0.0 {
        // Both partitions put every record in one group, so they agree.
        return Ok(1.0);
    }

    let class_entropy = match class_entropy {
        ClassEntropySource::ClassFrequencies => true_class_entropy,
        ClassEntropySource::ClusterFrequencies => cluster_entropy,
    };
    let mean_entropy = (cluster_entropy + class_entropy) / 2.0;
    if mean_entropy <= 0.0 {
        return Ok(0.0);
    }
    Ok((information / mean_entropy).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::{
        cluster::{Cluster, RecordId},
        dataset::{InMemoryDataset, LabelledRecord},
    };

    type Registry = ClusterRegistry<Cluster<&'static str>>;

    const SIX_CLASSES: [&str; 6] = ["A", "A", "A", "B", "B", "B"];

    fn registry(cluster_ids: &[u64], classes: &[&'static str]) -> Registry {
        let mut registry = Registry::new();
        registry.set_clusters(
            cluster_ids
                .iter()
                .map(|&id| Cluster::new(ClusterId::new(id))),
        );
        registry.set_gold_standard_classes(classes.iter().copied().collect());
        registry
    }

    fn dataset(classes: &[&'static str], clusters: &[u64]) -> InMemoryDataset<&'static str> {
        InMemoryDataset::from_assignments(
            "fixture",
            classes.iter().copied().zip(clusters.iter().copied()),
        )
    }

    fn label_of(registry: &Registry, id: u64) -> Option<&'static str> {
        registry
            .cluster(ClusterId::new(id))
            .and_then(|cluster| cluster.label().copied())
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let value = actual.expect("score must be present");
        assert!(
            (value - expected).abs() < 1e-12,
            "expected {expected}, got {value}"
        );
    }

    #[rstest]
    #[case::sequential(false)]
    #[case::parallel(true)]
    fn perfect_clustering_scores_one(#[case] parallelized: bool) {
        let mut registry = registry(&[1, 2], &["A", "B"]);
        let options = ValidationOptions {
            parallelized,
            ..ValidationOptions::default()
        };
        let metrics = validate_model(&mut registry, &dataset(&SIX_CLASSES, &[1, 1, 1, 2, 2, 2]), options)
            .expect("validation succeeds");

        assert_eq!(metrics.purity(), Some(1.0));
        assert_close(metrics.nmi(), 1.0);
        assert_eq!(label_of(&registry, 1), Some("A"));
        assert_eq!(label_of(&registry, 2), Some("B"));
    }

    #[test]
    fn single_cluster_carries_no_information() {
        let mut registry = registry(&[1], &["A", "B"]);
        let metrics = validate_model(
            &mut registry,
            &dataset(&SIX_CLASSES, &[1; 6]),
            ValidationOptions::default(),
        )
        .expect("validation succeeds");

        assert_eq!(metrics.purity(), Some(0.5));
        assert_close(metrics.nmi(), 0.0);
        assert_eq!(label_of(&registry, 1), Some("A"));
    }

    #[test]
    fn single_cluster_under_cluster_entropy_scores_zero() {
        let mut registry = registry(&[1], &["A", "B"]);
        let options = ValidationOptions {
            class_entropy: ClassEntropySource::ClusterFrequencies,
            ..ValidationOptions::default()
        };
        let metrics = validate_model(&mut registry, &dataset(&SIX_CLASSES, &[1; 6]), options)
            .expect("validation succeeds");

        assert_eq!(metrics.nmi(), Some(0.0));
    }

    #[rstest]
    #[case::class_frequencies(
        ClassEntropySource::ClassFrequencies,
        4.0 * 2.0_f64.ln() / (3.0 * 6.0_f64.ln())
    )]
    #[case::cluster_frequencies(
        ClassEntropySource::ClusterFrequencies,
        2.0 * 2.0_f64.ln() / (3.0 * 3.0_f64.ln())
    )]
    fn class_entropy_source_changes_denominator(
        #[case] class_entropy: ClassEntropySource,
        #[case] expected_nmi: f64,
    ) {
        let mut registry = registry(&[1, 2, 3], &["A", "B"]);
        let options = ValidationOptions {
            class_entropy,
            ..ValidationOptions::default()
        };
        let metrics = validate_model(&mut registry, &dataset(&SIX_CLASSES, &[1, 1, 2, 2, 3, 3]), options)
            .expect("validation succeeds");

        assert_close(metrics.purity(), 5.0 / 6.0);
        assert_close(metrics.nmi(), expected_nmi);
        // Cluster 2 holds one A and one B; the earlier class wins the tie.
        assert_eq!(label_of(&registry, 2), Some("A"));
        assert_eq!(label_of(&registry, 3), Some("B"));
    }

    #[test]
    fn empty_gold_standard_skips_scoring() {
        let mut registry = registry(&[1], &[]);
        let metrics = validate_model(
            &mut registry,
            &dataset(&SIX_CLASSES, &[1; 6]),
            ValidationOptions::default(),
        )
        .expect("missing ground truth is not an error");

        assert_eq!(metrics, ValidationMetrics::empty());
        assert_eq!(label_of(&registry, 1), None);
    }

    #[test]
    fn unknown_cluster_fails_without_labelling() {
        let mut registry = registry(&[1, 2], &["A", "B"]);
        let err = validate_model(
            &mut registry,
            &dataset(&SIX_CLASSES, &[1, 1, 1, 2, 2, 99]),
            ValidationOptions::default(),
        )
        .expect_err("cluster 99 is not registered");

        assert_eq!(
            err,
            ValidationError::UnknownClusterId {
                record: RecordId::new(5),
                cluster: ClusterId::new(99),
            }
        );
        assert!(err.is_invariant_violation());
        assert!(registry.labels().all(|(_, label)| label.is_none()));
    }

    #[test]
    fn empty_clusters_do_not_produce_nan() {
        let mut registry = registry(&[1, 2, 7], &["A", "B", "C"]);
        let metrics = validate_model(
            &mut registry,
            &dataset(&SIX_CLASSES, &[1, 1, 1, 2, 2, 2]),
            ValidationOptions::default(),
        )
        .expect("validation succeeds");

        let nmi = metrics.nmi().expect("nmi must be present");
        assert!(nmi.is_finite());
        assert_close(Some(nmi), 1.0);
        assert_eq!(metrics.purity(), Some(1.0));
        // An empty cluster takes the first class, matching the tie rule.
        assert_eq!(label_of(&registry, 7), Some("A"));
    }

    #[test]
    fn singleton_partitions_are_defined() {
        let mut registry = registry(&[0], &["only"]);
        let metrics = validate_model(
            &mut registry,
            &dataset(&["only"], &[0]),
            ValidationOptions::default(),
        )
        .expect("validation succeeds");

        assert_eq!(metrics.purity(), Some(1.0));
        assert_eq!(metrics.nmi(), Some(1.0));
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let mut registry = registry(&[0], &["A"]);
        let empty: InMemoryDataset<&'static str> = InMemoryDataset::new("void", Vec::new());
        let err = validate_model(&mut registry, &empty, ValidationOptions::default())
            .expect_err("nothing to score");
        assert_eq!(
            err,
            ValidationError::EmptyDataset {
                dataset: "void".into()
            }
        );
    }

    #[test]
    fn record_without_class_is_rejected() {
        let mut registry = registry(&[0], &["A"]);
        let records = vec![
            LabelledRecord::new(RecordId::new(0), Some("A")).with_prediction(ClusterId::new(0)),
            LabelledRecord::new(RecordId::new(1), None).with_prediction(ClusterId::new(0)),
        ];
        let err = validate_model(
            &mut registry,
            &InMemoryDataset::new("partial", records),
            ValidationOptions::default(),
        )
        .expect_err("record 1 is unannotated");
        assert_eq!(err.code().as_str(), "VALIDATION_MISSING_CLASS");
    }

    #[test]
    fn repeated_validation_is_bit_identical() {
        let mut registry = registry(&[0, 1, 2], &["A", "B"]);
        let data = dataset(&SIX_CLASSES, &[0, 1, 2, 0, 1, 1]);

        let first = validate_model(&mut registry, &data, ValidationOptions::default())
            .expect("validation succeeds");
        let second = validate_model(&mut registry, &data, ValidationOptions::default())
            .expect("validation succeeds");

        assert_eq!(
            first.nmi().map(f64::to_bits),
            second.nmi().map(f64::to_bits)
        );
        assert_eq!(
            first.purity().map(f64::to_bits),
            second.purity().map(f64::to_bits)
        );
    }
}
