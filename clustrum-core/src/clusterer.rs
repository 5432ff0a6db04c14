//! Trained clustering model façade.
//!
//! Provides the [`Clusterer`] entry point that couples a
//! [`ClusterRegistry`] with the prediction step and the validation options
//! configured through [`crate::ClustererBuilder`].

use std::{collections::BTreeMap, fmt, hash::Hash, sync::Arc};

use tracing::instrument;

use crate::{
    builder::{ClassEntropySource, ensure_parallel_available},
    cluster::{AsCluster, ClusterId},
    dataset::{Dataset, Predictor, Record},
    error::{ClustrumError, Result, ValidationError},
    metrics::ValidationMetrics,
    registry::ClusterRegistry,
    validation::{ValidationOptions, validate_model},
};

/// A trained clustering model ready for external validation.
///
/// # Examples
/// ```
/// use clustrum_core::{
///     Cluster, ClusterId, ClusterRegistry, ClustererBuilder, InMemoryDataset, LabelledRecord,
///     MembershipPredictor, RecordId,
/// };
///
/// let mut registry: ClusterRegistry<Cluster<&str>> = ClusterRegistry::new();
/// let mut left = Cluster::new(ClusterId::new(0));
/// let mut right = Cluster::new(ClusterId::new(1));
/// left.add(RecordId::new(0));
/// right.add(RecordId::new(1));
/// registry.set_clusters([left, right]);
/// registry.set_gold_standard_classes(["x", "y"].into_iter().collect());
///
/// let mut clusterer = ClustererBuilder::new()
///     .build(registry, MembershipPredictor)
///     .expect("builder must succeed");
/// let mut dataset = InMemoryDataset::new(
///     "train",
///     vec![
///         LabelledRecord::new(RecordId::new(0), Some("x")),
///         LabelledRecord::new(RecordId::new(1), Some("y")),
///     ],
/// );
/// let metrics = clusterer.validate_model(&mut dataset)?;
/// assert_eq!(metrics.purity(), Some(1.0));
/// # Ok::<(), clustrum_core::ValidationError>(())
/// ```
pub struct Clusterer<K: AsCluster, P> {
    registry: ClusterRegistry<K>,
    predictor: P,
    options: ValidationOptions,
}

impl<K, P> fmt::Debug for Clusterer<K, P>
where
    K: AsCluster + fmt::Debug,
    K::Class: fmt::Debug,
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clusterer")
            .field("registry", &self.registry)
            .field("predictor", &self.predictor)
            .field("options", &self.options)
            .finish()
    }
}

impl<K, P> Clone for Clusterer<K, P>
where
    K: AsCluster + Clone,
    K::Class: Clone,
    P: Clone,
{
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            predictor: self.predictor.clone(),
            options: self.options,
        }
    }
}

impl<K: AsCluster, P> Clusterer<K, P> {
    pub(crate) const fn new(
        registry: ClusterRegistry<K>,
        predictor: P,
        options: ValidationOptions,
    ) -> Self {
        Self {
            registry,
            predictor,
            options,
        }
    }

    /// Returns the model parameters.
    #[must_use]
    pub const fn registry(&self) -> &ClusterRegistry<K> {
        &self.registry
    }

    /// Mutable access to the model parameters, for training algorithms.
    pub fn registry_mut(&mut self) -> &mut ClusterRegistry<K> {
        &mut self.registry
    }

    /// Clusters held by the model.
    #[must_use]
    pub const fn clusters(&self) -> &BTreeMap<ClusterId, K> {
        self.registry.clusters()
    }

    /// Consumes the model, returning its parameters.
    #[must_use]
    pub fn into_registry(self) -> ClusterRegistry<K> {
        self.registry
    }

    /// Returns whether validation shards its frequency counting.
    #[must_use]
    pub const fn is_parallelized(&self) -> bool {
        self.options.parallelized
    }

    /// Switches sharded counting on or off for this model.
    ///
    /// # Errors
    /// Returns [`ClustrumError::ParallelUnavailable`] when enabling
    /// parallelism without the `parallel` feature.
    pub fn set_parallelized(&mut self, parallelized: bool) -> core::result::Result<(), ClustrumError> {
        ensure_parallel_available(parallelized)?;
        self.options.parallelized = parallelized;
        Ok(())
    }

    /// Returns the class entropy source used for NMI.
    #[must_use]
    pub const fn class_entropy(&self) -> ClassEntropySource {
        self.options.class_entropy
    }

    /// Returns the options applied by [`Self::validate_model`].
    #[must_use]
    pub const fn options(&self) -> ValidationOptions {
        self.options
    }

    /// Runs the prediction step over `dataset` and scores the result.
    ///
    /// Cluster labels are updated with the majority classes on success.
    ///
    /// # Errors
    /// Returns [`ValidationError::Dataset`] when prediction fails and any
    /// error documented on [`crate::validate_model`] otherwise.
    #[instrument(
        name = "core.validate_model",
        err,
        skip(self, dataset),
        fields(dataset = %dataset.name(), records = dataset.len()),
    )]
    pub fn validate_model<D>(&mut self, dataset: &mut D) -> Result<ValidationMetrics>
    where
        P: Predictor<K, D>,
        K::Class: Eq + Hash + Clone + Send + Sync,
        D: Dataset,
        D::Record: Record<Class = K::Class> + Sync,
    {
        self.predictor
            .predict(&self.registry, dataset)
            .map_err(|error| ValidationError::Dataset {
                dataset: Arc::from(dataset.name()),
                error,
            })?;
        validate_model(&mut self.registry, dataset, self.options)
    }
}
