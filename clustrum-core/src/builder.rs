//! Builder utilities for configuring [`Clusterer`] instances.
//!
//! Exposes the validation knobs carried by a model and the checks applied
//! before a [`Clusterer`] is constructed.

use crate::{
    cluster::AsCluster, clusterer::Clusterer, error::ClustrumError, registry::ClusterRegistry,
    validation::ValidationOptions,
};

/// Selects the frequency table used for the class entropy `H(C)` when
/// normalising mutual information.
///
/// `ClassFrequencies` is the information-theoretic definition.
/// `ClusterFrequencies` reproduces a legacy scorer that summed over the
/// cluster table, which makes `H(C)` equal `H(W)` and skews NMI whenever the
/// cluster and class counts differ. It is kept so results from that scorer
/// can be reproduced and compared.
///
/// # Examples
/// ```
/// use clustrum_core::ClassEntropySource;
///
/// assert_eq!(ClassEntropySource::default(), ClassEntropySource::ClassFrequencies);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClassEntropySource {
    /// Sum over the gold-standard class frequencies.
    #[default]
    ClassFrequencies,
    /// Sum over the cluster frequencies, as the legacy scorer did.
    ClusterFrequencies,
}

/// Configures and constructs [`Clusterer`] instances.
///
/// # Examples
/// ```
/// use clustrum_core::{
///     ClassEntropySource, Cluster, ClusterRegistry, ClustererBuilder, MembershipPredictor,
/// };
///
/// let registry: ClusterRegistry<Cluster<&str>> = ClusterRegistry::new();
/// let clusterer = ClustererBuilder::new()
///     .with_class_entropy(ClassEntropySource::ClusterFrequencies)
///     .build(registry, MembershipPredictor)
///     .expect("builder configuration is valid");
/// assert!(!clusterer.is_parallelized());
/// assert_eq!(clusterer.class_entropy(), ClassEntropySource::ClusterFrequencies);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ClustererBuilder {
    parallelized: bool,
    class_entropy: ClassEntropySource,
}

impl ClustererBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use clustrum_core::{ClassEntropySource, ClustererBuilder};
    ///
    /// let builder = ClustererBuilder::new();
    /// assert!(!builder.parallelized());
    /// assert_eq!(builder.class_entropy(), ClassEntropySource::ClassFrequencies);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests sharded frequency counting during validation.
    #[must_use]
    pub const fn with_parallelized(mut self, parallelized: bool) -> Self {
        self.parallelized = parallelized;
        self
    }

    /// Returns whether sharded counting was requested.
    #[must_use]
    pub const fn parallelized(&self) -> bool {
        self.parallelized
    }

    /// Selects the class entropy source.
    ///
    /// # Examples
    /// ```
    /// use clustrum_core::{ClassEntropySource, ClustererBuilder};
    ///
    /// let builder =
    ///     ClustererBuilder::new().with_class_entropy(ClassEntropySource::ClusterFrequencies);
    /// assert_eq!(builder.class_entropy(), ClassEntropySource::ClusterFrequencies);
    /// ```
    #[must_use]
    pub const fn with_class_entropy(mut self, source: ClassEntropySource) -> Self {
        self.class_entropy = source;
        self
    }

    /// Returns the configured class entropy source.
    #[must_use]
    pub const fn class_entropy(&self) -> ClassEntropySource {
        self.class_entropy
    }

    /// Validates the configuration and wraps `registry` and `predictor` in a
    /// [`Clusterer`].
    ///
    /// # Errors
    /// Returns [`ClustrumError::ParallelUnavailable`] when parallel
    /// validation is requested but the `parallel` feature is disabled.
    pub fn build<K, P>(
        self,
        registry: ClusterRegistry<K>,
        predictor: P,
    ) -> Result<Clusterer<K, P>, ClustrumError>
    where
        K: AsCluster,
    {
        let options = self.options()?;
        Ok(Clusterer::new(registry, predictor, options))
    }

    pub(crate) fn options(self) -> Result<ValidationOptions, ClustrumError> {
        ensure_parallel_available(self.parallelized)?;
        Ok(ValidationOptions {
            parallelized: self.parallelized,
            class_entropy: self.class_entropy,
        })
    }
}

pub(crate) const fn ensure_parallel_available(parallelized: bool) -> Result<(), ClustrumError> {
    if parallelized && !cfg!(feature = "parallel") {
        return Err(ClustrumError::ParallelUnavailable);
    }
    Ok(())
}
