//! Seeded synthetic labelled assignments.
//!
//! Each cluster is given a home class, cycling through the classes, and
//! records are dealt round-robin across clusters. A configurable share of
//! records draws its class uniformly at random instead, which keeps purity
//! and NMI away from the trivial perfect score.

use clustrum_core::{
    Cluster, ClusterId, ClusterRegistry, InMemoryDataset, LabelledRecord, RecordId,
};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Errors raised by [`SyntheticAssignments::generate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntheticError {
    /// No clusters were requested.
    #[error("cluster_count must be greater than zero")]
    ZeroClusters,
    /// No classes were requested.
    #[error("class_count must be greater than zero")]
    ZeroClasses,
    /// The noise share is not a probability.
    #[error("noise must lie in [0, 1], got {noise}")]
    InvalidNoise {
        /// Offending value.
        noise: f64,
    },
}

/// Shape of a synthetic assignment set.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Number of records to generate.
    pub record_count: usize,
    /// Number of predicted clusters.
    pub cluster_count: u64,
    /// Number of gold-standard classes.
    pub class_count: u32,
    /// Probability that a record ignores its cluster's home class.
    pub noise: f64,
    /// Seed for the deterministic generator.
    pub seed: u64,
}

/// Registry and pre-predicted dataset ready for
/// [`clustrum_core::validate_model`].
#[derive(Clone, Debug)]
pub struct SyntheticAssignments {
    /// Clusters and gold-standard classes.
    pub registry: ClusterRegistry<Cluster<u32>>,
    /// Records carrying both a predicted cluster and a class.
    pub dataset: InMemoryDataset<u32>,
}

impl SyntheticAssignments {
    /// Generates assignments for `config`.
    ///
    /// # Errors
    /// Returns [`SyntheticError`] when the configuration is degenerate.
    ///
    /// # Examples
    /// ```
    /// use clustrum_benches::synthetic::{SyntheticAssignments, SyntheticConfig};
    /// use clustrum_core::Dataset;
    ///
    /// let generated = SyntheticAssignments::generate(&SyntheticConfig {
    ///     record_count: 12,
    ///     cluster_count: 3,
    ///     class_count: 2,
    ///     noise: 0.25,
    ///     seed: 7,
    /// })?;
    /// assert_eq!(generated.dataset.len(), 12);
    /// assert_eq!(generated.registry.cluster_count(), 3);
    /// # Ok::<(), clustrum_benches::synthetic::SyntheticError>(())
    /// ```
    pub fn generate(config: &SyntheticConfig) -> Result<Self, SyntheticError> {
        validate(config)?;
        let mut rng = SmallRng::seed_from_u64(config.seed);

        let homes: Vec<(ClusterId, u32)> = (0..config.cluster_count)
            .map(ClusterId::new)
            .zip((0..config.class_count).cycle())
            .collect();

        let records = (0_u64..)
            .zip(homes.iter().cycle())
            .take(config.record_count)
            .map(|(id, &(cluster, home))| {
                let class = if rng.gen_bool(config.noise) {
                    rng.gen_range(0..config.class_count)
                } else {
                    home
                };
                LabelledRecord::new(RecordId::new(id), Some(class)).with_prediction(cluster)
            })
            .collect();

        let mut registry = ClusterRegistry::new();
        registry.set_clusters(homes.iter().map(|&(id, _)| Cluster::new(id)));
        registry.set_gold_standard_classes((0..config.class_count).collect());
        Ok(Self {
            registry,
            dataset: InMemoryDataset::new("synthetic", records),
        })
    }
}

fn validate(config: &SyntheticConfig) -> Result<(), SyntheticError> {
    if config.cluster_count == 0 {
        return Err(SyntheticError::ZeroClusters);
    }
    if config.class_count == 0 {
        return Err(SyntheticError::ZeroClasses);
    }
    if !(0.0..=1.0).contains(&config.noise) {
        return Err(SyntheticError::InvalidNoise {
            noise: config.noise,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clustrum_core::{Dataset, ValidationOptions, validate_model};
    use rstest::{fixture, rstest};

    #[fixture]
    fn config() -> SyntheticConfig {
        SyntheticConfig {
            record_count: 200,
            cluster_count: 5,
            class_count: 3,
            noise: 0.3,
            seed: 42,
        }
    }

    #[rstest]
    fn same_seed_reproduces_records(config: SyntheticConfig) {
        let first = SyntheticAssignments::generate(&config).expect("config is valid");
        let second = SyntheticAssignments::generate(&config).expect("config is valid");
        assert_eq!(first.dataset.records(), second.dataset.records());
    }

    #[rstest]
    fn noiseless_assignments_are_pure(config: SyntheticConfig) {
        let mut generated = SyntheticAssignments::generate(&SyntheticConfig {
            noise: 0.0,
            ..config
        })
        .expect("config is valid");
        let metrics = validate_model(
            &mut generated.registry,
            &generated.dataset,
            ValidationOptions::default(),
        )
        .expect("generated assignments validate");
        assert_eq!(metrics.purity(), Some(1.0));
    }

    #[rstest]
    #[case::no_clusters(SyntheticConfig { cluster_count: 0, ..config() }, SyntheticError::ZeroClusters)]
    #[case::no_classes(SyntheticConfig { class_count: 0, ..config() }, SyntheticError::ZeroClasses)]
    #[case::noise_above_one(
        SyntheticConfig { noise: 1.5, ..config() },
        SyntheticError::InvalidNoise { noise: 1.5 },
    )]
    fn degenerate_configs_are_rejected(
        #[case] config: SyntheticConfig,
        #[case] expected: SyntheticError,
    ) {
        assert_eq!(SyntheticAssignments::generate(&config).err(), Some(expected));
    }
}
