//! Dataset abstractions consumed by validation.
//!
//! Validation reads records through [`Dataset`] and [`Record`]; the
//! [`Predictor`] seam annotates every record with a predicted cluster before
//! scoring starts.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::{
    cluster::{AsCluster, ClusterId, RecordId},
    error::DatasetError,
    registry::ClusterRegistry,
};

/// A single observation as seen by the validation engine.
pub trait Record {
    /// Gold-standard class type.
    type Class;

    /// Identifier of the record.
    fn record_id(&self) -> RecordId;

    /// Cluster assigned by the prediction step, if any.
    fn predicted_cluster(&self) -> Option<ClusterId>;

    /// Known true class, if the record is annotated.
    fn true_class(&self) -> Option<&Self::Class>;

    /// Stores the predicted cluster for this record.
    fn assign_cluster(&mut self, cluster: ClusterId);
}

/// Finite, restartable collection of records with a known length.
///
/// # Examples
/// ```
/// use clustrum_core::{ClusterId, Dataset, InMemoryDataset, LabelledRecord, RecordId};
///
/// let dataset = InMemoryDataset::new(
///     "demo",
///     vec![LabelledRecord::new(RecordId::new(0), Some("a")).with_prediction(ClusterId::new(1))],
/// );
/// assert_eq!(dataset.len(), 1);
/// assert!(!dataset.is_empty());
/// assert_eq!(dataset.name(), "demo");
/// ```
pub trait Dataset {
    /// Record type stored by the dataset.
    type Record: Record;

    /// Human-readable name used in diagnostics.
    fn name(&self) -> &str;

    /// Read-only view of every record.
    fn records(&self) -> &[Self::Record];

    /// Mutable view used by the prediction step.
    fn records_mut(&mut self) -> &mut [Self::Record];

    /// Number of records.
    fn len(&self) -> usize {
        self.records().len()
    }

    /// Returns whether the dataset contains no records.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Prediction step run before validation.
///
/// Implementations annotate every record of `dataset` with a cluster that
/// exists in `registry`.
pub trait Predictor<K: AsCluster, D: Dataset> {
    /// Assigns a predicted cluster to every record.
    ///
    /// # Errors
    /// Returns [`DatasetError`] when a record cannot be assigned.
    fn predict(&self, registry: &ClusterRegistry<K>, dataset: &mut D) -> Result<(), DatasetError>;
}

/// Record backed by owned values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelledRecord<C> {
    id: RecordId,
    class: Option<C>,
    predicted: Option<ClusterId>,
}

impl<C> LabelledRecord<C> {
    /// Creates a record with an optional gold-standard class and no
    /// prediction.
    #[must_use]
    pub const fn new(id: RecordId, class: Option<C>) -> Self {
        Self {
            id,
            class,
            predicted: None,
        }
    }

    /// Returns the record with `cluster` recorded as its prediction.
    #[must_use]
    pub fn with_prediction(mut self, cluster: ClusterId) -> Self {
        self.predicted = Some(cluster);
        self
    }
}

impl<C> Record for LabelledRecord<C> {
    type Class = C;

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn predicted_cluster(&self) -> Option<ClusterId> {
        self.predicted
    }

    fn true_class(&self) -> Option<&C> {
        self.class.as_ref()
    }

    fn assign_cluster(&mut self, cluster: ClusterId) {
        self.predicted = Some(cluster);
    }
}

/// Vector-backed [`Dataset`].
#[derive(Debug, Clone)]
pub struct InMemoryDataset<C> {
    name: String,
    records: Vec<LabelledRecord<C>>,
}

impl<C> InMemoryDataset<C> {
    /// Wraps `records` under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, records: Vec<LabelledRecord<C>>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Builds a dataset from parallel class and prediction columns, numbering
    /// records from zero.
    ///
    /// # Examples
    /// ```
    /// use clustrum_core::{ClusterId, Dataset, InMemoryDataset, Record};
    ///
    /// let dataset = InMemoryDataset::from_assignments("pairs", [("a", 0), ("b", 1)]);
    /// assert_eq!(dataset.len(), 2);
    /// assert_eq!(dataset.records()[1].predicted_cluster(), Some(ClusterId::new(1)));
    /// ```
    #[must_use]
    pub fn from_assignments<I>(name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, u64)>,
    {
        let records = pairs
            .into_iter()
            .zip(0_u64..)
            .map(|((class, cluster), index)| {
                LabelledRecord::new(RecordId::new(index), Some(class))
                    .with_prediction(ClusterId::new(cluster))
            })
            .collect();
        Self::new(name, records)
    }

    /// Looks up the record at `index`.
    ///
    /// # Errors
    /// Returns [`DatasetError::OutOfBounds`] when `index` is past the end.
    pub fn record(&self, index: usize) -> Result<&LabelledRecord<C>, DatasetError> {
        self.records
            .get(index)
            .ok_or(DatasetError::OutOfBounds { index })
    }
}

impl<C> Dataset for InMemoryDataset<C> {
    type Record = LabelledRecord<C>;

    fn name(&self) -> &str {
        &self.name
    }

    fn records(&self) -> &[LabelledRecord<C>] {
        &self.records
    }

    fn records_mut(&mut self) -> &mut [LabelledRecord<C>] {
        &mut self.records
    }
}

/// Predicts each record into the cluster that lists it as a member.
///
/// This is the prediction step for validating a model on its own training
/// data, where the registry already holds every assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipPredictor;

impl<K, D> Predictor<K, D> for MembershipPredictor
where
    K: AsCluster,
    D: Dataset,
{
    #[instrument(
        name = "core.predict",
        err,
        skip(self, registry, dataset),
        fields(dataset = %dataset.name(), records = dataset.len()),
    )]
    fn predict(&self, registry: &ClusterRegistry<K>, dataset: &mut D) -> Result<(), DatasetError> {
        let owners: HashMap<RecordId, ClusterId> = registry
            .clusters()
            .iter()
            .flat_map(|(&id, cluster)| cluster.as_cluster().members().map(move |record| (record, id)))
            .collect();

        for record in dataset.records_mut() {
            let record_id = record.record_id();
            let cluster = owners
                .get(&record_id)
                .copied()
                .ok_or(DatasetError::Unassigned { record: record_id })?;
            record.assign_cluster(cluster);
        }
        debug!(owners = owners.len(), "membership predictions assigned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::cluster::Cluster;

    fn registry_with(assignments: &[(u64, &[u64])]) -> ClusterRegistry<Cluster<&'static str>> {
        let mut registry = ClusterRegistry::new();
        registry.set_clusters(assignments.iter().map(|&(id, members)| {
            let mut cluster = Cluster::new(ClusterId::new(id));
            for &member in members {
                cluster.add(RecordId::new(member));
            }
            cluster
        }));
        registry
    }

    #[test]
    fn membership_predictor_assigns_owning_cluster() {
        let registry = registry_with(&[(4, &[0, 2]), (9, &[1])]);
        let mut dataset = InMemoryDataset::new(
            "train",
            (0..3)
                .map(|id| LabelledRecord::new(RecordId::new(id), Some("x")))
                .collect(),
        );

        MembershipPredictor
            .predict(&registry, &mut dataset)
            .expect("every record has an owner");

        let predicted: Vec<_> = dataset
            .records()
            .iter()
            .map(Record::predicted_cluster)
            .collect();
        assert_eq!(
            predicted,
            vec![
                Some(ClusterId::new(4)),
                Some(ClusterId::new(9)),
                Some(ClusterId::new(4)),
            ]
        );
    }

    #[test]
    fn membership_predictor_rejects_orphans() {
        let registry = registry_with(&[(0, &[0])]);
        let mut dataset = InMemoryDataset::new(
            "train",
            vec![
                LabelledRecord::new(RecordId::new(0), Some("x")),
                LabelledRecord::new(RecordId::new(5), Some("y")),
            ],
        );

        let err = MembershipPredictor
            .predict(&registry, &mut dataset)
            .expect_err("record 5 has no owner");
        assert_eq!(
            err,
            DatasetError::Unassigned {
                record: RecordId::new(5)
            }
        );
    }

    #[test]
    fn record_lookup_reports_out_of_bounds() {
        let dataset = InMemoryDataset::from_assignments("pairs", [("a", 0)]);
        assert!(dataset.record(0).is_ok());
        assert_eq!(
            dataset.record(3).expect_err("index 3 is past the end"),
            DatasetError::OutOfBounds { index: 3 }
        );
    }
}
