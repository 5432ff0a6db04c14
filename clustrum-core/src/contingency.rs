//! Cluster-by-class frequency tables.
//!
//! The table is zero-initialised for every `(cluster, class)` combination the
//! registry knows about, so absent pairs read as zero rather than missing.
//! Partial tables built over disjoint record shards merge by summation.

use std::{collections::BTreeMap, hash::Hash};

use crate::{
    cluster::ClusterId,
    dataset::Record,
    error::{Result, ValidationError},
    registry::GoldStandardClasses,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ContingencyTable {
    total: usize,
    cluster_counts: BTreeMap<ClusterId, usize>,
    class_counts: Vec<usize>,
    cells: BTreeMap<ClusterId, Vec<usize>>,
}

impl ContingencyTable {
    pub(crate) fn zeroed(clusters: &[ClusterId], class_count: usize) -> Self {
        Self {
            total: 0,
            cluster_counts: clusters.iter().map(|&id| (id, 0)).collect(),
            class_counts: vec![0; class_count],
            cells: clusters.iter().map(|&id| (id, vec![0; class_count])).collect(),
        }
    }

    /// Counts one record.
    ///
    /// The record is validated before any counter moves, so a failed tally
    /// leaves the table unchanged.
    pub(crate) fn tally<R, C>(&mut self, record: &R, classes: &GoldStandardClasses<C>) -> Result<()>
    where
        R: Record<Class = C>,
        C: Eq + Hash + Clone,
    {
        let record_id = record.record_id();
        let cluster = record
            .predicted_cluster()
            .ok_or(ValidationError::MissingPrediction { record: record_id })?;
        let class = record
            .true_class()
            .ok_or(ValidationError::MissingClass { record: record_id })?;
        let position = classes
            .position(class)
            .ok_or(ValidationError::UnknownClass { record: record_id })?;
        if !self.cells.contains_key(&cluster) {
            return Err(ValidationError::UnknownClusterId {
                record: record_id,
                cluster,
            });
        }
        if position >= self.class_counts.len() {
            return Err(ValidationError::InvariantViolation {
                context: "locating the class column",
            });
        }

        bump(self.cells.get_mut(&cluster).and_then(|row| row.get_mut(position)))?;
        bump(self.cluster_counts.get_mut(&cluster))?;
        bump(self.class_counts.get_mut(position))?;
        self.total += 1;
        Ok(())
    }

    /// Builds the table with a single sequential scan.
    pub(crate) fn from_records<R, C>(
        clusters: &[ClusterId],
        classes: &GoldStandardClasses<C>,
        records: &[R],
    ) -> Result<Self>
    where
        R: Record<Class = C>,
        C: Eq + Hash + Clone,
    {
        let mut table = Self::zeroed(clusters, classes.len());
        for record in records {
            table.tally(record, classes)?;
        }
        Ok(table)
    }

    /// Builds the table over rayon shards and sums the partial tables.
    #[cfg(feature = "parallel")]
    pub(crate) fn from_records_parallel<R, C>(
        clusters: &[ClusterId],
        classes: &GoldStandardClasses<C>,
        records: &[R],
    ) -> Result<Self>
    where
        R: Record<Class = C> + Sync,
        C: Eq + Hash + Clone + Sync,
    {
        use rayon::prelude::*;

        let class_count = classes.len();
        records
            .par_iter()
            .try_fold(
                || Self::zeroed(clusters, class_count),
                |mut table, record| {
                    table.tally(record, classes)?;
                    Ok(table)
                },
            )
            .try_reduce(|| Self::zeroed(clusters, class_count), Self::merge)
    }

    /// Sums two tables built over the same clusters and classes.
    #[cfg_attr(
        not(any(feature = "parallel", test)),
        expect(dead_code, reason = "only sharded counting merges tables")
    )]
    pub(crate) fn merge(mut self, other: Self) -> Result<Self> {
        if self.class_counts.len() != other.class_counts.len()
            || !self.cells.keys().eq(other.cells.keys())
        {
            return Err(ValidationError::InvariantViolation {
                context: "merging partial contingency tables",
            });
        }
        self.total += other.total;
        for (left, right) in self.class_counts.iter_mut().zip(&other.class_counts) {
            *left += right;
        }
        for (left, right) in self.cluster_counts.values_mut().zip(other.cluster_counts.values()) {
            *left += right;
        }
        for (left_row, right_row) in self.cells.values_mut().zip(other.cells.values()) {
            for (left, right) in left_row.iter_mut().zip(right_row) {
                *left += right;
            }
        }
        Ok(self)
    }

    pub(crate) const fn total(&self) -> usize {
        self.total
    }

    pub(crate) fn cluster_count(&self, cluster: ClusterId) -> Result<usize> {
        self.cluster_counts
            .get(&cluster)
            .copied()
            .ok_or(ValidationError::InvariantViolation {
                context: "reading cluster marginal count",
            })
    }

    pub(crate) fn class_count(&self, position: usize) -> Result<usize> {
        self.class_counts
            .get(position)
            .copied()
            .ok_or(ValidationError::InvariantViolation {
                context: "reading class marginal count",
            })
    }

    pub(crate) fn cluster_counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.cluster_counts.values().copied()
    }

    pub(crate) fn class_counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.class_counts.iter().copied()
    }

    /// Rows of per-class counts, one per cluster in identifier order.
    pub(crate) fn rows(&self) -> impl Iterator<Item = (ClusterId, &[usize])> + '_ {
        self.cells.iter().map(|(&id, row)| (id, row.as_slice()))
    }
}

fn bump(counter: Option<&mut usize>) -> Result<()> {
    let counter = counter.ok_or(ValidationError::InvariantViolation {
        context: "incrementing a contingency counter",
    })?;
    *counter += 1;
    Ok(())
}
