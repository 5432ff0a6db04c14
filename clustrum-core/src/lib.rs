//! Clustrum core library.
//!
//! Models the clusters discovered by an unsupervised learner and scores them
//! against optional gold-standard classes with purity and normalized mutual
//! information.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod cluster;
mod clusterer;
mod contingency;
mod dataset;
mod error;
mod metrics;
mod registry;
mod validation;

pub use crate::{
    builder::{ClassEntropySource, ClustererBuilder},
    cluster::{AsCluster, CentroidCluster, Cluster, ClusterId, Members, MutableCluster, RecordId},
    clusterer::Clusterer,
    dataset::{Dataset, InMemoryDataset, LabelledRecord, MembershipPredictor, Predictor, Record},
    error::{
        ClustrumError, ClustrumErrorCode, DatasetError, DatasetErrorCode, Result, ValidationError,
        ValidationErrorCode,
    },
    metrics::ValidationMetrics,
    registry::{ClusterRegistry, GoldStandardClasses},
    validation::{ValidationOptions, validate_model},
};

#[cfg(test)]
pub(crate) mod test_utils;
#[cfg(test)]
mod validation_properties;
