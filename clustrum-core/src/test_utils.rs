//! Shared test utilities for `clustrum-core`.

use clustrum_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::{collection::vec, prelude::*, test_runner::Config as ProptestConfig};

use crate::{
    cluster::{Cluster, ClusterId},
    dataset::InMemoryDataset,
    registry::ClusterRegistry,
};

/// Builds a standard proptest configuration from the shared CI profile.
///
/// This keeps property suites aligned on the same `PROPTEST_CASES` and
/// `CLUSTRUM_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// A labelled assignment: `(class, predicted cluster)` per record.
#[derive(Clone, Debug)]
pub(crate) struct LabelledAssignments {
    pub(crate) pairs: Vec<(u8, u64)>,
    pub(crate) cluster_count: u64,
    pub(crate) class_count: u8,
}

impl LabelledAssignments {
    /// Registry holding every cluster id below `cluster_count` and every
    /// class below `class_count`, in ascending order.
    pub(crate) fn registry(&self) -> ClusterRegistry<Cluster<u8>> {
        let mut registry = ClusterRegistry::new();
        registry.set_clusters((0..self.cluster_count).map(|id| Cluster::new(ClusterId::new(id))));
        registry.set_gold_standard_classes((0..self.class_count).collect());
        registry
    }

    pub(crate) fn dataset(&self) -> InMemoryDataset<u8> {
        InMemoryDataset::from_assignments("generated", self.pairs.iter().copied())
    }
}

/// Random non-empty assignments over up to six clusters and four classes.
///
/// Some registered clusters and classes may receive no records, which
/// exercises the zero-count guards.
pub(crate) fn labelled_assignments() -> impl Strategy<Value = LabelledAssignments> {
    (1_u64..=6, 1_u8..=4).prop_flat_map(|(cluster_count, class_count)| {
        vec((0..class_count, 0..cluster_count), 1..64).prop_map(move |pairs| {
            LabelledAssignments {
                pairs,
                cluster_count,
                class_count,
            }
        })
    })
}
