use clustrum_core::{Cluster, ClusterId, ClusterRegistry, InMemoryDataset, LabelledRecord, RecordId};

/// Class per record for the six-record fixture used across suites.
pub const CLASSES: [&str; 6] = ["A", "A", "A", "B", "B", "B"];

/// Registry whose clusters already hold their members, ready for
/// membership-based prediction.
#[must_use]
pub fn registry_with_members(groups: &[(u64, &[u64])]) -> ClusterRegistry<Cluster<&'static str>> {
    let mut registry = ClusterRegistry::new();
    registry.set_clusters(groups.iter().map(|&(id, members)| {
        let mut cluster = Cluster::new(ClusterId::new(id));
        for &record in members {
            cluster.add(RecordId::new(record));
        }
        cluster
    }));
    registry.set_gold_standard_classes(["A", "B"].into_iter().collect());
    registry
}

/// Unpredicted records numbered from zero with the fixture classes.
#[must_use]
pub fn unpredicted_dataset() -> InMemoryDataset<&'static str> {
    InMemoryDataset::new(
        "fixture",
        CLASSES
            .iter()
            .zip(0_u64..)
            .map(|(&class, id)| LabelledRecord::new(RecordId::new(id), Some(class)))
            .collect(),
    )
}
