//! Property suite for external validation.

use proptest::{prop_assert, prop_assert_eq, proptest};
use test_strategy::Arbitrary;

use crate::{
    cluster::{Cluster, ClusterId},
    dataset::InMemoryDataset,
    registry::{ClusterRegistry, GoldStandardClasses},
    test_utils::{labelled_assignments, suite_proptest_config},
    validation::{ValidationOptions, validate_model},
};

/// How a perfect clustering renames the gold-standard classes.
#[derive(Clone, Copy, Debug, Arbitrary)]
enum Relabeling {
    Identity,
    Reversed,
    #[weight(2)]
    Offset(#[strategy(1_u64..1_000)] u64),
}

impl Relabeling {
    fn cluster_for(self, class: u8, class_count: u8) -> u64 {
        match self {
            Self::Identity => u64::from(class),
            Self::Reversed => u64::from(class_count - 1 - class),
            Self::Offset(offset) => u64::from(class) + offset,
        }
    }
}

proptest! {
    #![proptest_config(suite_proptest_config(64))]

    #[test]
    fn scores_stay_in_unit_interval(assignments in labelled_assignments()) {
        let mut registry = assignments.registry();
        let metrics = validate_model(&mut registry, &assignments.dataset(), ValidationOptions::default())
            .expect("generated assignments are valid");

        let purity = metrics.purity().expect("purity must be present");
        let nmi = metrics.nmi().expect("nmi must be present");
        prop_assert!((0.0..=1.0).contains(&purity), "purity {purity}");
        prop_assert!((0.0..=1.0).contains(&nmi), "nmi {nmi}");
        prop_assert!(registry.labels().all(|(_, label)| label.is_some()));
    }

    #[test]
    fn validation_is_idempotent_and_shard_independent(assignments in labelled_assignments()) {
        let dataset = assignments.dataset();
        let mut registry = assignments.registry();

        let first = validate_model(&mut registry, &dataset, ValidationOptions::default())
            .expect("generated assignments are valid");
        let second = validate_model(&mut registry, &dataset, ValidationOptions::default())
            .expect("generated assignments are valid");
        let sharded = validate_model(
            &mut registry,
            &dataset,
            ValidationOptions { parallelized: true, ..ValidationOptions::default() },
        )
        .expect("generated assignments are valid");

        for other in [second, sharded] {
            prop_assert_eq!(first.purity().map(f64::to_bits), other.purity().map(f64::to_bits));
            prop_assert_eq!(first.nmi().map(f64::to_bits), other.nmi().map(f64::to_bits));
        }
    }

    #[test]
    fn relabelled_ground_truth_scores_one(
        classes in proptest::collection::vec(0_u8..5, 1..48),
        relabeling: Relabeling,
    ) {
        let class_count = 5;
        let clusters: Vec<u64> = classes
            .iter()
            .map(|&class| relabeling.cluster_for(class, class_count))
            .collect();
        let mut registry: ClusterRegistry<Cluster<u8>> = ClusterRegistry::new();
        registry.set_clusters(
            (0..class_count).map(|class| Cluster::new(ClusterId::new(relabeling.cluster_for(class, class_count)))),
        );
        registry.set_gold_standard_classes((0..class_count).collect());
        let dataset = InMemoryDataset::from_assignments(
            "relabelled",
            classes.iter().copied().zip(clusters.iter().copied()),
        );

        let metrics = validate_model(&mut registry, &dataset, ValidationOptions::default())
            .expect("relabelled assignments are valid");
        prop_assert_eq!(metrics.purity(), Some(1.0));
        let nmi = metrics.nmi().expect("nmi must be present");
        prop_assert!((nmi - 1.0).abs() < 1e-9, "nmi {nmi}");

        for &class in &classes {
            let id = ClusterId::new(relabeling.cluster_for(class, class_count));
            let label = registry.cluster(id).and_then(|cluster| cluster.label().copied());
            prop_assert_eq!(label, Some(class));
        }
    }

    #[test]
    fn missing_ground_truth_never_labels(assignments in labelled_assignments()) {
        let mut registry = assignments.registry();
        registry.set_gold_standard_classes(GoldStandardClasses::new());

        let metrics = validate_model(&mut registry, &assignments.dataset(), ValidationOptions::default())
            .expect("unsupervised validation never fails");
        prop_assert!(!metrics.is_scored());
        prop_assert!(registry.labels().all(|(_, label)| label.is_none()));
    }
}
