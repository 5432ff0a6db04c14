//! Trained clustering state: the cluster registry and its gold-standard
//! classes.

use std::{
    collections::{BTreeMap, HashMap},
    hash::Hash,
};

use crate::cluster::{AsCluster, ClusterId};

/// Distinct ground-truth classes in first-seen order.
///
/// Order only affects iteration (and therefore tie-breaking when majority
/// labels are chosen), so it is kept stable for reproducible results.
///
/// # Examples
/// ```
/// use clustrum_core::GoldStandardClasses;
///
/// let classes: GoldStandardClasses<&str> = ["b", "a", "b"].into_iter().collect();
/// assert_eq!(classes.len(), 2);
/// assert_eq!(classes.iter().collect::<Vec<_>>(), vec![&"b", &"a"]);
/// assert_eq!(classes.position(&"a"), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct GoldStandardClasses<C> {
    ordered: Vec<C>,
    positions: HashMap<C, usize>,
}

impl<C> GoldStandardClasses<C> {
    /// Creates an empty class set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ordered: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Number of distinct classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Returns whether no ground truth is available.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Iterates over the classes in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.ordered.iter()
    }

    /// Returns the class stored at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&C> {
        self.ordered.get(position)
    }
}

impl<C: Eq + Hash + Clone> GoldStandardClasses<C> {
    /// Appends `class` unless already present, returning whether it was new.
    pub fn insert(&mut self, class: C) -> bool {
        if self.positions.contains_key(&class) {
            return false;
        }
        self.positions.insert(class.clone(), self.ordered.len());
        self.ordered.push(class);
        true
    }

    /// Position of `class` in insertion order.
    #[must_use]
    pub fn position(&self, class: &C) -> Option<usize> {
        self.positions.get(class).copied()
    }

    /// Returns whether `class` belongs to the set.
    #[must_use]
    pub fn contains(&self, class: &C) -> bool {
        self.positions.contains_key(class)
    }
}

impl<C> Default for GoldStandardClasses<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Eq + Hash + Clone> FromIterator<C> for GoldStandardClasses<C> {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        let mut classes = Self::new();
        for class in iter {
            classes.insert(class);
        }
        classes
    }
}

impl<'a, C> IntoIterator for &'a GoldStandardClasses<C> {
    type Item = &'a C;
    type IntoIter = std::slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Model parameters of a trained clusterer.
///
/// Clusters are keyed by their own identifier and kept in identifier order so
/// every scan of the registry is deterministic. Identifiers handed out by
/// [`ClusterRegistry::allocate_cluster_id`] are never reused.
///
/// # Examples
/// ```
/// use clustrum_core::{Cluster, ClusterRegistry, GoldStandardClasses};
///
/// let mut registry: ClusterRegistry<Cluster<&str>> = ClusterRegistry::new();
/// let first = registry.allocate_cluster_id().expect("identifiers remain");
/// let second = registry.allocate_cluster_id().expect("identifiers remain");
/// registry.set_clusters([Cluster::new(first), Cluster::new(second)]);
/// registry.set_gold_standard_classes(["spam", "ham"].into_iter().collect());
/// assert_eq!(registry.cluster_count(), 2);
/// assert_eq!(registry.gold_standard_classes().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ClusterRegistry<K: AsCluster> {
    clusters: BTreeMap<ClusterId, K>,
    gold_standard_classes: GoldStandardClasses<K::Class>,
    /// `None` once `u64::MAX` has been handed out or stored.
    next_id: Option<u64>,
}

impl<K: AsCluster> ClusterRegistry<K> {
    /// Creates a registry with no clusters and no ground truth.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clusters: BTreeMap::new(),
            gold_standard_classes: GoldStandardClasses::new(),
            next_id: Some(0),
        }
    }

    /// Number of clusters held by the model.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Clusters keyed by identifier.
    #[must_use]
    pub const fn clusters(&self) -> &BTreeMap<ClusterId, K> {
        &self.clusters
    }

    /// Looks up a single cluster.
    #[must_use]
    pub fn cluster(&self, id: ClusterId) -> Option<&K> {
        self.clusters.get(&id)
    }

    /// Mutable access to a single cluster, for training algorithms.
    pub fn cluster_mut(&mut self, id: ClusterId) -> Option<&mut K> {
        self.clusters.get_mut(&id)
    }

    pub(crate) fn clusters_mut(&mut self) -> &mut BTreeMap<ClusterId, K> {
        &mut self.clusters
    }

    /// Replaces every cluster with `clusters`, keyed by their identifiers.
    ///
    /// When two clusters share an identifier the later one wins.
    pub fn set_clusters<I>(&mut self, clusters: I)
    where
        I: IntoIterator<Item = K>,
    {
        self.clusters = clusters
            .into_iter()
            .map(|cluster| (cluster.id(), cluster))
            .collect();
        if let Some(max) = self.clusters.keys().next_back() {
            let above = max.get().checked_add(1);
            self.next_id = self.next_id.zip(above).map(|(next, min)| next.max(min));
        }
    }

    /// Hands out a fresh identifier above every identifier seen so far.
    ///
    /// Returns `None` once the identifier space is exhausted; an identifier
    /// is never handed out twice.
    pub fn allocate_cluster_id(&mut self) -> Option<ClusterId> {
        let id = self.next_id?;
        self.next_id = id.checked_add(1);
        Some(ClusterId::new(id))
    }

    /// Ground-truth classes known to the model; empty for unsupervised use.
    #[must_use]
    pub const fn gold_standard_classes(&self) -> &GoldStandardClasses<K::Class> {
        &self.gold_standard_classes
    }

    /// Replaces the gold-standard class set.
    pub fn set_gold_standard_classes(&mut self, classes: GoldStandardClasses<K::Class>) {
        self.gold_standard_classes = classes;
    }

    /// Majority labels assigned by the last validation pass, in identifier
    /// order.
    pub fn labels(&self) -> impl Iterator<Item = (ClusterId, Option<&K::Class>)> + '_ {
        self.clusters
            .iter()
            .map(|(&id, cluster)| (id, cluster.as_cluster().label()))
    }
}

impl<K: AsCluster + Clone> ClusterRegistry<K> {
    /// Returns an owned copy of the cluster map that callers may mutate
    /// without affecting the registry.
    #[must_use]
    pub fn clusters_snapshot(&self) -> BTreeMap<ClusterId, K> {
        self.clusters.clone()
    }
}

impl<K: AsCluster> Default for ClusterRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}
