//! Cluster entities and the capability traits clustering models build on.
//!
//! A [`Cluster`] owns its identity, the set of records assigned to it and the
//! majority gold-standard label written by validation. Concrete cluster
//! variants that maintain running statistics implement [`MutableCluster`] and
//! expose the plain membership record through [`AsCluster`].

use std::{
    collections::{HashSet, hash_set},
    fmt,
    hash::{Hash, Hasher},
    iter::FusedIterator,
};

/// Identifier assigned to a cluster.
///
/// # Examples
/// ```
/// use clustrum_core::ClusterId;
///
/// let id = ClusterId::new(4);
/// assert_eq!(id.get(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(u64);

impl ClusterId {
    /// Creates a new cluster identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a dataset record.
///
/// # Examples
/// ```
/// use clustrum_core::RecordId;
///
/// let id = RecordId::new(12);
/// assert_eq!(id.get(), 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a new record identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A discovered group of records.
///
/// Two clusters compare equal when their identifiers match, regardless of
/// membership or label.
///
/// # Examples
/// ```
/// use clustrum_core::{Cluster, ClusterId, RecordId};
///
/// let mut cluster: Cluster<&str> = Cluster::new(ClusterId::new(0));
/// assert!(cluster.add(RecordId::new(7)));
/// assert!(!cluster.add(RecordId::new(7)));
/// assert_eq!(cluster.size(), 1);
/// assert_eq!(cluster.members().collect::<Vec<_>>(), vec![RecordId::new(7)]);
/// assert!(cluster.label().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Cluster<C> {
    id: ClusterId,
    members: HashSet<RecordId>,
    label: Option<C>,
}

impl<C> Cluster<C> {
    /// Creates an empty, unlabelled cluster.
    #[must_use]
    pub fn new(id: ClusterId) -> Self {
        Self {
            id,
            members: HashSet::new(),
            label: None,
        }
    }

    /// Returns the cluster identifier.
    #[must_use]
    pub const fn id(&self) -> ClusterId {
        self.id
    }

    /// Inserts `record`, returning whether the membership changed.
    pub fn add(&mut self, record: RecordId) -> bool {
        self.members.insert(record)
    }

    /// Removes `record`, returning whether the membership changed.
    pub fn remove(&mut self, record: RecordId) -> bool {
        self.members.remove(&record)
    }

    /// Returns whether `record` belongs to the cluster.
    #[must_use]
    pub fn contains(&self, record: RecordId) -> bool {
        self.members.contains(&record)
    }

    /// Number of records currently assigned to the cluster.
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the cluster has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns a read-only view over the member record ids.
    ///
    /// The view can be requested any number of times; it exposes no way to
    /// change membership.
    ///
    /// ```compile_fail
    /// use clustrum_core::{Cluster, ClusterId, RecordId};
    ///
    /// let mut cluster: Cluster<&str> = Cluster::new(ClusterId::new(0));
    /// cluster.add(RecordId::new(1));
    /// let mut members = cluster.members();
    /// members.remove(&RecordId::new(1));
    /// ```
    ///
    /// ```compile_fail
    /// use clustrum_core::{Cluster, ClusterId, RecordId};
    ///
    /// let mut cluster: Cluster<&str> = Cluster::new(ClusterId::new(0));
    /// for record in cluster.members() {
    ///     cluster.remove(record);
    /// }
    /// ```
    #[must_use]
    pub fn members(&self) -> Members<'_> {
        Members {
            inner: self.members.iter(),
        }
    }

    /// Drops every member while keeping the identifier and label.
    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Majority gold-standard class observed by the last validation pass.
    #[must_use]
    pub const fn label(&self) -> Option<&C> {
        self.label.as_ref()
    }

    pub(crate) fn set_label(&mut self, label: C) {
        self.label = Some(label);
    }
}

impl<C> PartialEq for Cluster<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C> Eq for Cluster<C> {}

impl<C> Hash for Cluster<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<'a, C> IntoIterator for &'a Cluster<C> {
    type Item = RecordId;
    type IntoIter = Members<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.members()
    }
}

/// Read-only iterator over the members of a [`Cluster`].
#[derive(Debug, Clone)]
pub struct Members<'a> {
    inner: hash_set::Iter<'a, RecordId>,
}

impl Iterator for Members<'_> {
    type Item = RecordId;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Members<'_> {}

impl FusedIterator for Members<'_> {}

pub(crate) mod sealed {
    /// Capability for crate-internal writes to a cluster variant.
    ///
    /// It cannot be constructed outside this crate, so only the validation
    /// engine reaches the underlying [`super::Cluster`] mutably.
    #[derive(Debug, Clone, Copy)]
    pub struct Internal(pub(crate) ());
}

/// Access to the membership record underlying a cluster variant.
///
/// The registry and the validation engine only need this capability. It is
/// implemented by the cluster types of this crate. Membership of a variant
/// changes only through its own methods, so running statistics stay
/// consistent with the members:
///
/// ```compile_fail
/// use clustrum_core::{AsCluster, CentroidCluster, ClusterId, RecordId};
///
/// let mut cluster: CentroidCluster<u8> = CentroidCluster::new(ClusterId::new(0));
/// cluster.as_cluster_mut().add(RecordId::new(1));
/// ```
pub trait AsCluster {
    /// Gold-standard class type used for labels.
    type Class;

    /// Borrows the underlying cluster.
    fn as_cluster(&self) -> &Cluster<Self::Class>;

    /// Mutable access reserved for label writes inside this crate.
    #[doc(hidden)]
    fn as_cluster_mut(&mut self, access: sealed::Internal) -> &mut Cluster<Self::Class>;

    /// Identifier of the cluster.
    fn id(&self) -> ClusterId {
        self.as_cluster().id()
    }

    /// Number of members.
    fn size(&self) -> usize {
        self.as_cluster().size()
    }
}

/// Membership hooks for cluster variants that keep per-cluster statistics.
///
/// Training algorithms call [`MutableCluster::add`] and
/// [`MutableCluster::remove`] with the record's feature payload `P` so the
/// variant can update centroids or similar summaries alongside membership.
pub trait MutableCluster<P: ?Sized>: AsCluster {
    /// Adds `record` with payload `point`, returning whether the cluster
    /// changed.
    fn add(&mut self, record: RecordId, point: &P) -> bool;

    /// Removes `record` with payload `point`, returning whether the cluster
    /// changed.
    fn remove(&mut self, record: RecordId, point: &P) -> bool;
}

impl<C> AsCluster for Cluster<C> {
    type Class = C;

    fn as_cluster(&self) -> &Cluster<C> {
        self
    }

    fn as_cluster_mut(&mut self, _: sealed::Internal) -> &mut Cluster<C> {
        self
    }
}

impl<C, P: ?Sized> MutableCluster<P> for Cluster<C> {
    fn add(&mut self, record: RecordId, _point: &P) -> bool {
        Self::add(self, record)
    }

    fn remove(&mut self, record: RecordId, _point: &P) -> bool {
        Self::remove(self, record)
    }
}

/// Cluster variant that maintains the mean of its members' feature vectors.
///
/// The dimensionality is fixed by the first point added. Points of another
/// dimension are rejected and leave the cluster untouched.
///
/// # Examples
/// ```
/// use clustrum_core::{CentroidCluster, ClusterId, MutableCluster, RecordId};
///
/// let mut cluster: CentroidCluster<u8> = CentroidCluster::new(ClusterId::new(1));
/// assert!(cluster.add(RecordId::new(0), &[0.0, 2.0][..]));
/// assert!(cluster.add(RecordId::new(1), &[2.0, 4.0][..]));
/// assert_eq!(cluster.centroid(), &[1.0, 3.0]);
/// ```
#[derive(Debug, Clone)]
pub struct CentroidCluster<C> {
    cluster: Cluster<C>,
    centroid: Vec<f64>,
}

impl<C> CentroidCluster<C> {
    /// Creates an empty cluster with no centroid.
    #[must_use]
    pub fn new(id: ClusterId) -> Self {
        Self {
            cluster: Cluster::new(id),
            centroid: Vec::new(),
        }
    }

    /// Mean of the member points; empty while the cluster has no members.
    #[must_use]
    pub fn centroid(&self) -> &[f64] {
        &self.centroid
    }

    fn accepts(&self, point: &[f64]) -> bool {
        self.cluster.is_empty() || point.len() == self.centroid.len()
    }

    #[expect(
        clippy::cast_precision_loss,
        clippy::float_arithmetic,
        reason = "running means require floating-point arithmetic."
    )]
    fn absorb(&mut self, point: &[f64]) {
        let count = self.cluster.size() as f64;
        if self.centroid.len() != point.len() {
            self.centroid = vec![0.0; point.len()];
        }
        for (mean, &value) in self.centroid.iter_mut().zip(point) {
            *mean += (value - *mean) / count;
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        clippy::float_arithmetic,
        reason = "running means require floating-point arithmetic."
    )]
    fn release(&mut self, point: &[f64]) {
        let remaining = self.cluster.size();
        if remaining == 0 {
            self.centroid.clear();
            return;
        }
        let before = (remaining + 1) as f64;
        let after = remaining as f64;
        for (mean, &value) in self.centroid.iter_mut().zip(point) {
            *mean = (*mean * before - value) / after;
        }
    }
}

impl<C> PartialEq for CentroidCluster<C> {
    fn eq(&self, other: &Self) -> bool {
        self.cluster == other.cluster
    }
}

impl<C> Eq for CentroidCluster<C> {}

impl<C> AsCluster for CentroidCluster<C> {
    type Class = C;

    fn as_cluster(&self) -> &Cluster<C> {
        &self.cluster
    }

    fn as_cluster_mut(&mut self, _: sealed::Internal) -> &mut Cluster<C> {
        &mut self.cluster
    }
}

impl<C> MutableCluster<[f64]> for CentroidCluster<C> {
    fn add(&mut self, record: RecordId, point: &[f64]) -> bool {
        if !self.accepts(point) || !self.cluster.add(record) {
            return false;
        }
        self.absorb(point);
        true
    }

    fn remove(&mut self, record: RecordId, point: &[f64]) -> bool {
        if point.len() != self.centroid.len() || !self.cluster.remove(record) {
            return false;
        }
        self.release(point);
        true
    }
}
