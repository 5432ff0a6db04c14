//! Scalar results of an external validation pass.

/// Purity and normalized mutual information of a clustering.
///
/// Both scores are absent when the model has no gold-standard classes.
/// Contingency tables are not kept, since cluster identities are not
/// comparable across independently trained folds.
///
/// # Examples
/// ```
/// use clustrum_core::ValidationMetrics;
///
/// let metrics = ValidationMetrics::empty();
/// assert!(metrics.purity().is_none());
/// assert!(metrics.nmi().is_none());
/// assert!(!metrics.is_scored());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ValidationMetrics {
    purity: Option<f64>,
    nmi: Option<f64>,
}

impl ValidationMetrics {
    /// Metrics with both scores absent.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            purity: None,
            nmi: None,
        }
    }

    pub(crate) const fn scored(purity: f64, nmi: f64) -> Self {
        Self {
            purity: Some(purity),
            nmi: Some(nmi),
        }
    }

    /// Fraction of records covered by their cluster's majority class.
    #[must_use]
    pub const fn purity(&self) -> Option<f64> {
        self.purity
    }

    /// Normalized mutual information between clusters and classes.
    #[must_use]
    pub const fn nmi(&self) -> Option<f64> {
        self.nmi
    }

    /// Returns whether the metrics were computed against ground truth.
    #[must_use]
    pub const fn is_scored(&self) -> bool {
        self.purity.is_some() && self.nmi.is_some()
    }

    /// Averages per-fold metrics, e.g. across cross-validation folds.
    ///
    /// Each score is averaged over the folds that carry it and is absent when
    /// none do.
    ///
    /// # Examples
    /// ```
    /// use clustrum_core::ValidationMetrics;
    ///
    /// let averaged = ValidationMetrics::average(&[ValidationMetrics::empty()]);
    /// assert_eq!(averaged, ValidationMetrics::empty());
    /// ```
    #[must_use]
    pub fn average(folds: &[Self]) -> Self {
        Self {
            purity: mean(folds.iter().filter_map(Self::purity)),
            nmi: mean(folds.iter().filter_map(Self::nmi)),
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "averaging scores requires floating-point arithmetic."
)]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0_f64, 0_usize), |(sum, count), value| {
        (sum + value, count + 1)
    });
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_ignores_unscored_folds() {
        let folds = [
            ValidationMetrics::scored(1.0, 0.5),
            ValidationMetrics::empty(),
            ValidationMetrics::scored(0.5, 0.25),
        ];
        let averaged = ValidationMetrics::average(&folds);
        assert_eq!(averaged.purity(), Some(0.75));
        assert_eq!(averaged.nmi(), Some(0.375));
        assert!(averaged.is_scored());
    }

    #[test]
    fn average_of_nothing_is_empty() {
        assert_eq!(ValidationMetrics::average(&[]), ValidationMetrics::empty());
        assert_eq!(ValidationMetrics::default(), ValidationMetrics::empty());
    }
}
