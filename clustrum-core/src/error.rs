//! Error types for the clustrum core library.
//!
//! Defines the error enums exposed by the public API, their stable
//! machine-readable codes, and a convenient result alias.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::cluster::{ClusterId, RecordId};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by [`crate::Dataset`] access or a [`crate::Predictor`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DatasetError {
    /// Requested record position was outside the dataset bounds.
    #[error("record position {index} is out of bounds")]
    OutOfBounds {
        /// The requested position.
        index: usize,
    },
    /// No cluster in the registry claims the record.
    #[error("record {record} is not a member of any cluster")]
    Unassigned {
        /// Record that could not be assigned.
        record: RecordId,
    },
}

define_error_codes! {
    /// Stable codes describing [`DatasetError`] variants.
    enum DatasetErrorCode for DatasetError {
        /// Requested record position was outside the dataset bounds.
        OutOfBounds => OutOfBounds { .. } => "DATASET_OUT_OF_BOUNDS",
        /// No cluster in the registry claims the record.
        Unassigned => Unassigned { .. } => "DATASET_UNASSIGNED_RECORD",
    }
}

/// Error raised while scoring a clustering against its gold standard.
///
/// A failed validation never produces partial metrics and never writes
/// cluster labels.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ValidationError {
    /// Ground truth is available but the dataset has no records.
    #[error("dataset `{dataset}` contains no records to validate")]
    EmptyDataset {
        /// Identifier for the empty dataset.
        dataset: Arc<str>,
    },
    /// A record reached validation without a predicted cluster.
    #[error("record {record} has no predicted cluster")]
    MissingPrediction {
        /// Record lacking a prediction.
        record: RecordId,
    },
    /// A record was predicted into a cluster the registry does not know.
    ///
    /// This means the prediction step and the registry have diverged.
    #[error("record {record} predicts cluster {cluster} which is not in the registry")]
    UnknownClusterId {
        /// Record carrying the stale prediction.
        record: RecordId,
        /// The unknown cluster identifier.
        cluster: ClusterId,
    },
    /// A record carries no gold-standard class while ground truth is in use.
    #[error("record {record} has no gold-standard class")]
    MissingClass {
        /// Record lacking a class.
        record: RecordId,
    },
    /// A record's class is not part of the registry's gold-standard set.
    #[error("record {record} carries a class outside the gold-standard set")]
    UnknownClass {
        /// Record carrying the unexpected class.
        record: RecordId,
    },
    /// Internal contingency state violated expected invariants.
    #[error("internal validation invariant violated while {context}")]
    InvariantViolation {
        /// Human-readable context describing which lookup failed.
        context: &'static str,
    },
    /// The prediction step failed before scoring began.
    #[error("dataset `{dataset}` failed: {error}")]
    Dataset {
        /// Identifier for the dataset that produced the error.
        dataset: Arc<str>,
        #[source]
        /// Underlying dataset error bubbled up by the predictor.
        error: DatasetError,
    },
}

define_error_codes! {
    /// Stable codes describing [`ValidationError`] variants.
    enum ValidationErrorCode for ValidationError {
        /// Ground truth is available but the dataset has no records.
        EmptyDataset => EmptyDataset { .. } => "VALIDATION_EMPTY_DATASET",
        /// A record reached validation without a predicted cluster.
        MissingPrediction => MissingPrediction { .. } => "VALIDATION_MISSING_PREDICTION",
        /// A record was predicted into a cluster the registry does not know.
        UnknownClusterId => UnknownClusterId { .. } => "VALIDATION_UNKNOWN_CLUSTER",
        /// A record carries no gold-standard class.
        MissingClass => MissingClass { .. } => "VALIDATION_MISSING_CLASS",
        /// A record's class is not part of the gold-standard set.
        UnknownClass => UnknownClass { .. } => "VALIDATION_UNKNOWN_CLASS",
        /// Internal contingency state violated expected invariants.
        InvariantViolation => InvariantViolation { .. } => "VALIDATION_INVARIANT_VIOLATION",
        /// The prediction step failed before scoring began.
        DatasetFailure => Dataset { .. } => "VALIDATION_DATASET_FAILURE",
    }
}

impl ValidationError {
    /// Returns `true` when the error signals that the registry and the
    /// prediction output disagree, or that internal bookkeeping broke.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::UnknownClusterId { .. } | Self::InvariantViolation { .. }
        )
    }

    /// Retrieve the inner [`DatasetErrorCode`] when the error originated in
    /// the prediction step.
    #[must_use]
    pub const fn dataset_code(&self) -> Option<DatasetErrorCode> {
        match self {
            Self::Dataset { error, .. } => Some(error.code()),
            _ => None,
        }
    }
}

/// Error type produced when configuring a [`crate::Clusterer`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ClustrumError {
    /// Sharded validation was requested without the `parallel` feature.
    #[error("parallel validation was requested but the `parallel` feature is disabled")]
    ParallelUnavailable,
}

define_error_codes! {
    /// Stable codes describing [`ClustrumError`] variants.
    enum ClustrumErrorCode for ClustrumError {
        /// Sharded validation was requested without the `parallel` feature.
        ParallelUnavailable => ParallelUnavailable => "CLUSTRUM_PARALLEL_UNAVAILABLE",
    }
}

/// Convenient alias for results returned by the validation API.
pub type Result<T> = core::result::Result<T, ValidationError>;
