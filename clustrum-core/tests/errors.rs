//! Stable error codes exposed by the public API.

use std::sync::Arc;

use clustrum_core::{
    ClusterId, ClustrumError, ClustrumErrorCode, DatasetError, DatasetErrorCode, RecordId,
    ValidationError, ValidationErrorCode,
};
use rstest::rstest;

#[rstest]
#[case(DatasetError::OutOfBounds { index: 7 }, DatasetErrorCode::OutOfBounds, "DATASET_OUT_OF_BOUNDS")]
#[case(
    DatasetError::Unassigned { record: RecordId::new(3) },
    DatasetErrorCode::Unassigned,
    "DATASET_UNASSIGNED_RECORD",
)]
fn returns_expected_dataset_code(
    #[case] error: DatasetError,
    #[case] expected: DatasetErrorCode,
    #[case] text: &str,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().as_str(), text);
}

#[rstest]
#[case(
    ValidationError::EmptyDataset { dataset: Arc::from("empty") },
    ValidationErrorCode::EmptyDataset,
    None,
)]
#[case(
    ValidationError::MissingPrediction { record: RecordId::new(0) },
    ValidationErrorCode::MissingPrediction,
    None,
)]
#[case(
    ValidationError::UnknownClusterId { record: RecordId::new(0), cluster: ClusterId::new(99) },
    ValidationErrorCode::UnknownClusterId,
    None,
)]
#[case(
    ValidationError::MissingClass { record: RecordId::new(1) },
    ValidationErrorCode::MissingClass,
    None,
)]
#[case(
    ValidationError::UnknownClass { record: RecordId::new(1) },
    ValidationErrorCode::UnknownClass,
    None,
)]
#[case(
    ValidationError::InvariantViolation { context: "testing" },
    ValidationErrorCode::InvariantViolation,
    None,
)]
#[case(
    ValidationError::Dataset {
        dataset: Arc::from("broken"),
        error: DatasetError::Unassigned { record: RecordId::new(4) },
    },
    ValidationErrorCode::DatasetFailure,
    Some(DatasetErrorCode::Unassigned),
)]
fn returns_expected_validation_code(
    #[case] error: ValidationError,
    #[case] expected: ValidationErrorCode,
    #[case] dataset_code: Option<DatasetErrorCode>,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.dataset_code(), dataset_code);
}

#[rstest]
fn clustrum_error_code_is_stable() {
    let error = ClustrumError::ParallelUnavailable;
    assert_eq!(error.code(), ClustrumErrorCode::ParallelUnavailable);
    assert_eq!(error.code().to_string(), "CLUSTRUM_PARALLEL_UNAVAILABLE");
}

#[rstest]
fn unknown_cluster_message_names_both_ids() {
    let error = ValidationError::UnknownClusterId {
        record: RecordId::new(5),
        cluster: ClusterId::new(99),
    };
    let message = error.to_string();
    assert!(message.contains('5'), "{message}");
    assert!(message.contains("99"), "{message}");
    assert!(error.is_invariant_violation());
}
