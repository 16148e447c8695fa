use thiserror::Error;

use super::models::QueueStatus;

/// Violations of the review workflow and of analysis edits.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Please provide a rejection reason")]
    MissingRejectionReason,

    #[error("Analysis is not in edit mode")]
    NotEditing,

    #[error("No analysis loaded for queue item {0}")]
    NoAnalysisLoaded(i64),

    #[error("Queue item is already {0}")]
    AlreadyFinalized(QueueStatus),

    #[error("Quality rating must be between 0 and 5, got {0}")]
    InvalidQualityRating(u8),

    #[error("Unknown analysis field: {0}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidFieldValue { field: String, value: String },
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_display() {
        assert_eq!(
            DomainError::MissingRejectionReason.to_string(),
            "Please provide a rejection reason"
        );
        assert!(DomainError::NoAnalysisLoaded(42).to_string().contains("42"));
        assert_eq!(
            DomainError::AlreadyFinalized(QueueStatus::Approved).to_string(),
            "Queue item is already approved"
        );

        let err = DomainError::InvalidFieldValue {
            field: "confidenceScore".to_string(),
            value: "abc".to_string(),
        };
        assert!(err.to_string().contains("confidenceScore"));
        assert!(err.to_string().contains("abc"));
    }
}
