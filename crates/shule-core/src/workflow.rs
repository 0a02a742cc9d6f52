//! Admission workflow state graph.
//!
//! DRAFT -> SUBMITTED -> UNDER_REVIEW -> TEST_SCHEDULED -> OFFERED ->
//! {ACCEPTED, REJECTED}; ACCEPTED -> ENROLLED. REJECTED and ENROLLED are
//! terminal. The ENROLLED edge is only taken by the enrollment transaction,
//! never by the generic transition endpoint.

use crate::error::AppError;
use crate::models::ApplicationStatus;

use ApplicationStatus::*;

/// Whether the graph admits `from -> to`.
pub fn is_allowed(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    matches!(
        (from, to),
        (Draft, Submitted)
            | (Submitted, UnderReview)
            | (UnderReview, TestScheduled)
            | (TestScheduled, Offered)
            | (Offered, Accepted)
            | (Offered, Rejected)
            | (Accepted, Enrolled)
    )
}

/// Validate a requested transition, rejecting anything outside the graph
/// with `InvalidTransition`.
pub fn validate_transition(
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> Result<(), AppError> {
    if is_allowed(from, to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Whether entering `to` from `from` stamps the submission timestamp.
/// The stamp is written once; later saves never overwrite it.
pub fn stamps_submitted_at(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    from == Draft && to == Submitted
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ApplicationStatus; 8] = [
        Draft,
        Submitted,
        UnderReview,
        TestScheduled,
        Offered,
        Accepted,
        Rejected,
        Enrolled,
    ];

    #[test]
    fn test_happy_path_is_allowed() {
        let path = [Draft, Submitted, UnderReview, TestScheduled, Offered, Accepted, Enrolled];
        for pair in path.windows(2) {
            assert!(is_allowed(pair[0], pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(is_allowed(Offered, Rejected));
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        for to in ALL {
            assert!(!is_allowed(Rejected, to), "REJECTED -> {}", to);
            assert!(!is_allowed(Enrolled, to), "ENROLLED -> {}", to);
        }
    }

    /// No edge reaches ENROLLED except from ACCEPTED.
    #[test]
    fn test_enrolled_only_reachable_from_accepted() {
        for from in ALL {
            assert_eq!(is_allowed(from, Enrolled), from == Accepted, "{}", from);
        }
    }

    #[test]
    fn test_no_skipping_or_backtracking() {
        assert!(!is_allowed(Draft, UnderReview));
        assert!(!is_allowed(Submitted, Offered));
        assert!(!is_allowed(Accepted, Rejected));
        assert!(!is_allowed(UnderReview, Submitted));
        assert!(!is_allowed(Submitted, Draft));
        assert!(!is_allowed(Draft, Enrolled));
    }

    #[test]
    fn test_validate_transition_error_carries_states() {
        let err = validate_transition(Rejected, Enrolled).unwrap_err();
        match err {
            AppError::InvalidTransition { from, to } => {
                assert_eq!(from, "REJECTED");
                assert_eq!(to, "ENROLLED");
            }
            other => panic!("Expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn test_submission_stamp_only_on_first_submit() {
        assert!(stamps_submitted_at(Draft, Submitted));
        assert!(!stamps_submitted_at(Submitted, UnderReview));
        assert!(!stamps_submitted_at(Offered, Accepted));
    }
}
