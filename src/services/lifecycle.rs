//! Finding lifecycle state machine.
//!
//! Validates that user-driven status transitions follow the allowed
//! graph and that risk acceptance and false-positive calls carry a
//! justification. Scans always create findings as `Open`; everything
//! after that goes through here.

use crate::errors::AppError;
use crate::models::finding::FindingStatus;

/// Check whether a status transition is valid per the state machine
/// graph.
pub fn is_valid_transition(from: FindingStatus, to: FindingStatus) -> bool {
    use FindingStatus::*;
    matches!(
        (from, to),
        (Open, Triaged)
            | (Open, Fixed)
            | (Open, FalsePositive)
            | (Open, AcceptedRisk)
            | (Triaged, AcceptedRisk)
            | (Triaged, Fixed)
            | (Triaged, FalsePositive)
            // Acceptance expired or was reconsidered
            | (AcceptedRisk, Triaged)
            // Reconsidered after closer analysis
            | (FalsePositive, Open)
            // Regression: the issue came back
            | (Fixed, Open)
    )
}

/// Validate all preconditions for a transition.
pub fn validate_transition(
    from: FindingStatus,
    to: FindingStatus,
    justification: Option<&str>,
) -> Result<(), AppError> {
    if from == to {
        return Err(AppError::InvalidTransition(format!(
            "Finding is already {to:?}"
        )));
    }

    if !is_valid_transition(from, to) {
        return Err(AppError::InvalidTransition(format!(
            "Cannot transition from {from:?} to {to:?}"
        )));
    }

    let needs_justification = matches!(
        to,
        FindingStatus::AcceptedRisk | FindingStatus::FalsePositive
    );
    if needs_justification && justification.map_or(true, |j| j.trim().is_empty()) {
        return Err(AppError::Validation(format!(
            "Transition to {to:?} requires a justification"
        )));
    }

    Ok(())
}
