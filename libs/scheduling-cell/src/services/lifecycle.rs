// libs/scheduling-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::error::SchedulingError;
use crate::models::AppointmentStatus;

/// Allowed next statuses for a given current status.
///
/// ```text
/// Pending   --(psychologist confirms)--> Confirmed
/// Pending   --(psychologist rejects)---> Rejected   [terminal]
/// Pending   --(parent cancels)---------> Cancelled  [terminal]
/// Confirmed --(parent cancels)---------> Cancelled  [terminal]
/// Confirmed --(finalize, date<=today)--> Completed  [terminal]
/// ```
pub fn valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    match current {
        AppointmentStatus::Pending => &[
            AppointmentStatus::Confirmed,
            AppointmentStatus::Rejected,
            AppointmentStatus::Cancelled,
        ],
        AppointmentStatus::Confirmed => {
            &[AppointmentStatus::Cancelled, AppointmentStatus::Completed]
        }
        AppointmentStatus::Rejected
        | AppointmentStatus::Cancelled
        | AppointmentStatus::Completed => &[],
    }
}

pub fn is_terminal(status: AppointmentStatus) -> bool {
    valid_transitions(status).is_empty()
}

pub fn validate_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), SchedulingError> {
    if !valid_transitions(from).contains(&to) {
        warn!("Invalid status transition attempted: {} -> {}", from, to);
        return Err(SchedulingError::InvalidTransition { from, to });
    }
    debug!("Status transition validated: {} -> {}", from, to);
    Ok(())
}
