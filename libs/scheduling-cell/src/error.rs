// libs/scheduling-cell/src/error.rs
use thiserror::Error;

use shared_models::error::AppError;

use crate::models::AppointmentStatus;

/// Domain errors of the scheduling core. All of them are recovered at the
/// request boundary and surfaced as structured responses; none are retried.
#[derive(Debug, Error, PartialEq)]
pub enum SchedulingError {
    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot book an appointment on a past date")]
    PastDate,

    #[error("Requested slot is no longer available")]
    SlotUnavailable,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match &err {
            SchedulingError::InvalidRange(_)
            | SchedulingError::PastDate
            | SchedulingError::InvalidTransition { .. } => AppError::BadRequest(err.to_string()),
            SchedulingError::NotFound(_) => AppError::NotFound(err.to_string()),
            // Expected under concurrent load; 409 keeps it distinguishable
            // from server faults.
            SchedulingError::SlotUnavailable => AppError::Conflict(err.to_string()),
            SchedulingError::Forbidden(_) => AppError::Forbidden(err.to_string()),
        }
    }
}
