// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::error::SchedulingError;
use crate::models::{
    hhmm, Appointment, AppointmentStatus, ChangeDayRequest, DayAvailabilityResponse,
    DirectBookingRequest, UpsertWindowRequest,
};
use crate::services::slots;
use crate::state::SchedulingState;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub psychologist_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowsQuery {
    pub psychologist_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoursQuery {
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: AppointmentStatus,
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

/// Free/occupied slot partition for one psychologist and date, freshly
/// resolved against the live ledger on every call.
#[axum::debug_handler]
pub async fn get_day_availability(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<AvailabilityQuery>,
    Extension(_user): Extension<User>,
) -> Result<Json<DayAvailabilityResponse>, AppError> {
    let psychologist_name = state
        .directory
        .psychologist_name(params.psychologist_id)
        .await
        .ok_or_else(|| {
            AppError::NotFound(format!("Psychologist {} not found", params.psychologist_id))
        })?;

    let partition = state
        .resolver
        .resolve(params.psychologist_id, params.date)
        .await;

    Ok(Json(DayAvailabilityResponse::from_partition(
        params.psychologist_id,
        psychologist_name,
        params.date,
        &partition,
    )))
}

/// Upsert of a recurring weekly window. Psychologists manage only their own
/// schedule; admins may act on anyone's.
#[axum::debug_handler]
pub async fn upsert_window(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpsertWindowRequest>,
) -> Result<Json<Value>, AppError> {
    authorize_schedule_owner(&user, request.psychologist_id)?;

    let window = state
        .store
        .set_window(
            request.psychologist_id,
            request.day_of_week,
            request.start_time,
            request.end_time,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "window": window,
        "message": "Availability window saved"
    })))
}

#[axum::debug_handler]
pub async fn list_windows(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<WindowsQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    authorize_schedule_owner(&user, params.psychologist_id)?;

    let windows = state.store.list_windows(params.psychologist_id).await;

    Ok(Json(json!({
        "psychologistId": params.psychologist_id,
        "windows": windows,
        "total": windows.len()
    })))
}

/// Moves a window to a different weekday. Delete and re-insert happen under
/// one store lock, so the old window cannot be lost halfway.
#[axum::debug_handler]
pub async fn change_window_day(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
    Json(request): Json<ChangeDayRequest>,
) -> Result<Json<Value>, AppError> {
    authorize_schedule_owner(&user, request.psychologist_id)?;

    let window = state
        .store
        .change_day(request.psychologist_id, request.old_day, request.window)
        .await?;

    Ok(Json(json!({
        "success": true,
        "window": window,
        "message": "Availability window moved"
    })))
}

/// Time points for the window-editing hour pickers, end boundary included.
/// Not a slot listing.
#[axum::debug_handler]
pub async fn list_hour_options(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<HoursQuery>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if params.end_time <= params.start_time {
        return Err(SchedulingError::InvalidRange(format!(
            "end {} must be after start {}",
            params.end_time.format("%H:%M"),
            params.start_time.format("%H:%M")
        ))
        .into());
    }

    let granularity = chrono::Duration::minutes(state.config.slot_granularity_minutes);
    let hours: Vec<String> = slots::time_points(params.start_time, params.end_time, granularity)
        .into_iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect();

    Ok(Json(json!({ "hours": hours })))
}

#[axum::debug_handler]
pub async fn remove_window(
    State(state): State<Arc<SchedulingState>>,
    Path(window_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<StatusCode, AppError> {
    // Idempotent: an absent window deletes to the same end state, but a
    // window that does exist must belong to the caller.
    if let Some(window) = state.store.get(window_id).await {
        authorize_schedule_owner(&user, window.psychologist_id)?;
    }

    state.store.remove_window(window_id).await;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

/// Parent booking request. Identity comes from the token; the body's
/// psychologist/child/slot selection is validated by the booking transaction.
#[axum::debug_handler]
pub async fn create_direct_appointment(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
    Json(request): Json<DirectBookingRequest>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.booking.request_booking(&user, request).await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = match user.role {
        Role::Parent => state.ledger.list_for_parent(user.id).await,
        Role::Psychologist => state.ledger.list_for_psychologist(user.id).await,
        Role::Admin => state.ledger.list_all().await,
    };

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

/// Confirm/reject by the psychologist, cancel by the parent. Completion has
/// its own path (`finalize`) because it must carry findings.
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Query(params): Query<StatusQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state
        .ledger
        .get(appointment_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", appointment_id)))?;

    authorize_status_change(&user, &appointment, params.status)?;

    let updated = state
        .ledger
        .update_status(appointment_id, params.status)
        .await?;
    Ok(Json(updated))
}

/// Plain-text findings in the body; transitions a Confirmed appointment
/// whose date has arrived to Completed.
#[axum::debug_handler]
pub async fn finalize_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    findings: String,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state
        .ledger
        .get(appointment_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", appointment_id)))?;

    if !user.can_act_for(appointment.psychologist_id) {
        return Err(AppError::Forbidden(
            "Only the attending psychologist can finalize this appointment".to_string(),
        ));
    }
    if findings.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Findings must not be empty".to_string(),
        ));
    }

    let updated = state
        .ledger
        .attach_findings(appointment_id, &findings, state.clock.today())
        .await?;
    Ok(Json(updated))
}

// ==============================================================================
// AUTHORIZATION HELPERS
// ==============================================================================

fn authorize_schedule_owner(user: &User, psychologist_id: Uuid) -> Result<(), AppError> {
    let owns = user.role == Role::Psychologist && user.id == psychologist_id;
    if !owns && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to manage this psychologist's availability".to_string(),
        ));
    }
    Ok(())
}

fn authorize_status_change(
    user: &User,
    appointment: &Appointment,
    target: AppointmentStatus,
) -> Result<(), AppError> {
    if user.is_admin() {
        return match target {
            AppointmentStatus::Completed => Err(AppError::BadRequest(
                "Completion requires findings; use the finalize endpoint".to_string(),
            )),
            _ => Ok(()),
        };
    }

    match target {
        AppointmentStatus::Confirmed | AppointmentStatus::Rejected => {
            if user.role == Role::Psychologist && user.id == appointment.psychologist_id {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "Only the attending psychologist can confirm or reject".to_string(),
                ))
            }
        }
        AppointmentStatus::Cancelled => {
            if user.role == Role::Parent && user.id == appointment.parent_id {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "Only the requesting parent can cancel".to_string(),
                ))
            }
        }
        AppointmentStatus::Completed => Err(AppError::BadRequest(
            "Completion requires findings; use the finalize endpoint".to_string(),
        )),
        AppointmentStatus::Pending => Err(AppError::BadRequest(
            "Appointments cannot be moved back to Pending".to_string(),
        )),
    }
}
