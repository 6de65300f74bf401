// libs/scheduling-cell/src/services/ledger.rs
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{Appointment, AppointmentStatus, NewAppointment};
use crate::services::{lifecycle, slots};

/// Durable record of appointments. Occupancy is always derived from the
/// non-terminated entries here; Cancelled and Rejected appointments release
/// their slot.
#[derive(Default)]
pub struct BookingLedger {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All appointments still occupying time for this psychologist on this
    /// date (non-Cancelled, non-Rejected), chronological.
    pub async fn list_for_day(&self, psychologist_id: Uuid, date: NaiveDate) -> Vec<Appointment> {
        let appointments = self.appointments.read().await;
        let mut result: Vec<Appointment> = appointments
            .values()
            .filter(|a| {
                a.psychologist_id == psychologist_id && a.date == date && occupies_slot(a.status)
            })
            .cloned()
            .collect();
        result.sort_by_key(|a| a.start_time);
        result
    }

    pub async fn get(&self, appointment_id: Uuid) -> Option<Appointment> {
        self.appointments.read().await.get(&appointment_id).cloned()
    }

    pub async fn list_for_parent(&self, parent_id: Uuid) -> Vec<Appointment> {
        self.list_filtered(|a| a.parent_id == parent_id).await
    }

    pub async fn list_for_psychologist(&self, psychologist_id: Uuid) -> Vec<Appointment> {
        self.list_filtered(|a| a.psychologist_id == psychologist_id)
            .await
    }

    pub async fn list_all(&self) -> Vec<Appointment> {
        self.list_filtered(|_| true).await
    }

    /// Atomic check-then-insert: verifies under the write lock that the
    /// requested span overlaps no live appointment, then persists a Pending
    /// record. This is the single serialization point that closes the race
    /// between two parents requesting the same slot.
    pub async fn reserve(&self, new: NewAppointment) -> Result<Appointment, SchedulingError> {
        let mut appointments = self.appointments.write().await;

        let conflict = appointments.values().any(|a| {
            a.psychologist_id == new.psychologist_id
                && a.date == new.date
                && occupies_slot(a.status)
                && slots::overlaps(new.start_time, new.end_time, a.start_time, a.end_time)
        });
        if conflict {
            warn!(
                "Slot {} on {} for psychologist {} taken at commit time",
                new.start_time.format("%H:%M"),
                new.date,
                new.psychologist_id
            );
            return Err(SchedulingError::SlotUnavailable);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            psychologist_id: new.psychologist_id,
            child_id: new.child_id,
            parent_id: new.parent_id,
            date: new.date,
            start_time: new.start_time,
            end_time: new.end_time,
            reason: new.reason,
            status: AppointmentStatus::Pending,
            findings: None,
            created_at: now,
            updated_at: now,
        };
        appointments.insert(appointment.id, appointment.clone());
        info!(
            "Appointment {} reserved for psychologist {} on {} at {}",
            appointment.id,
            appointment.psychologist_id,
            appointment.date,
            appointment.start_time.format("%H:%M")
        );
        Ok(appointment)
    }

    /// Applies a status change after validating it against the lifecycle
    /// state machine. Role-based rules on who may request which transition
    /// are enforced at the request boundary.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments.get_mut(&appointment_id).ok_or_else(|| {
            SchedulingError::NotFound(format!("appointment {}", appointment_id))
        })?;

        lifecycle::validate_transition(appointment.status, new_status)?;

        appointment.status = new_status;
        appointment.updated_at = Utc::now();
        debug!("Appointment {} moved to {}", appointment_id, new_status);
        Ok(appointment.clone())
    }

    /// Finalizes an attended session: only a Confirmed appointment whose
    /// date has arrived (civil-date comparison) can be completed.
    pub async fn attach_findings(
        &self,
        appointment_id: Uuid,
        findings: &str,
        today: NaiveDate,
    ) -> Result<Appointment, SchedulingError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments.get_mut(&appointment_id).ok_or_else(|| {
            SchedulingError::NotFound(format!("appointment {}", appointment_id))
        })?;

        if appointment.status != AppointmentStatus::Confirmed {
            return Err(SchedulingError::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Completed,
            });
        }
        if appointment.date > today {
            return Err(SchedulingError::InvalidRange(format!(
                "appointment on {} has not taken place yet",
                appointment.date
            )));
        }

        appointment.status = AppointmentStatus::Completed;
        appointment.findings = Some(findings.to_string());
        appointment.updated_at = Utc::now();
        info!("Appointment {} completed with findings", appointment_id);
        Ok(appointment.clone())
    }

    async fn list_filtered<F>(&self, predicate: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let appointments = self.appointments.read().await;
        let mut result: Vec<Appointment> =
            appointments.values().filter(|a| predicate(a)).cloned().collect();
        result.sort_by_key(|a| (a.date, a.start_time));
        result
    }
}

fn occupies_slot(status: AppointmentStatus) -> bool {
    !matches!(
        status,
        AppointmentStatus::Cancelled | AppointmentStatus::Rejected
    )
}

/// End of a session starting at `start`, or `None` when it would cross
/// midnight (which a valid window can never produce).
pub fn session_end(start: NaiveTime, session: chrono::Duration) -> Option<NaiveTime> {
    let (end, wrapped) = start.overflowing_add_signed(session);
    (wrapped == 0).then_some(end)
}
