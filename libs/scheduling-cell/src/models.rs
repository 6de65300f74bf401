// libs/scheduling-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// Weekdays a psychologist can hold a recurring window on. The clinic does
/// not open on weekends, so those days have no representation at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    #[serde(alias = "MON", alias = "LUNES", alias = "Lunes")]
    Monday,
    #[serde(alias = "TUE", alias = "MARTES", alias = "Martes")]
    Tuesday,
    #[serde(alias = "WED", alias = "MIERCOLES", alias = "Miercoles", alias = "Miércoles")]
    Wednesday,
    #[serde(alias = "THU", alias = "JUEVES", alias = "Jueves")]
    Thursday,
    #[serde(alias = "FRI", alias = "VIERNES", alias = "Viernes")]
    Friday,
}

impl DayOfWeek {
    /// Maps a civil date onto a clinic weekday. Weekend dates map to `None`;
    /// the resolver treats them exactly like a weekday without a window.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        match date.weekday() {
            Weekday::Mon => Some(DayOfWeek::Monday),
            Weekday::Tue => Some(DayOfWeek::Tuesday),
            Weekday::Wed => Some(DayOfWeek::Wednesday),
            Weekday::Thu => Some(DayOfWeek::Thursday),
            Weekday::Fri => Some(DayOfWeek::Friday),
            Weekday::Sat | Weekday::Sun => None,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
        };
        write!(f, "{}", name)
    }
}

/// A psychologist's recurring weekly window. At most one window exists per
/// (psychologist, weekday); upserting for the same day replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub psychologist_id: Uuid,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertWindowRequest {
    pub psychologist_id: Uuid,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

/// The shape of the window being moved to another weekday.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSpec {
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDayRequest {
    pub psychologist_id: Uuid,
    pub old_day: DayOfWeek,
    pub window: WindowSpec,
}

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

/// Appointment lifecycle. Rejected, Cancelled and Completed are terminal.
/// The legacy frontend used Spanish labels and was inconsistent about
/// "Confirmada" vs "Programada"; both are accepted as Confirmed on input,
/// canonical output is always the English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(alias = "Pendiente")]
    Pending,
    #[serde(alias = "Confirmada", alias = "Programada")]
    Confirmed,
    #[serde(alias = "Rechazada")]
    Rejected,
    #[serde(alias = "Cancelada")]
    Cancelled,
    #[serde(alias = "Completada", alias = "Atendida")]
    Completed,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "Pending"),
            AppointmentStatus::Confirmed => write!(f, "Confirmed"),
            AppointmentStatus::Rejected => write!(f, "Rejected"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
            AppointmentStatus::Completed => write!(f, "Completed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub psychologist_id: Uuid,
    pub child_id: Uuid,
    pub parent_id: Uuid,
    /// Civil date of the session; no time-of-day or timezone attached.
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub reason: String,
    pub status: AppointmentStatus,
    pub findings: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking request as submitted by a parent. The parent's identity comes
/// from the auth context, never from the body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectBookingRequest {
    pub child_id: Uuid,
    pub psychologist_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub reason: String,
    pub status: Option<AppointmentStatus>,
}

/// Fields the ledger needs to persist a new Pending appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub psychologist_id: Uuid,
    pub child_id: Uuid,
    pub parent_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: String,
}

// ==============================================================================
// RESOLUTION MODELS
// ==============================================================================

/// Free/occupied split of one day's bookable slot starts, both halves in
/// chronological order. Recomputed from live state on every request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotPartition {
    pub free: Vec<NaiveTime>,
    pub occupied: Vec<NaiveTime>,
}

impl SlotPartition {
    pub fn total_slots(&self) -> usize {
        self.free.len() + self.occupied.len()
    }
}

/// Wire shape of `GET /availability`. Field names are part of the public
/// contract consumed by the frontend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailabilityResponse {
    pub psychologist_id: Uuid,
    pub psychologist_name: String,
    pub date: NaiveDate,
    pub horarios_disponibles: Vec<String>,
    pub total_slots: usize,
    pub slots_ocupados: usize,
    pub slots_disponibles: usize,
}

impl DayAvailabilityResponse {
    pub fn from_partition(
        psychologist_id: Uuid,
        psychologist_name: String,
        date: NaiveDate,
        partition: &SlotPartition,
    ) -> Self {
        Self {
            psychologist_id,
            psychologist_name,
            date,
            horarios_disponibles: partition
                .free
                .iter()
                .map(|t| t.format("%H:%M").to_string())
                .collect(),
            total_slots: partition.total_slots(),
            slots_ocupados: partition.occupied.len(),
            slots_disponibles: partition.free.len(),
        }
    }
}

// ==============================================================================
// TIME FORMAT
// ==============================================================================

/// Serde adapter for the "HH:mm" 24-hour wire format. Accepts "HH:mm:ss" on
/// input for tolerance; always emits "HH:mm".
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}
