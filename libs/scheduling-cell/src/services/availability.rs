// libs/scheduling-cell/src/services/availability.rs
use std::collections::HashMap;

use chrono::NaiveTime;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{AvailabilityWindow, DayOfWeek, WindowSpec};

/// Store of recurring weekly windows, keyed by window id with the
/// (psychologist, weekday) pair kept unique. All mutations run under one
/// write-lock acquisition, including the two-step day change.
#[derive(Default)]
pub struct AvailabilityStore {
    windows: RwLock<HashMap<Uuid, AvailabilityWindow>>,
}

impl AvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert by (psychologist, weekday): a window already present for that
    /// day is replaced in place, keeping its id stable.
    pub async fn set_window(
        &self,
        psychologist_id: Uuid,
        day_of_week: DayOfWeek,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<AvailabilityWindow, SchedulingError> {
        validate_range(start_time, end_time)?;

        let mut windows = self.windows.write().await;
        let window = Self::upsert_locked(
            &mut windows,
            psychologist_id,
            day_of_week,
            start_time,
            end_time,
        );
        debug!(
            "Set window {} for psychologist {} on {}",
            window.id, psychologist_id, day_of_week
        );
        Ok(window)
    }

    /// Moves a window to another weekday. The removal of the old record and
    /// the insert on the new day share one lock guard, so a failure can no
    /// longer lose the old window between the two steps.
    pub async fn change_day(
        &self,
        psychologist_id: Uuid,
        old_day: DayOfWeek,
        spec: WindowSpec,
    ) -> Result<AvailabilityWindow, SchedulingError> {
        validate_range(spec.start_time, spec.end_time)?;

        let mut windows = self.windows.write().await;

        let old_id = windows
            .values()
            .find(|w| w.psychologist_id == psychologist_id && w.day_of_week == old_day)
            .map(|w| w.id)
            .ok_or_else(|| {
                SchedulingError::NotFound(format!(
                    "no availability window on {} for psychologist {}",
                    old_day, psychologist_id
                ))
            })?;
        windows.remove(&old_id);

        let window = Self::upsert_locked(
            &mut windows,
            psychologist_id,
            spec.day_of_week,
            spec.start_time,
            spec.end_time,
        );
        debug!(
            "Moved window of psychologist {} from {} to {}",
            psychologist_id, old_day, spec.day_of_week
        );
        Ok(window)
    }

    pub async fn list_windows(&self, psychologist_id: Uuid) -> Vec<AvailabilityWindow> {
        let windows = self.windows.read().await;
        let mut result: Vec<AvailabilityWindow> = windows
            .values()
            .filter(|w| w.psychologist_id == psychologist_id)
            .cloned()
            .collect();
        result.sort_by_key(|w| (w.day_of_week, w.start_time));
        result
    }

    pub async fn window_for_day(
        &self,
        psychologist_id: Uuid,
        day_of_week: DayOfWeek,
    ) -> Option<AvailabilityWindow> {
        self.windows
            .read()
            .await
            .values()
            .find(|w| w.psychologist_id == psychologist_id && w.day_of_week == day_of_week)
            .cloned()
    }

    pub async fn get(&self, window_id: Uuid) -> Option<AvailabilityWindow> {
        self.windows.read().await.get(&window_id).cloned()
    }

    /// Idempotent: deleting an absent window is not an error.
    pub async fn remove_window(&self, window_id: Uuid) {
        let removed = self.windows.write().await.remove(&window_id);
        if removed.is_some() {
            debug!("Removed window {}", window_id);
        }
    }

    fn upsert_locked(
        windows: &mut HashMap<Uuid, AvailabilityWindow>,
        psychologist_id: Uuid,
        day_of_week: DayOfWeek,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> AvailabilityWindow {
        let existing_id = windows
            .values()
            .find(|w| w.psychologist_id == psychologist_id && w.day_of_week == day_of_week)
            .map(|w| w.id);

        let window = AvailabilityWindow {
            id: existing_id.unwrap_or_else(Uuid::new_v4),
            psychologist_id,
            day_of_week,
            start_time,
            end_time,
        };
        windows.insert(window.id, window.clone());
        window
    }
}

fn validate_range(start_time: NaiveTime, end_time: NaiveTime) -> Result<(), SchedulingError> {
    if end_time <= start_time {
        return Err(SchedulingError::InvalidRange(format!(
            "window end {} must be after start {}",
            end_time.format("%H:%M"),
            start_time.format("%H:%M")
        )));
    }
    Ok(())
}
