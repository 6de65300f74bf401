// libs/scheduling-cell/src/services/resolver.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use crate::models::{DayOfWeek, SlotPartition};
use crate::services::availability::AvailabilityStore;
use crate::services::ledger::BookingLedger;
use crate::services::slots;

/// Combines the availability store and the booking ledger into the
/// free/occupied partition for one (psychologist, date) pair. Carries no
/// cache: bookings mutate state concurrently, so every call reads live data.
#[derive(Clone)]
pub struct AvailabilityResolver {
    store: Arc<AvailabilityStore>,
    ledger: Arc<BookingLedger>,
    granularity: Duration,
    session: Duration,
}

impl AvailabilityResolver {
    pub fn new(
        store: Arc<AvailabilityStore>,
        ledger: Arc<BookingLedger>,
        granularity_minutes: i64,
        session_minutes: i64,
    ) -> Self {
        Self {
            store,
            ledger,
            granularity: Duration::minutes(granularity_minutes),
            session: Duration::minutes(session_minutes),
        }
    }

    pub fn session(&self) -> Duration {
        self.session
    }

    /// A weekend date, or a weekday without a window, yields the empty
    /// partition -- absence of availability is not an error.
    pub async fn resolve(&self, psychologist_id: Uuid, date: NaiveDate) -> SlotPartition {
        let Some(day) = DayOfWeek::from_date(date) else {
            return SlotPartition::default();
        };
        let Some(window) = self.store.window_for_day(psychologist_id, day).await else {
            return SlotPartition::default();
        };

        let starts = slots::bookable_starts(&window, self.granularity, self.session);
        let booked = self.ledger.list_for_day(psychologist_id, date).await;

        let mut partition = SlotPartition::default();
        for start in starts {
            // A window never reaches midnight, so the session end exists.
            let Some(end) = crate::services::ledger::session_end(start, self.session) else {
                continue;
            };
            let occupied = booked
                .iter()
                .any(|a| slots::overlaps(start, end, a.start_time, a.end_time));
            if occupied {
                partition.occupied.push(start);
            } else {
                partition.free.push(start);
            }
        }

        debug!(
            "Resolved {} slots for psychologist {} on {}: {} free, {} occupied",
            partition.total_slots(),
            psychologist_id,
            date,
            partition.free.len(),
            partition.occupied.len()
        );
        partition
    }
}
