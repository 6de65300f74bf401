// libs/scheduling-cell/src/services/booking.rs
use std::sync::Arc;

use tracing::{info, warn};

use directory_cell::services::FamilyDirectory;
use shared_models::auth::{Role, User};
use shared_utils::clock::Clock;

use crate::error::SchedulingError;
use crate::models::{Appointment, AppointmentStatus, DirectBookingRequest, NewAppointment};
use crate::services::ledger::{session_end, BookingLedger};
use crate::services::resolver::AvailabilityResolver;

/// The booking transaction: validates a parent's request against freshly
/// resolved availability and commits it through the ledger's atomic reserve.
/// Failures are surfaced immediately; nothing is retried server-side.
pub struct BookingService {
    ledger: Arc<BookingLedger>,
    resolver: AvailabilityResolver,
    directory: Arc<FamilyDirectory>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(
        ledger: Arc<BookingLedger>,
        resolver: AvailabilityResolver,
        directory: Arc<FamilyDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            resolver,
            directory,
            clock,
        }
    }

    /// Preconditions, first failure wins: past date, slot membership in the
    /// freshly resolved free set, guardianship of the child. The fixed
    /// 60-minute duration is enforced at creation.
    pub async fn request_booking(
        &self,
        actor: &User,
        request: DirectBookingRequest,
    ) -> Result<Appointment, SchedulingError> {
        if actor.role != Role::Parent {
            return Err(SchedulingError::Forbidden(
                "only a parent can request a booking".to_string(),
            ));
        }
        if let Some(status) = request.status {
            if status != AppointmentStatus::Pending {
                return Err(SchedulingError::InvalidRange(format!(
                    "direct bookings are created as Pending, not {}",
                    status
                )));
            }
        }

        let today = self.clock.today();
        if request.date < today {
            warn!(
                "Parent {} attempted to book {} in the past (today {})",
                actor.id, request.date, today
            );
            return Err(SchedulingError::PastDate);
        }

        let partition = self
            .resolver
            .resolve(request.psychologist_id, request.date)
            .await;
        if !partition.free.contains(&request.start_time) {
            return Err(SchedulingError::SlotUnavailable);
        }

        if !self.directory.is_guardian(actor.id, request.child_id).await {
            return Err(SchedulingError::Forbidden(format!(
                "child {} is not registered under this parent",
                request.child_id
            )));
        }

        let expected_end = session_end(request.start_time, self.resolver.session())
            .ok_or_else(|| {
                SchedulingError::InvalidRange("session would cross midnight".to_string())
            })?;
        if request.end_time != expected_end {
            return Err(SchedulingError::InvalidRange(format!(
                "appointments last exactly {} minutes: expected end {}",
                self.resolver.session().num_minutes(),
                expected_end.format("%H:%M")
            )));
        }

        // The free-set check above is advisory; the ledger re-checks overlap
        // under its write lock, which is what actually closes the race.
        let appointment = self
            .ledger
            .reserve(NewAppointment {
                psychologist_id: request.psychologist_id,
                child_id: request.child_id,
                parent_id: actor.id,
                date: request.date,
                start_time: request.start_time,
                end_time: expected_end,
                reason: request.reason,
            })
            .await?;

        info!(
            "Booking committed: appointment {} for child {} with psychologist {}",
            appointment.id, appointment.child_id, appointment.psychologist_id
        );
        Ok(appointment)
    }
}
