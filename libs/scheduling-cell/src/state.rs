// libs/scheduling-cell/src/state.rs
use std::sync::Arc;

use directory_cell::services::FamilyDirectory;
use shared_config::AppConfig;
use shared_utils::clock::Clock;

use crate::services::availability::AvailabilityStore;
use crate::services::booking::BookingService;
use crate::services::ledger::BookingLedger;
use crate::services::resolver::AvailabilityResolver;

/// Shared state of the scheduling cell: the stores plus the services wired
/// on top of them. One instance lives for the whole process.
pub struct SchedulingState {
    pub config: Arc<AppConfig>,
    pub store: Arc<AvailabilityStore>,
    pub ledger: Arc<BookingLedger>,
    pub resolver: AvailabilityResolver,
    pub booking: BookingService,
    pub directory: Arc<FamilyDirectory>,
    pub clock: Arc<dyn Clock>,
}

impl SchedulingState {
    pub fn new(
        config: Arc<AppConfig>,
        directory: Arc<FamilyDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(AvailabilityStore::new());
        let ledger = Arc::new(BookingLedger::new());
        let resolver = AvailabilityResolver::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
            config.slot_granularity_minutes,
            config.session_minutes,
        );
        let booking = BookingService::new(
            Arc::clone(&ledger),
            resolver.clone(),
            Arc::clone(&directory),
            Arc::clone(&clock),
        );

        Self {
            config,
            store,
            ledger,
            resolver,
            booking,
            directory,
            clock,
        }
    }
}
