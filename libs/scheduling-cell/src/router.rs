// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::SchedulingState;

pub fn scheduling_routes(state: Arc<SchedulingState>) -> Router {
    // Every scheduling operation requires an authenticated user.
    let protected_routes = Router::new()
        // Availability windows and day resolution
        .route(
            "/availability",
            get(handlers::get_day_availability).post(handlers::upsert_window),
        )
        .route("/availability/windows", get(handlers::list_windows))
        .route("/availability/day", patch(handlers::change_window_day))
        .route("/availability/hours", get(handlers::list_hour_options))
        .route("/availability/{window_id}", delete(handlers::remove_window))
        // Appointments
        .route("/appointments", get(handlers::list_appointments))
        .route("/appointments/direct", post(handlers::create_direct_appointment))
        .route(
            "/appointments/{appointment_id}/status",
            patch(handlers::update_appointment_status),
        )
        .route(
            "/appointments/{appointment_id}/finalize",
            patch(handlers::finalize_appointment),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
