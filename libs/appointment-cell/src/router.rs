// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::services::booking::AppointmentBookingService;

pub struct AppointmentState {
    pub booking_service: AppointmentBookingService,
}

impl AppointmentState {
    pub fn new(booking_service: AppointmentBookingService) -> Self {
        Self { booking_service }
    }
}

pub fn appointment_routes(state: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route(
            "/doctors/{doctor_id}/dates/{appointment_date}",
            get(handlers::get_doctor_appointments_on_date),
        )
        .with_state(state)
}
