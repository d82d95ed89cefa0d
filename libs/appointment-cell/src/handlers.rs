// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{parse_appointment_date, Appointment, AppointmentError, BookAppointmentRequest};
use crate::router::AppointmentState;

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::InvalidInput(msg) => AppError::ValidationError(msg),
            AppointmentError::SlotUnavailable => AppError::BadRequest("Slot not available".to_string()),
            AppointmentError::SlotNotOfferedOnDay { .. } => {
                AppError::BadRequest("Slot not available on this day".to_string())
            }
            AppointmentError::BookingConflict => AppError::Conflict("Appointment conflict".to_string()),
            AppointmentError::Internal => AppError::Internal("Booking failed".to_string()),
        }
    }
}

/// POST /appointments
pub async fn book_appointment(
    State(state): State<Arc<AppointmentState>>,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Unreadable booking payload: {}", rejection.body_text());
        AppError::from(AppointmentError::InvalidInput("Request body must be a JSON object".to_string()))
    })?;

    let appointment = state.booking_service.book_appointment(request).await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

/// GET /appointments/doctors/{doctor_id}/dates/{appointment_date}
pub async fn get_doctor_appointments_on_date(
    State(state): State<Arc<AppointmentState>>,
    Path((doctor_id, appointment_date)): Path<(String, String)>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let doctor_id = Uuid::parse_str(&doctor_id).map_err(|_| {
        AppError::from(AppointmentError::InvalidInput("doctor_id must be a valid identifier".to_string()))
    })?;
    let appointment_date = parse_appointment_date(&appointment_date)?;

    let appointments = state
        .booking_service
        .list_doctor_appointments_on(doctor_id, appointment_date)
        .await?;

    Ok(Json(appointments))
}
