use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Method,
};
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{Appointment, BookingKey, StorageError};

/// Appointment persistence. `insert` is an atomic conditional write: it fails with
/// `StorageError::UniqueViolation` when the booking key is already taken.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn exists(&self, key: &BookingKey) -> Result<bool, StorageError>;

    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, StorageError>;

    async fn list_for_doctor_on(
        &self,
        doctor_id: Uuid,
        appointment_date: NaiveDate,
    ) -> Result<Vec<Appointment>, StorageError>;
}

pub struct SupabaseAppointmentRepository {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentRepository {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

fn parse_appointments(rows: Vec<Value>) -> Result<Vec<Appointment>, StorageError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<Appointment>, _>>()
        .map_err(|e| StorageError::Decode(format!("Failed to parse appointments: {}", e)))
}

#[async_trait]
impl AppointmentRepository for SupabaseAppointmentRepository {
    async fn exists(&self, key: &BookingKey) -> Result<bool, StorageError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&slot_id=eq.{}&appointment_date=eq.{}&select=appointment_id&limit=1",
            key.doctor_id,
            key.slot_id,
            key.appointment_date.format("%Y-%m-%d")
        );

        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(!result.is_empty())
    }

    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, StorageError> {
        let appointment_data = json!({
            "appointment_id": appointment.appointment_id,
            "doctor_id": appointment.doctor_id,
            "patient_id": appointment.patient_id,
            "appointment_date": appointment.appointment_date.format("%Y-%m-%d").to_string(),
            "start_time": appointment.start_time.format("%H:%M:%S").to_string(),
            "end_time": appointment.end_time.format("%H:%M:%S").to_string(),
            "slot_id": appointment.slot_id,
            "status": appointment.status,
            "type": appointment.appointment_type,
            "notes": appointment.notes,
            "created_at": appointment.created_at.to_rfc3339(),
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(appointment_data),
                Some(headers),
            )
            .await?;

        // The write was accepted; an unreadable representation falls back to the row we sent.
        let created = match result.into_iter().next().map(serde_json::from_value::<Appointment>) {
            Some(Ok(created)) => created,
            Some(Err(e)) => {
                error!(
                    "Appointment {} written but returned row could not be parsed: {}",
                    appointment.appointment_id, e
                );
                appointment.clone()
            }
            None => {
                error!(
                    "Appointment {} written but insert returned no representation",
                    appointment.appointment_id
                );
                appointment.clone()
            }
        };

        debug!("Appointment row {} written", created.appointment_id);
        Ok(created)
    }

    async fn list_for_doctor_on(
        &self,
        doctor_id: Uuid,
        appointment_date: NaiveDate,
    ) -> Result<Vec<Appointment>, StorageError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&order=start_time.asc",
            doctor_id,
            appointment_date.format("%Y-%m-%d")
        );

        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        parse_appointments(result)
    }
}
