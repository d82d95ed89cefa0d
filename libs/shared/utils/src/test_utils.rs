use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::{AppConfig, StorageBackend};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub storage_timeout_seconds: u64,
    pub notification_timeout_ms: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            storage_timeout_seconds: 5,
            notification_timeout_ms: 500,
        }
    }
}

impl TestConfig {
    /// Points the Supabase client at a mock server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            storage_backend: StorageBackend::Supabase,
            storage_timeout_seconds: self.storage_timeout_seconds,
            notification_timeout_ms: self.notification_timeout_ms,
            ..AppConfig::default()
        }
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// A `time_slots` row in the legacy `{"days": [...]}` shape.
    pub fn time_slot_response(slot_id: &str, doctor_id: &str, days: &[&str], is_available: bool) -> Value {
        json!({
            "slot_id": slot_id,
            "doctor_id": doctor_id,
            "is_available": is_available,
            "available_days": { "days": days },
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        appointment_id: &str,
        doctor_id: &str,
        patient_id: &str,
        slot_id: &str,
        appointment_date: &str,
    ) -> Value {
        json!({
            "appointment_id": appointment_id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "appointment_date": appointment_date,
            "start_time": "09:00:00",
            "end_time": "09:30:00",
            "slot_id": slot_id,
            "status": "scheduled",
            "type": "consultation",
            "notes": null,
            "created_at": Utc::now().to_rfc3339()
        })
    }

    /// PostgREST body for a rejected insert on a unique index.
    pub fn unique_violation_response() -> Value {
        json!({
            "code": "23505",
            "details": "Key (doctor_id, slot_id, appointment_date) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"appointments_doctor_slot_date_key\""
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "code": code,
            "message": message,
            "details": null,
            "hint": null
        })
    }
}

/// A complete booking request body with fresh identifiers.
pub fn booking_request_json(doctor_id: &str, slot_id: &str, appointment_date: &str) -> Value {
    json!({
        "doctor_id": doctor_id,
        "patient_id": Uuid::new_v4().to_string(),
        "appointment_date": appointment_date,
        "start_time": "09:00",
        "end_time": "09:30",
        "status": "scheduled",
        "type": "consultation",
        "notes": "first visit",
        "slot_id": slot_id
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_supabase_url("http://127.0.0.1:9999");
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://127.0.0.1:9999");
        assert_eq!(app_config.storage_backend, StorageBackend::Supabase);
        assert!(app_config.is_configured());
    }

    #[test]
    fn test_slot_fixture_shape() {
        let slot = MockSupabaseResponses::time_slot_response("s", "d", &["Monday"], true);
        assert_eq!(slot["available_days"]["days"][0], "Monday");
        assert_eq!(slot["is_available"], true);
    }

    #[test]
    fn test_booking_request_has_required_fields() {
        let body = booking_request_json("d", "s", "2024-01-01");
        for field in ["doctor_id", "patient_id", "appointment_date", "start_time", "end_time", "status", "type", "slot_id"] {
            assert!(body.get(field).is_some(), "missing {}", field);
        }
    }
}
