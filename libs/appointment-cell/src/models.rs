// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DayOfWeek {
    #[serde(alias = "sunday")]
    Sunday,
    #[serde(alias = "monday")]
    Monday,
    #[serde(alias = "tuesday")]
    Tuesday,
    #[serde(alias = "wednesday")]
    Wednesday,
    #[serde(alias = "thursday")]
    Thursday,
    #[serde(alias = "friday")]
    Friday,
    #[serde(alias = "saturday")]
    Saturday,
}

impl DayOfWeek {
    pub fn name(&self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "Sunday",
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weekdays a slot runs on, never empty. Stored as `{"days": [...]}`; a bare array is
/// accepted on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "AvailableDaysRepr")]
pub struct AvailableDays {
    days: Vec<DayOfWeek>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AvailableDaysRepr {
    Wrapped { days: Vec<DayOfWeek> },
    Plain(Vec<DayOfWeek>),
}

impl TryFrom<AvailableDaysRepr> for AvailableDays {
    type Error = String;

    fn try_from(repr: AvailableDaysRepr) -> Result<Self, Self::Error> {
        match repr {
            AvailableDaysRepr::Wrapped { days } | AvailableDaysRepr::Plain(days) => Self::new(days),
        }
    }
}

impl AvailableDays {
    pub fn new(days: impl IntoIterator<Item = DayOfWeek>) -> Result<Self, String> {
        let available = Self {
            days: days.into_iter().collect(),
        };
        if available.is_empty() {
            return Err("a slot must run on at least one weekday".to_string());
        }
        Ok(available)
    }

    pub fn days(&self) -> &[DayOfWeek] {
        &self.days
    }

    pub fn contains(&self, day: DayOfWeek) -> bool {
        self.days.contains(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSlot {
    pub slot_id: Uuid,
    pub doctor_id: Uuid,
    pub is_available: bool,
    pub available_days: AvailableDays,
}

impl TimeSlot {
    pub fn offers(&self, day: DayOfWeek) -> bool {
        self.available_days.contains(day)
    }
}

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_id: Uuid,
    pub status: String,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn booking_key(&self) -> BookingKey {
        BookingKey {
            doctor_id: self.doctor_id,
            slot_id: self.slot_id,
            appointment_date: self.appointment_date,
        }
    }
}

/// The composite key at most one appointment may hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BookingKey {
    pub doctor_id: Uuid,
    pub slot_id: Uuid,
    pub appointment_date: NaiveDate,
}

impl fmt::Display for BookingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doctor {} / slot {} / {}", self.doctor_id, self.slot_id, self.appointment_date)
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Raw booking request as received from a client. Every field is optional here so that
/// missing values surface as `InvalidInput` instead of a deserializer rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    pub appointment_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub appointment_type: Option<String>,
    pub notes: Option<String>,
    pub slot_id: Option<String>,
}

/// A booking request whose fields have all been parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_id: Uuid,
    pub status: String,
    pub appointment_type: String,
    pub notes: Option<String>,
}

impl NewAppointment {
    pub fn booking_key(&self) -> BookingKey {
        BookingKey {
            doctor_id: self.doctor_id,
            slot_id: self.slot_id,
            appointment_date: self.appointment_date,
        }
    }

    pub fn into_appointment(self, appointment_id: Uuid, created_at: DateTime<Utc>) -> Appointment {
        Appointment {
            appointment_id,
            doctor_id: self.doctor_id,
            patient_id: self.patient_id,
            appointment_date: self.appointment_date,
            start_time: self.start_time,
            end_time: self.end_time,
            slot_id: self.slot_id,
            status: self.status,
            appointment_type: self.appointment_type,
            notes: self.notes,
            created_at,
        }
    }
}

impl BookAppointmentRequest {
    pub fn validate(&self) -> Result<NewAppointment, AppointmentError> {
        Ok(NewAppointment {
            doctor_id: parse_uuid("doctor_id", &self.doctor_id)?,
            patient_id: parse_uuid("patient_id", &self.patient_id)?,
            appointment_date: parse_appointment_date(required("appointment_date", &self.appointment_date)?)?,
            start_time: parse_time_of_day("start_time", required("start_time", &self.start_time)?)?,
            end_time: parse_time_of_day("end_time", required("end_time", &self.end_time)?)?,
            slot_id: parse_uuid("slot_id", &self.slot_id)?,
            status: required("status", &self.status)?.to_string(),
            appointment_type: required("type", &self.appointment_type)?.to_string(),
            notes: self.notes.clone(),
        })
    }
}

/// The value as sent, once it is known not to be blank.
fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, AppointmentError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppointmentError::InvalidInput(format!("{} is required", field))),
    }
}

fn parse_uuid(field: &str, value: &Option<String>) -> Result<Uuid, AppointmentError> {
    let raw = required(field, value)?;
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppointmentError::InvalidInput(format!("{} must be a valid identifier", field)))
}

/// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp whose UTC calendar date is used.
pub fn parse_appointment_date(raw: &str) -> Result<NaiveDate, AppointmentError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| {
            AppointmentError::InvalidInput(format!("appointment_date '{}' is not a valid ISO date", raw))
        })
}

fn parse_time_of_day(field: &str, raw: &str) -> Result<NaiveTime, AppointmentError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppointmentError::InvalidInput(format!("{} '{}' is not a valid time of day", field, raw)))
}

// ==============================================================================
// NOTIFICATION MODELS
// ==============================================================================

pub const STAFF_AUDIENCE: &str = "staff";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingEvent {
    pub event_type: String,
    pub audience: String,
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub timestamp: DateTime<Utc>,
}

impl BookingEvent {
    pub fn booking_created(appointment: &Appointment) -> Self {
        Self {
            event_type: "booking_created".to_string(),
            audience: STAFF_AUDIENCE.to_string(),
            appointment_id: appointment.appointment_id,
            doctor_id: appointment.doctor_id,
            appointment_date: appointment.appointment_date,
            timestamp: Utc::now(),
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Slot not available")]
    SlotUnavailable,

    #[error("Slot not available on {weekday}")]
    SlotNotOfferedOnDay { weekday: DayOfWeek },

    #[error("Appointment conflict")]
    BookingConflict,

    #[error("Internal error")]
    Internal,
}

/// Failures reported by the slot and appointment stores.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("storage request timed out")]
    Timeout,

    #[error("storage request failed: {0}")]
    Request(String),

    #[error("failed to decode storage response: {0}")]
    Decode(String),
}

impl From<shared_database::SupabaseError> for StorageError {
    fn from(e: shared_database::SupabaseError) -> Self {
        use shared_database::SupabaseError;
        match e {
            SupabaseError::UniqueViolation(_) => StorageError::UniqueViolation,
            SupabaseError::Timeout => StorageError::Timeout,
            SupabaseError::Decode(msg) => StorageError::Decode(msg),
            other => StorageError::Request(other.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn full_request() -> BookAppointmentRequest {
        BookAppointmentRequest {
            doctor_id: Some(Uuid::new_v4().to_string()),
            patient_id: Some(Uuid::new_v4().to_string()),
            appointment_date: Some("2024-01-01".to_string()),
            start_time: Some("09:00".to_string()),
            end_time: Some("09:30:00".to_string()),
            status: Some("scheduled".to_string()),
            appointment_type: Some("consultation".to_string()),
            notes: None,
            slot_id: Some(Uuid::new_v4().to_string()),
        }
    }

    #[test]
    fn test_valid_request_parses() {
        let request = full_request();
        let parsed = request.validate().unwrap();

        assert_eq!(parsed.appointment_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(parsed.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(parsed.end_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(parsed.status, "scheduled");
        assert!(parsed.notes.is_none());
    }

    #[test]
    fn test_missing_field_is_invalid_input() {
        let mut request = full_request();
        request.status = None;
        assert_matches!(request.validate(), Err(AppointmentError::InvalidInput(msg)) if msg.contains("status"));

        let mut request = full_request();
        request.appointment_type = Some("   ".to_string());
        assert_matches!(request.validate(), Err(AppointmentError::InvalidInput(msg)) if msg.contains("type"));
    }

    #[test]
    fn test_unparsable_values_are_invalid_input() {
        let mut request = full_request();
        request.appointment_date = Some("2024-02-30".to_string());
        assert_matches!(request.validate(), Err(AppointmentError::InvalidInput(_)));

        let mut request = full_request();
        request.slot_id = Some("42".to_string());
        assert_matches!(request.validate(), Err(AppointmentError::InvalidInput(msg)) if msg.contains("slot_id"));

        let mut request = full_request();
        request.start_time = Some("nine".to_string());
        assert_matches!(request.validate(), Err(AppointmentError::InvalidInput(_)));
    }

    #[test]
    fn test_timestamp_date_uses_utc_calendar_day() {
        let date = parse_appointment_date("2024-01-01T23:30:00-02:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_available_days_accepts_both_shapes() {
        let wrapped: AvailableDays = serde_json::from_value(json!({"days": ["Monday", "Wednesday"]})).unwrap();
        let plain: AvailableDays = serde_json::from_value(json!(["Monday", "wednesday"])).unwrap();

        assert_eq!(wrapped, plain);
        assert!(wrapped.contains(DayOfWeek::Wednesday));
        assert!(!wrapped.contains(DayOfWeek::Tuesday));

        let serialized = serde_json::to_value(&wrapped).unwrap();
        assert_eq!(serialized, json!({"days": ["Monday", "Wednesday"]}));
    }

    #[test]
    fn test_request_uses_type_field_name() {
        let request: BookAppointmentRequest = serde_json::from_value(json!({
            "type": "follow_up",
            "notes": "bring x-rays"
        }))
        .unwrap();

        assert_eq!(request.appointment_type.as_deref(), Some("follow_up"));
        assert_eq!(request.notes.as_deref(), Some("bring x-rays"));
        assert!(request.doctor_id.is_none());
    }

    #[test]
    fn test_empty_day_set_is_rejected() {
        assert!(AvailableDays::new(Vec::<DayOfWeek>::new()).is_err());
        assert!(serde_json::from_value::<AvailableDays>(json!({"days": []})).is_err());
        assert!(serde_json::from_value::<AvailableDays>(json!([])).is_err());

        let row = json!({
            "slot_id": Uuid::new_v4(),
            "doctor_id": Uuid::new_v4(),
            "is_available": true,
            "available_days": {"days": []}
        });
        assert!(serde_json::from_value::<TimeSlot>(row).is_err());
    }

    #[test]
    fn test_text_fields_kept_as_sent() {
        let mut request = full_request();
        request.status = Some(" scheduled ".to_string());
        request.appointment_type = Some("consultation\n".to_string());
        request.notes = Some("  bring x-rays ".to_string());
        request.slot_id = request.slot_id.map(|id| format!(" {} ", id));
        request.start_time = Some(" 09:00 ".to_string());

        let parsed = request.validate().unwrap();

        assert_eq!(parsed.status, " scheduled ");
        assert_eq!(parsed.appointment_type, "consultation\n");
        assert_eq!(parsed.notes.as_deref(), Some("  bring x-rays "));
        assert_eq!(parsed.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }
}
