#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use appointment_cell::*;

pub const MONDAY: &str = "2024-01-01";
pub const TUESDAY: &str = "2024-01-02";
pub const WEDNESDAY: &str = "2024-01-03";
pub const NEXT_MONDAY: &str = "2024-01-08";

/// Forwards every published event to a channel the test can read.
pub struct RecordingSink {
    sender: mpsc::UnboundedSender<BookingEvent>,
}

impl RecordingSink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<BookingEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { sender }), receiver)
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn publish(&self, event: BookingEvent) -> Result<(), NotificationError> {
        self.sender
            .send(event)
            .map_err(|e| NotificationError::Delivery(e.to_string()))
    }
}

pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn publish(&self, _event: BookingEvent) -> Result<(), NotificationError> {
        Err(NotificationError::Delivery("push gateway unreachable".to_string()))
    }
}

/// Never finishes within any reasonable test timeout.
pub struct StalledSink;

#[async_trait]
impl NotificationSink for StalledSink {
    async fn publish(&self, _event: BookingEvent) -> Result<(), NotificationError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

pub fn slot(doctor_id: Uuid, days: &[DayOfWeek], is_available: bool) -> TimeSlot {
    TimeSlot {
        slot_id: Uuid::new_v4(),
        doctor_id,
        is_available,
        available_days: AvailableDays::new(days.iter().copied()).expect("slot needs at least one weekday"),
    }
}

pub fn request(doctor_id: Uuid, slot_id: Uuid, appointment_date: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id: Some(doctor_id.to_string()),
        patient_id: Some(Uuid::new_v4().to_string()),
        appointment_date: Some(appointment_date.to_string()),
        start_time: Some("09:00".to_string()),
        end_time: Some("09:30".to_string()),
        status: Some("scheduled".to_string()),
        appointment_type: Some("consultation".to_string()),
        notes: Some("first visit".to_string()),
        slot_id: Some(slot_id.to_string()),
    }
}

pub struct Fixture {
    pub doctor_id: Uuid,
    pub slot: TimeSlot,
    pub store: Arc<InMemoryBookingStore>,
}

/// Doctor D with slot S running Monday and Wednesday.
pub async fn monday_wednesday_fixture() -> Fixture {
    let doctor_id = Uuid::new_v4();
    let slot = slot(doctor_id, &[DayOfWeek::Monday, DayOfWeek::Wednesday], true);
    let store = Arc::new(InMemoryBookingStore::with_slots([slot.clone()]).await);

    Fixture { doctor_id, slot, store }
}

pub fn memory_service(store: &Arc<InMemoryBookingStore>, sink: Arc<dyn NotificationSink>) -> AppointmentBookingService {
    AppointmentBookingService::with_memory_store(Arc::clone(store), sink)
        .with_notification_timeout(Duration::from_millis(200))
}
