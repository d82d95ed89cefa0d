use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, BookingKey, StorageError, TimeSlot};
use crate::services::appointments::AppointmentRepository;
use crate::services::slots::SlotRepository;

/// Process-local slot and appointment store. Appointments are keyed by `BookingKey`, and the
/// insert takes the write lock for both the check and the write.
#[derive(Default)]
pub struct InMemoryBookingStore {
    slots: RwLock<HashMap<Uuid, TimeSlot>>,
    appointments: RwLock<HashMap<BookingKey, Appointment>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_slots(slots: impl IntoIterator<Item = TimeSlot>) -> Self {
        let store = Self::new();
        for slot in slots {
            store.put_slot(slot).await;
        }
        store
    }

    pub async fn put_slot(&self, slot: TimeSlot) {
        let mut slots = self.slots.write().await;
        debug!("Storing slot {} for doctor {}", slot.slot_id, slot.doctor_id);
        slots.insert(slot.slot_id, slot);
    }

    pub async fn set_slot_availability(&self, slot_id: Uuid, is_available: bool) -> bool {
        let mut slots = self.slots.write().await;
        match slots.get_mut(&slot_id) {
            Some(slot) => {
                slot.is_available = is_available;
                true
            }
            None => false,
        }
    }

    pub async fn appointment_count(&self) -> usize {
        self.appointments.read().await.len()
    }

    pub async fn get_appointment(&self, key: &BookingKey) -> Option<Appointment> {
        self.appointments.read().await.get(key).cloned()
    }
}

#[async_trait]
impl SlotRepository for InMemoryBookingStore {
    async fn find_bookable_slot(
        &self,
        slot_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Option<TimeSlot>, StorageError> {
        let slots = self.slots.read().await;
        Ok(slots
            .get(&slot_id)
            .filter(|slot| slot.doctor_id == doctor_id && slot.is_available)
            .cloned())
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryBookingStore {
    async fn exists(&self, key: &BookingKey) -> Result<bool, StorageError> {
        Ok(self.appointments.read().await.contains_key(key))
    }

    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, StorageError> {
        let mut appointments = self.appointments.write().await;
        match appointments.entry(appointment.booking_key()) {
            Entry::Occupied(_) => Err(StorageError::UniqueViolation),
            Entry::Vacant(slot) => {
                slot.insert(appointment.clone());
                Ok(appointment.clone())
            }
        }
    }

    async fn list_for_doctor_on(
        &self,
        doctor_id: Uuid,
        appointment_date: NaiveDate,
    ) -> Result<Vec<Appointment>, StorageError> {
        let appointments = self.appointments.read().await;
        let mut matching: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.doctor_id == doctor_id && a.appointment_date == appointment_date)
            .cloned()
            .collect();
        matching.sort_by_key(|a| (a.start_time, a.created_at));
        Ok(matching)
    }
}
