// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, BookAppointmentRequest, BookingEvent, NewAppointment,
    StorageError,
};
use crate::services::appointments::{AppointmentRepository, SupabaseAppointmentRepository};
use crate::services::conflict::ConflictDetectionService;
use crate::services::memory::InMemoryBookingStore;
use crate::services::notification::NotificationSink;
use crate::services::slots::{SlotRepository, SupabaseSlotRepository};
use crate::services::weekday::resolve_weekday;

const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(2);

pub struct AppointmentBookingService {
    slots: Arc<dyn SlotRepository>,
    appointments: Arc<dyn AppointmentRepository>,
    conflict_service: ConflictDetectionService,
    notifier: Arc<dyn NotificationSink>,
    notification_timeout: Duration,
}

impl AppointmentBookingService {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        appointments: Arc<dyn AppointmentRepository>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let conflict_service = ConflictDetectionService::new(Arc::clone(&appointments));

        Self {
            slots,
            appointments,
            conflict_service,
            notifier,
            notification_timeout: DEFAULT_NOTIFICATION_TIMEOUT,
        }
    }

    pub fn with_notification_timeout(mut self, timeout: Duration) -> Self {
        self.notification_timeout = timeout;
        self
    }

    /// Both repositories backed by Supabase/PostgREST.
    pub fn with_supabase(config: &AppConfig, notifier: Arc<dyn NotificationSink>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self::new(
            Arc::new(SupabaseSlotRepository::new(Arc::clone(&supabase))),
            Arc::new(SupabaseAppointmentRepository::new(supabase)),
            notifier,
        )
        .with_notification_timeout(Duration::from_millis(config.notification_timeout_ms))
    }

    /// Both repositories backed by one process-local store.
    pub fn with_memory_store(
        store: Arc<InMemoryBookingStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::new(store.clone(), store, notifier)
    }

    /// Book an appointment against a doctor's slot.
    ///
    /// Validation steps short-circuit in order: request fields, slot ownership and
    /// availability, weekday, existing booking. The insert itself is the authoritative
    /// conflict check; a uniqueness rejection from storage is reported as `BookingConflict`.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let new_appointment = request.validate().map_err(|e| {
            debug!("Rejected booking request: {}", e);
            e
        })?;

        self.book_validated(new_appointment).await
    }

    pub async fn book_validated(
        &self,
        request: NewAppointment,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking slot {} with doctor {} on {} for patient {}",
              request.slot_id, request.doctor_id, request.appointment_date, request.patient_id);

        // **Step 1: Resolve weekday**
        let weekday = resolve_weekday(request.appointment_date);

        // **Step 2: Fetch slot scoped to doctor**
        let slot = self
            .slots
            .find_bookable_slot(request.slot_id, request.doctor_id)
            .await
            .map_err(|e| internal_error("slot lookup", e))?
            .ok_or_else(|| {
                warn!("Slot {} not bookable for doctor {}", request.slot_id, request.doctor_id);
                AppointmentError::SlotUnavailable
            })?;

        // **Step 3: Weekday must be offered**
        if !slot.offers(weekday) {
            warn!("Slot {} does not run on {}", slot.slot_id, weekday);
            return Err(AppointmentError::SlotNotOfferedOnDay { weekday });
        }

        // **Step 4: Existing booking**
        let has_conflict = self
            .conflict_service
            .has_conflict(request.doctor_id, request.appointment_date, request.slot_id)
            .await
            .map_err(|e| internal_error("conflict check", e))?;

        if has_conflict {
            return Err(AppointmentError::BookingConflict);
        }

        // **Step 5: Conditional insert**
        let key = request.booking_key();
        let appointment = request.into_appointment(Uuid::new_v4(), Utc::now());

        let created = match self.appointments.insert(&appointment).await {
            Ok(created) => created,
            Err(StorageError::UniqueViolation) => {
                warn!("Concurrent booking won the race for {}", key);
                return Err(AppointmentError::BookingConflict);
            }
            Err(e) => return Err(internal_error("appointment insert", e)),
        };

        info!("Appointment {} booked for {}", created.appointment_id, key);

        // **Step 6: Notify staff, detached from the booking outcome**
        self.dispatch_booking_created(&created);

        Ok(created)
    }

    pub async fn list_doctor_appointments_on(
        &self,
        doctor_id: Uuid,
        appointment_date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments for doctor {} on {}", doctor_id, appointment_date);

        self.appointments
            .list_for_doctor_on(doctor_id, appointment_date)
            .await
            .map_err(|e| internal_error("appointment listing", e))
    }

    fn dispatch_booking_created(&self, appointment: &Appointment) {
        let event = BookingEvent::booking_created(appointment);
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.notification_timeout;

        tokio::spawn(async move {
            let appointment_id = event.appointment_id;
            match tokio::time::timeout(timeout, notifier.publish(event)).await {
                Ok(Ok(())) => debug!("Staff notified about appointment {}", appointment_id),
                Ok(Err(e)) => warn!("Failed to notify staff about appointment {}: {}", appointment_id, e),
                Err(_) => warn!("Staff notification for appointment {} timed out after {:?}",
                                appointment_id, timeout),
            }
        });
    }
}

fn internal_error(operation: &str, e: StorageError) -> AppointmentError {
    error!("Booking {} failed: {}", operation, e);
    AppointmentError::Internal
}
