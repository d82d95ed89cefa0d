use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{BookingKey, StorageError};
use crate::services::appointments::AppointmentRepository;

/// Detects whether a doctor/slot/date triple is already booked.
///
/// This is an equality check on the composite key, not an interval-overlap check: two
/// appointments on different slots never conflict, even when their times overlap.
pub struct ConflictDetectionService {
    appointments: Arc<dyn AppointmentRepository>,
}

impl ConflictDetectionService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    pub async fn has_conflict(
        &self,
        doctor_id: Uuid,
        appointment_date: NaiveDate,
        slot_id: Uuid,
    ) -> Result<bool, StorageError> {
        let key = BookingKey {
            doctor_id,
            slot_id,
            appointment_date,
        };
        debug!("Checking conflicts for {}", key);

        let taken = self.appointments.exists(&key).await?;
        if taken {
            warn!("Conflict detected for {}", key);
        }

        Ok(taken)
    }
}
