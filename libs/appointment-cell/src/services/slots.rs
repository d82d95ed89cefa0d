use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{StorageError, TimeSlot};

/// Read access to doctor-defined slots.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Returns the slot only when it exists, belongs to `doctor_id` and is flagged available.
    /// The three "no" cases are deliberately indistinguishable.
    async fn find_bookable_slot(
        &self,
        slot_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Option<TimeSlot>, StorageError>;
}

pub struct SupabaseSlotRepository {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseSlotRepository {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl SlotRepository for SupabaseSlotRepository {
    async fn find_bookable_slot(
        &self,
        slot_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Option<TimeSlot>, StorageError> {
        let path = format!(
            "/rest/v1/time_slots?slot_id=eq.{}&doctor_id=eq.{}&is_available=eq.true&limit=1",
            slot_id, doctor_id
        );

        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let Some(row) = result.into_iter().next() else {
            debug!("No bookable slot {} for doctor {}", slot_id, doctor_id);
            return Ok(None);
        };

        let slot: TimeSlot = serde_json::from_value(row)
            .map_err(|e| StorageError::Decode(format!("Failed to parse time slot: {}", e)))?;

        // PostgREST already filtered; re-check so a loose row never leaks through.
        if slot.doctor_id != doctor_id || !slot.is_available {
            return Ok(None);
        }

        Ok(Some(slot))
    }
}
