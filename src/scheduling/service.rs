use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::reminder::{EntityId, ReminderContent, ReminderRequest, ScheduledReminder};

use super::{
    calculator::{DateError, ReminderTimeCalculator},
    scheduler::{ReminderScheduler, SchedulingError},
};

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error(transparent)]
    InvalidDateFormat(#[from] DateError),

    #[error(transparent)]
    SchedulingRejected(#[from] SchedulingError),
}

/// Turns release-tracking requests into registered reminders.
pub struct ReleaseReminderService {
    calculator: ReminderTimeCalculator,
    scheduler: ReminderScheduler,
}

impl ReleaseReminderService {
    pub fn new(calculator: ReminderTimeCalculator, scheduler: ReminderScheduler) -> Self {
        Self {
            calculator,
            scheduler,
        }
    }

    pub fn plan(&self, request: &ReminderRequest, now: DateTime<Utc>) -> Result<ScheduledReminder, DateError> {
        let fire_at = self.calculator.compute_for(request, now)?;
        let target_date_raw = request.target_date_raw.as_deref().unwrap_or_default();

        Ok(ScheduledReminder {
            fire_at,
            content: ReminderContent::release(&request.title, target_date_raw.trim()),
            source_entity_id: request.entity_id,
        })
    }

    pub async fn track_release(
        &self,
        request: &ReminderRequest,
        now: DateTime<Utc>,
    ) -> Result<ScheduledReminder, ReminderError> {
        let reminder = self.plan(request, now).inspect_err(|error| {
            log::warn!(
                "Invalid release date, not scheduling. error = {}, entity_id = {}",
                error,
                request.entity_id
            )
        })?;

        self.scheduler.schedule(&reminder).await?;

        Ok(reminder)
    }

    pub async fn untrack_release(&self, entity_id: EntityId) {
        self.scheduler.cancel(entity_id).await;
    }
}
