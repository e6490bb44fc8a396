use std::sync::Arc;

use thiserror::Error;

use crate::{
    notification::{CalendarTrigger, NotificationRequest, NotificationService, NotificationServiceError},
    reminder::{EntityId, ScheduledReminder},
};

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Notification service rejected reminder for entity {entity_id}")]
    Rejected {
        entity_id: EntityId,
        #[source]
        source: NotificationServiceError,
    },
}

/// Registers computed reminders with a [`NotificationService`].
#[derive(Clone)]
pub struct ReminderScheduler {
    notification_service: Arc<dyn NotificationService>,
}

impl ReminderScheduler {
    pub fn new(notification_service: Arc<dyn NotificationService>) -> Self {
        Self {
            notification_service,
        }
    }

    pub async fn schedule(&self, reminder: &ScheduledReminder) -> Result<(), SchedulingError> {
        let entity_id = reminder.source_entity_id;
        let request = NotificationRequest {
            identifier: reminder.identifier(),
            content: reminder.content.clone(),
            trigger: CalendarTrigger::from_instant(&reminder.fire_at),
        };

        match self.notification_service.add(request).await {
            Ok(()) => {
                log::info!(
                    "Reminder scheduled. [entity_id = {}, fire_at = {}]",
                    entity_id,
                    reminder.fire_at
                );
                Ok(())
            }
            Err(source) => {
                log::warn!(
                    "Failed to schedule reminder. error = {}, entity_id = {}",
                    source,
                    entity_id
                );
                Err(SchedulingError::Rejected { entity_id, source })
            }
        }
    }

    pub async fn cancel(&self, entity_id: EntityId) {
        self.notification_service
            .remove_pending(&entity_id.to_string())
            .await;
    }
}
