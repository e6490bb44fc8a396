use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;

pub type EntityId = i64;

const RELEASE_REMINDER_TITLE: &str = "Upcoming Release Reminder";

/// A caller's wish to be reminded about an entity's release.
///
/// Built on demand and never persisted. Deserializes from the upstream movie
/// record shape (`id`, `title`, `release_date`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReminderRequest {
    #[serde(alias = "id")]
    pub entity_id: EntityId,
    pub title: String,
    #[serde(alias = "release_date", default)]
    pub target_date_raw: Option<String>,
}

impl ReminderRequest {
    pub fn new(entity_id: EntityId, title: impl Into<String>, target_date_raw: Option<&str>) -> Self {
        Self {
            entity_id,
            title: title.into(),
            target_date_raw: target_date_raw.map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderContent {
    pub title: String,
    pub body: String,
}

impl ReminderContent {
    pub fn release(entity_title: &str, target_date_raw: &str) -> Self {
        Self {
            title: RELEASE_REMINDER_TITLE.to_string(),
            body: format!("The movie \"{entity_title}\" releases on {target_date_raw}. Get ready!"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub fire_at: DateTime<Tz>,
    pub content: ReminderContent,
    pub source_entity_id: EntityId,
}

impl ScheduledReminder {
    /// Identifier the notification is registered under. Scheduling again with
    /// the same identifier replaces the pending one.
    pub fn identifier(&self) -> String {
        self.source_entity_id.to_string()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReminderState {
    Unscheduled,
    Pending,
    Delivered,
}
