pub mod delivery;
pub mod local_center;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeZone, Timelike};
use chrono_tz::Tz;
use thiserror::Error;

use crate::reminder::ReminderContent;

#[derive(Debug, Error)]
pub enum NotificationServiceError {
    #[error("Notifications are not authorized")]
    NotAuthorized,

    #[error("Trigger {0:?} does not resolve to an instant")]
    InvalidTrigger(CalendarTrigger),

    #[error(transparent)]
    Common(#[from] anyhow::Error),
}

/// One-shot trigger expressed as calendar components instead of a delay, so
/// it stays valid across sleep and restarts of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTrigger {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub repeats: bool,
}

impl CalendarTrigger {
    pub fn from_instant(instant: &DateTime<Tz>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
            day: instant.day(),
            hour: instant.hour(),
            minute: instant.minute(),
            second: instant.second(),
            repeats: false,
        }
    }

    pub fn resolve(&self, timezone: Tz) -> Option<DateTime<Tz>> {
        timezone
            .with_ymd_and_hms(
                self.year,
                self.month,
                self.day,
                self.hour,
                self.minute,
                self.second,
            )
            .earliest()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub identifier: String,
    pub content: ReminderContent,
    pub trigger: CalendarTrigger,
}

/// Host facility that delivers notifications at a given time.
///
/// Adding a request under an identifier that already has a pending request
/// replaces it.
#[async_trait]
pub trait NotificationService: Send + Sync + 'static {
    async fn add(&self, request: NotificationRequest) -> Result<(), NotificationServiceError>;

    async fn remove_pending(&self, identifier: &str);
}
