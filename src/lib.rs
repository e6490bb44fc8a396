pub mod appsettings;
pub mod notification;
pub mod reminder;
pub mod scheduling;

pub use notification::{
    CalendarTrigger, NotificationRequest, NotificationService, NotificationServiceError,
};
pub use reminder::{EntityId, ReminderContent, ReminderRequest, ReminderState, ScheduledReminder};
