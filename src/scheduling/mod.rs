mod calculator;
mod scheduler;
mod service;

pub use calculator::{
    DEFAULT_FALLBACK_DELAY, DEFAULT_LEAD_DAYS, DateError, MIN_FALLBACK_DELAY, ReminderTimeCalculator,
    default_fire_time, parse_target_date,
};
pub use scheduler::{ReminderScheduler, SchedulingError};
pub use service::{ReleaseReminderService, ReminderError};
