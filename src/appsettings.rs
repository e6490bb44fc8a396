use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

use crate::{
    reminder::ReminderRequest,
    scheduling::{DEFAULT_FALLBACK_DELAY, DEFAULT_LEAD_DAYS, ReminderTimeCalculator},
};

#[derive(Deserialize, Debug)]
pub struct ReminderSettings {
    pub lead_days: u64,
    pub fire_time: String,
    pub fallback_delay_secs: u64,
    pub timezone: String,
}

#[derive(Deserialize, Debug)]
pub struct NotificationSettings {
    pub authorized: bool,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub reminder: ReminderSettings,
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub tracked: Vec<ReminderRequest>,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .set_default("reminder.lead_days", DEFAULT_LEAD_DAYS)?
            .set_default("reminder.fire_time", "11:00")?
            .set_default("reminder.fallback_delay_secs", DEFAULT_FALLBACK_DELAY.as_secs())?
            .set_default("reminder.timezone", "UTC")?
            .set_default("notifications.authorized", true)?
            .build()?
            .try_deserialize()
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.reminder
            .timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Message(format!("Unknown timezone {:?}", self.reminder.timezone)))
    }

    pub fn calculator(&self) -> Result<ReminderTimeCalculator, ConfigError> {
        let fire_time = parse_fire_time(&self.reminder.fire_time)?;
        if self.reminder.fallback_delay_secs == 0 {
            return Err(ConfigError::Message(
                "reminder.fallback_delay_secs must be at least 1".to_string(),
            ));
        }

        Ok(ReminderTimeCalculator::new(
            self.reminder.lead_days,
            fire_time,
            Duration::from_secs(self.reminder.fallback_delay_secs),
            self.timezone()?,
        ))
    }
}

fn parse_fire_time(raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ConfigError::Message(format!("Invalid fire time {raw:?}, expected HH:MM[:SS]")))
}
