use std::time::Duration;

use chrono::{
    DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use thiserror::Error;

use crate::reminder::ReminderRequest;

pub const DEFAULT_LEAD_DAYS: u64 = 14;
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_secs(5);
pub const MIN_FALLBACK_DELAY: Duration = Duration::from_secs(1);

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("No target date given")]
    Missing,

    #[error("Date is not in YYYY-MM-DD format: {0:?}")]
    InvalidFormat(String),

    #[error("Reminder date for {0} is out of the supported range")]
    OutOfRange(NaiveDate),
}

pub fn default_fire_time() -> NaiveTime {
    NaiveTime::from_hms_opt(11, 0, 0).expect("11:00:00 is a valid time.")
}

/// Computes when a release reminder should fire.
///
/// The reminder goes off `lead` days before the target date at `fire_time`
/// in `timezone`. When that moment is not in the future any more, it goes off
/// `fallback_delay` after `now` instead. The fallback delay is at least
/// [`MIN_FALLBACK_DELAY`], so the result is always later than `now`.
#[derive(Debug, Clone)]
pub struct ReminderTimeCalculator {
    lead: Days,
    fire_time: NaiveTime,
    fallback_delay: TimeDelta,
    timezone: Tz,
}

impl Default for ReminderTimeCalculator {
    fn default() -> Self {
        Self::new(
            DEFAULT_LEAD_DAYS,
            default_fire_time(),
            DEFAULT_FALLBACK_DELAY,
            Tz::UTC,
        )
    }
}

impl ReminderTimeCalculator {
    pub fn new(lead_days: u64, fire_time: NaiveTime, fallback_delay: Duration, timezone: Tz) -> Self {
        let fire_time = fire_time.with_nanosecond(0).expect("Will never fail.");
        let fallback_delay =
            TimeDelta::from_std(fallback_delay.max(MIN_FALLBACK_DELAY)).unwrap_or(TimeDelta::MAX);

        Self {
            lead: Days::new(lead_days),
            fire_time,
            fallback_delay,
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn compute(&self, target_date_raw: &str, now: DateTime<Utc>) -> Result<DateTime<Tz>, DateError> {
        let target_date = parse_target_date(target_date_raw)?;
        let candidate = self.candidate(target_date)?;

        if candidate > now {
            return Ok(candidate);
        }

        log::info!(
            "Lead window for {} has passed, falling back to an immediate reminder",
            target_date
        );

        let fallback = now
            .checked_add_signed(self.fallback_delay)
            .ok_or(DateError::OutOfRange(target_date))?
            .with_nanosecond(0)
            .expect("Will never fail.");

        Ok(fallback.with_timezone(&self.timezone))
    }

    pub fn compute_for(&self, request: &ReminderRequest, now: DateTime<Utc>) -> Result<DateTime<Tz>, DateError> {
        let raw = request.target_date_raw.as_deref().ok_or(DateError::Missing)?;
        self.compute(raw, now)
    }

    fn candidate(&self, target_date: NaiveDate) -> Result<DateTime<Tz>, DateError> {
        let reminder_date = target_date
            .checked_sub_days(self.lead)
            .ok_or(DateError::OutOfRange(target_date))?;

        let local = reminder_date.and_time(self.fire_time);
        match self.timezone.from_local_datetime(&local).earliest() {
            Some(candidate) => Ok(candidate),
            None => self
                .resolve_in_gap(local)
                .ok_or(DateError::OutOfRange(target_date)),
        }
    }

    /// Maps a local time skipped by a clock change forward by the length of
    /// the gap, using the offset in effect the day before.
    fn resolve_in_gap(&self, local: NaiveDateTime) -> Option<DateTime<Tz>> {
        let day_before = local.checked_sub_signed(TimeDelta::days(1))?;
        let offset = self.timezone.offset_from_utc_datetime(&day_before).fix();
        let utc = local.checked_sub_signed(TimeDelta::seconds(offset.local_minus_utc().into()))?;

        Some(self.timezone.from_utc_datetime(&utc))
    }
}

/// Parses a strict `YYYY-MM-DD` date, independent of any locale.
pub fn parse_target_date(raw: &str) -> Result<NaiveDate, DateError> {
    let trimmed = raw.trim();
    if !has_date_shape(trimmed) {
        return Err(DateError::InvalidFormat(raw.to_string()));
    }

    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| DateError::InvalidFormat(raw.to_string()))
}

fn has_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDateTime, Timelike};
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;

    use super::*;

    fn utc(date: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S")
            .unwrap()
            .and_utc()
    }

    #[test]
    fn reminder_lands_two_weeks_before_release_at_eleven() {
        let calculator = ReminderTimeCalculator::default();

        let fire_at = calculator
            .compute("2025-12-18", utc("2025-11-01T00:00:00"))
            .unwrap();

        assert_eq!(fire_at.naive_local(), utc("2025-12-04T11:00:00").naive_utc());
    }

    #[test]
    fn reminder_inside_lead_window_falls_back_to_near_term() {
        let calculator = ReminderTimeCalculator::default();
        let now = utc("2025-12-10T09:00:00");

        let fire_at = calculator.compute("2025-12-18", now).unwrap();

        assert!(fire_at > now);
        assert!(fire_at <= utc("2025-12-10T09:00:05"));
    }

    #[test]
    fn past_release_still_gets_an_immediate_reminder() {
        let calculator = ReminderTimeCalculator::default();
        let now = utc("2025-12-10T09:00:00");

        let fire_at = calculator.compute("1999-01-01", now).unwrap();

        assert_eq!(fire_at, now + TimeDelta::seconds(5));
    }

    #[test]
    fn fire_time_is_local_to_the_configured_timezone() {
        let calculator = ReminderTimeCalculator::new(
            DEFAULT_LEAD_DAYS,
            default_fire_time(),
            DEFAULT_FALLBACK_DELAY,
            chrono_tz::America::New_York,
        );

        let fire_at = calculator
            .compute("2025-12-18", utc("2025-11-01T00:00:00"))
            .unwrap();

        assert_eq!(fire_at.hour(), 11);
        assert_eq!(fire_at.with_timezone(&Utc), utc("2025-12-04T16:00:00"));
    }

    #[test]
    fn custom_lead_and_fire_time_are_respected() {
        let calculator = ReminderTimeCalculator::new(
            3,
            NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            Duration::from_secs(60),
            Tz::UTC,
        );

        let fire_at = calculator
            .compute("2025-12-18", utc("2025-11-01T00:00:00"))
            .unwrap();

        assert_eq!(fire_at.naive_local(), utc("2025-12-15T08:30:00").naive_utc());
    }

    #[test]
    fn zero_fallback_delay_still_fires_after_now() {
        let calculator =
            ReminderTimeCalculator::new(DEFAULT_LEAD_DAYS, default_fire_time(), Duration::ZERO, Tz::UTC);
        let now = utc("2025-12-10T09:00:00") + TimeDelta::milliseconds(300);

        let fire_at = calculator.compute("2025-12-18", now).unwrap();

        assert!(fire_at > now, "fire_at = {fire_at:?}, now = {now:?}");
        assert_eq!(fire_at, utc("2025-12-10T09:00:01"));
    }

    #[test]
    fn fire_time_inside_dst_gap_moves_past_the_gap() {
        let calculator = ReminderTimeCalculator::new(
            DEFAULT_LEAD_DAYS,
            NaiveTime::from_hms_opt(2, 30, 0).unwrap(),
            DEFAULT_FALLBACK_DELAY,
            chrono_tz::Europe::Berlin,
        );

        let fire_at = calculator
            .compute("2025-04-13", utc("2025-01-01T00:00:00"))
            .unwrap();

        assert_eq!(fire_at.with_timezone(&Utc), utc("2025-03-30T01:30:00"));
        assert_eq!(fire_at.hour(), 3);
        assert_eq!(fire_at.minute(), 30);
    }

    #[test]
    fn invalid_dates_are_rejected() {
        let calculator = ReminderTimeCalculator::default();
        let now = utc("2025-11-01T00:00:00");

        for raw in ["", "not-a-date", "2025-13-01", "2025-02-30", "2025-1-05", "18/12/2025", "2025-12-18T00:00:00Z", "+2025-12-18"] {
            assert_eq!(
                calculator.compute(raw, now),
                Err(DateError::InvalidFormat(raw.to_string())),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            parse_target_date(" 2025-12-18\n"),
            Ok(NaiveDate::from_ymd_opt(2025, 12, 18).unwrap())
        );
    }

    #[test]
    fn missing_date_fails_the_request() {
        let calculator = ReminderTimeCalculator::default();
        let request = ReminderRequest::new(1, "Mufasa", None);

        let result = calculator.compute_for(&request, utc("2025-11-01T00:00:00"));

        assert_eq!(result, Err(DateError::Missing));
    }

    #[test]
    fn earliest_date_is_out_of_range() {
        let calculator = ReminderTimeCalculator::default();
        let raw = NaiveDate::MIN.format(DATE_FORMAT).to_string();

        // chrono's minimum year does not fit four digits, so the shape check wins.
        assert!(calculator.compute(&raw, utc("2025-11-01T00:00:00")).is_err());
        assert_eq!(
            calculator.candidate(NaiveDate::MIN),
            Err(DateError::OutOfRange(NaiveDate::MIN))
        );
    }

    fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (1900i32..2200, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    proptest! {
        #[test]
        fn fire_at_is_always_in_the_future(
            target in date_strategy(),
            now in arb::<NaiveDateTime>()
        ) {
            let calculator = ReminderTimeCalculator::default();
            let raw = target.format(DATE_FORMAT).to_string();
            let now = now.with_nanosecond(0).unwrap().and_utc();
            prop_assume!(now.checked_add_signed(TimeDelta::seconds(10)).is_some());

            let fire_at = calculator.compute(&raw, now).unwrap();

            prop_assert!(fire_at > now, "fire_at = {:?}, now = {:?}", fire_at, now);
        }

        #[test]
        fn fire_at_follows_lead_window(
            target in date_strategy(),
            now in date_strategy(),
            seconds in 0u32..86_400
        ) {
            let calculator = ReminderTimeCalculator::default();
            let raw = target.format(DATE_FORMAT).to_string();
            let now = now
                .and_time(NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap())
                .and_utc();
            let candidate = (target - Days::new(14)).and_time(default_fire_time()).and_utc();

            let fire_at = calculator.compute(&raw, now).unwrap();

            if candidate > now {
                prop_assert_eq!(fire_at, candidate);
            } else {
                prop_assert!(fire_at > now);
                prop_assert!(fire_at <= now + TimeDelta::seconds(5));
            }
        }

        #[test]
        fn computation_is_idempotent(
            target in date_strategy(),
            now in date_strategy()
        ) {
            let calculator = ReminderTimeCalculator::default();
            let raw = target.format(DATE_FORMAT).to_string();
            let now = now.and_hms_opt(12, 0, 0).unwrap().and_utc();

            prop_assert_eq!(calculator.compute(&raw, now), calculator.compute(&raw, now));
        }

        #[test]
        fn garbage_never_parses(raw in "[a-zA-Z /.]{0,12}") {
            let calculator = ReminderTimeCalculator::default();

            prop_assert_eq!(
                calculator.compute(&raw, Utc::now()),
                Err(DateError::InvalidFormat(raw.clone()))
            );
        }
    }
}
