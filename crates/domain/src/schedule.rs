//! Weekly schedule: when the rack is powered on and off.
//!
//! Two rules drive the rack:
//!
//! | Rule | Days | Time |
//! |------|------|------|
//! | power-off | every day | evening trigger (e.g. `18:00`) |
//! | power-on | workdays | morning trigger (e.g. `08:30`) |
//!
//! Days outside the workday set are *rest days*: the rack is expected to be
//! off for the whole day, not only from the evening trigger on.
//!
//! Triggers match on hour and minute, so a rule stays "due" for the whole
//! trigger minute. Deduplication is the job of the rack state, not of the
//! schedule.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::rack::PowerAction;

/// Set of days of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct DaySet(u8);

impl DaySet {
    /// Every day of the week.
    pub const ALL: Self = Self(0b111_1111);

    /// Monday to Friday.
    pub const WORKWEEK: Self = Self(0b001_1111);

    /// No day at all.
    #[must_use]
    pub fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    #[must_use]
    pub fn with(self, day: Weekday) -> Self {
        Self(self.0 | Self::bit(day))
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Days of the week not in this set.
    #[must_use]
    pub fn complement(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }

    /// Days in this set, Monday first.
    pub fn days(self) -> impl Iterator<Item = Weekday> {
        ALL_DAYS.into_iter().filter(move |day| self.contains(*day))
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }
}

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl From<Vec<Weekday>> for DaySet {
    fn from(days: Vec<Weekday>) -> Self {
        days.into_iter().collect()
    }
}

impl From<DaySet> for Vec<Weekday> {
    fn from(set: DaySet) -> Self {
        set.days().collect()
    }
}

/// A day-of-week set plus a time-of-day trigger and the action it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleRule {
    pub days: DaySet,
    pub at: NaiveTime,
    pub action: PowerAction,
}

impl ScheduleRule {
    /// Whether `now` falls on one of the rule's days, inside the trigger minute.
    #[must_use]
    pub fn matches(&self, now: NaiveDateTime) -> bool {
        self.days.contains(now.weekday())
            && now.hour() == self.at.hour()
            && now.minute() == self.at.minute()
    }
}

/// The rack's weekly power schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    power_on: ScheduleRule,
    power_off: ScheduleRule,
    rest_days: DaySet,
}

impl WeeklySchedule {
    /// Build the schedule from the morning and evening triggers and the set
    /// of workdays.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyWorkdays`] when `workdays` is empty:
    /// the rack would never be powered on.
    pub fn new(
        power_on_at: NaiveTime,
        power_off_at: NaiveTime,
        workdays: DaySet,
    ) -> Result<Self, ValidationError> {
        if workdays.is_empty() {
            return Err(ValidationError::EmptyWorkdays);
        }
        Ok(Self {
            power_on: ScheduleRule {
                days: workdays,
                at: power_on_at,
                action: PowerAction::PowerOn,
            },
            power_off: ScheduleRule {
                days: DaySet::ALL,
                at: power_off_at,
                action: PowerAction::PowerOff,
            },
            rest_days: workdays.complement(),
        })
    }

    #[must_use]
    pub fn power_on_rule(&self) -> &ScheduleRule {
        &self.power_on
    }

    #[must_use]
    pub fn power_off_rule(&self) -> &ScheduleRule {
        &self.power_off
    }

    #[must_use]
    pub fn rest_days(&self) -> DaySet {
        self.rest_days
    }

    #[must_use]
    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        self.rest_days.contains(date.weekday())
    }

    /// The evening power-off trigger is inside its minute.
    #[must_use]
    pub fn power_off_due(&self, now: NaiveDateTime) -> bool {
        self.power_off.matches(now)
    }

    /// The morning power-on trigger is inside its minute on a workday.
    #[must_use]
    pub fn power_on_due(&self, now: NaiveDateTime) -> bool {
        self.power_on.matches(now)
    }
}
