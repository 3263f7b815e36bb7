use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Calendar weekday label. Wire format uses the capitalized English names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Bit position used by the stored weekday mask.
    pub fn bit(&self) -> i64 {
        1 << (*self as i64)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Weekday {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monday" => Ok(Weekday::Monday),
            "tuesday" => Ok(Weekday::Tuesday),
            "wednesday" => Ok(Weekday::Wednesday),
            "thursday" => Ok(Weekday::Thursday),
            "friday" => Ok(Weekday::Friday),
            "saturday" => Ok(Weekday::Saturday),
            "sunday" => Ok(Weekday::Sunday),
            other => Err(AppError::Validation(format!(
                "'{other}' is not a valid weekday"
            ))),
        }
    }
}

/// Bitmask over a set of weekdays, stored alongside each schedule record so
/// the overlap predicate can run in SQL.
pub fn weekday_mask(days: &[Weekday]) -> i64 {
    days.iter().fold(0, |mask, day| mask | day.bit())
}

/// Inclusive date-window overlap: `[a_start, a_end]` touches `[b_start, b_end]`
/// when they share at least one calendar day.
pub fn windows_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

fn default_vacant() -> bool {
    true
}

/// One bookable interval within a day. Times are wall-clock "HH:MM" strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub booked_by: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default = "default_vacant")]
    pub vacant: bool,
}

impl TimeSlot {
    pub fn validate(&self) -> Result<(), AppError> {
        let start = parse_wall_clock(&self.start_time)?;
        let end = parse_wall_clock(&self.end_time)?;
        if start >= end {
            return Err(AppError::Validation(format!(
                "slot start time {} must precede end time {}",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }
}

fn parse_wall_clock(s: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| AppError::Validation(format!("'{s}' is not a valid HH:MM time")))
}

/// The slots assigned to one weekday. Slot order is the caller's insertion
/// order and is preserved end to end, never sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day: Weekday,
    pub time_slots: Vec<TimeSlot>,
}

/// A weekly template valid over a bounded date range, scoped to one lab.
/// Records are insert-only; once persisted the template never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabSchedule {
    pub id: String,
    pub lab_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weekly_schedule: Vec<DaySchedule>,
    pub created_at: String,
}

impl LabSchedule {
    /// True when `date` lies inside the active window, bounds included.
    pub fn window_contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn day_schedule(&self, day: Weekday) -> Option<&DaySchedule> {
        self.weekly_schedule.iter().find(|d| d.day == day)
    }

    pub fn weekdays(&self) -> Vec<Weekday> {
        self.weekly_schedule.iter().map(|d| d.day).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewScheduleRequest {
    pub lab_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weekly_schedule: Vec<DaySchedule>,
}

impl NewScheduleRequest {
    /// Construction-time invariants. An empty weekly schedule is accepted;
    /// it can never conflict and resolves no day.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.lab_name.trim().is_empty() {
            return Err(AppError::Validation("lab_name must not be empty".into()));
        }
        if self.start_date > self.end_date {
            return Err(AppError::Validation(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            )));
        }
        let mut seen: i64 = 0;
        for day_schedule in &self.weekly_schedule {
            let bit = day_schedule.day.bit();
            if seen & bit != 0 {
                return Err(AppError::Validation(format!(
                    "duplicate weekday entry: {}",
                    day_schedule.day
                )));
            }
            seen |= bit;
            for slot in &day_schedule.time_slots {
                slot.validate()?;
            }
        }
        Ok(())
    }

    pub fn weekdays(&self) -> Vec<Weekday> {
        self.weekly_schedule.iter().map(|d| d.day).collect()
    }
}
