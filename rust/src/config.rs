//! Project-level scheduling configuration.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors for configurations the calendar cannot walk.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("hours_per_day must be in (0, 24), got {0}")]
    InvalidHoursPerDay(f64),
    #[error("Invalid day start time {hour:02}:{minute:02}")]
    InvalidDayStart { hour: u32, minute: u32 },
    #[error("Work window of {hours}h starting {start} does not end before midnight")]
    WindowPastMidnight { start: NaiveTime, hours: f64 },
    #[error("Capacity override for {date} is invalid: {hours}h")]
    InvalidOverride { date: NaiveDate, hours: f64 },
}

fn default_hours_per_day() -> f64 {
    8.0
}

fn default_day_start_hour() -> u32 {
    9
}

fn default_skip_weekends() -> bool {
    true
}

/// Scheduling parameters stored alongside the tasks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Earliest moment any task can begin.
    #[serde(with = "crate::timestamp::iso")]
    pub start_date: NaiveDateTime,
    /// Nominal working-day length in hours.
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f64,
    #[serde(default = "default_day_start_hour")]
    pub day_start_hour: u32,
    #[serde(default)]
    pub day_start_minute: u32,
    /// Saturday/Sunday are non-working unless overridden.
    #[serde(default = "default_skip_weekends")]
    pub skip_weekends: bool,
    /// Per-date hours available, replacing `hours_per_day` (weekends included).
    #[serde(default)]
    pub capacity_overrides: BTreeMap<NaiveDate, f64>,
}

impl ProjectConfig {
    /// Config starting at `start_date` with the default 09:00-17:00 weekday window.
    pub fn new(start_date: NaiveDateTime) -> Self {
        Self {
            start_date,
            hours_per_day: default_hours_per_day(),
            day_start_hour: default_day_start_hour(),
            day_start_minute: 0,
            skip_weekends: default_skip_weekends(),
            capacity_overrides: BTreeMap::new(),
        }
    }

    pub fn with_hours_per_day(mut self, hours: f64) -> Self {
        self.hours_per_day = hours;
        self
    }

    pub fn with_day_start(mut self, hour: u32, minute: u32) -> Self {
        self.day_start_hour = hour;
        self.day_start_minute = minute;
        self
    }

    pub fn with_skip_weekends(mut self, skip: bool) -> Self {
        self.skip_weekends = skip;
        self
    }

    pub fn with_override(mut self, date: NaiveDate, hours: f64) -> Self {
        self.capacity_overrides.insert(date, hours);
        self
    }

    /// Clock time each working day begins.
    ///
    /// Falls back to midnight for out-of-range values; `validate` rejects those.
    pub fn day_start_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.day_start_hour, self.day_start_minute, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// Check the config describes a walkable calendar.
    ///
    /// Every working window must end strictly before midnight so each instant
    /// belongs to exactly one day's window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if NaiveTime::from_hms_opt(self.day_start_hour, self.day_start_minute, 0).is_none() {
            return Err(ConfigError::InvalidDayStart {
                hour: self.day_start_hour,
                minute: self.day_start_minute,
            });
        }
        if !(self.hours_per_day > 0.0 && self.hours_per_day < 24.0) {
            return Err(ConfigError::InvalidHoursPerDay(self.hours_per_day));
        }

        let start = self.day_start_time();
        let hours_left_in_day =
            24.0 - (self.day_start_hour as f64 + self.day_start_minute as f64 / 60.0);
        if self.hours_per_day + 1e-9 >= hours_left_in_day {
            return Err(ConfigError::WindowPastMidnight {
                start,
                hours: self.hours_per_day,
            });
        }
        for (&date, &hours) in &self.capacity_overrides {
            if !hours.is_finite() || hours < 0.0 || hours + 1e-9 >= hours_left_in_day {
                return Err(ConfigError::InvalidOverride { date, hours });
            }
        }
        Ok(())
    }
}
