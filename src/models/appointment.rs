use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub service: String,
    pub date: NaiveDate,
    /// `HH:MM` as booked; older rows may predate the current slot set.
    pub time: String,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Statuses that still hold a slot and receive reminders.
    pub const ACTIVE: [AppointmentStatus; 2] =
        [AppointmentStatus::Pending, AppointmentStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "CONFIRMED" => AppointmentStatus::Confirmed,
            "CANCELLED" => AppointmentStatus::Cancelled,
            "COMPLETED" => AppointmentStatus::Completed,
            "PENDING" => AppointmentStatus::Pending,
            other => {
                tracing::warn!(status = other, "unknown appointment status, reading as pending");
                AppointmentStatus::Pending
            }
        }
    }
}

/// Half-open range of calendar days: `start <= date < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}
