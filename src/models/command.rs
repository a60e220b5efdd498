use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::TimeOfDay;

/// A booking instruction recovered from an assistant sign-off block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingCommand {
    Create {
        customer_name: String,
        service: String,
        date: NaiveDate,
        time: TimeOfDay,
    },
    Reschedule {
        new_date: NaiveDate,
        new_time: TimeOfDay,
    },
    Cancel,
    /// The text carried no actionable block; the conversation just goes on.
    NoCommand,
}

impl BookingCommand {
    pub fn is_actionable(&self) -> bool {
        !matches!(self, BookingCommand::NoCommand)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BookingCommand::Create { .. } => "create",
            BookingCommand::Reschedule { .. } => "reschedule",
            BookingCommand::Cancel => "cancel",
            BookingCommand::NoCommand => "no_command",
        }
    }
}
