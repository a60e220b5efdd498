pub mod appointment;
pub mod command;
pub mod conversation;
pub mod reminder;
pub mod time_of_day;

pub use appointment::{Appointment, AppointmentStatus, DateRange};
pub use command::BookingCommand;
pub use conversation::ConversationContext;
pub use reminder::ReminderOutcome;
pub use time_of_day::TimeOfDay;
