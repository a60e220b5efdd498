pub mod dispatcher;
pub mod renderer;
pub mod throttle;

pub use dispatcher::ReminderDispatcher;
pub use renderer::{ClinicInfo, ReminderRenderer};
pub use throttle::{FixedInterval, NoDelay, Throttle};
