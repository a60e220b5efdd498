use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::AppointmentStore;
use crate::services::extraction::CommandExtractor;
use crate::services::reminder::ReminderDispatcher;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn AppointmentStore>,
    pub extractor: CommandExtractor,
    pub reminders: ReminderDispatcher,
}
