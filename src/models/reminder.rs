use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOutcome {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}
