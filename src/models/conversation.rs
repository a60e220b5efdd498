use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Partial booking state the conversation loop carries between turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub customer_name: Option<String>,
    pub service: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
}

impl ConversationContext {
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.service.is_none()
            && self.date.is_none()
            && self.time.is_none()
    }
}
