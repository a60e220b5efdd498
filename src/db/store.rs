use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::Connection;

use super::queries;
use crate::models::{Appointment, AppointmentStatus, ConversationContext, DateRange};

/// Persistence seam for appointments and per-phone conversation context.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find_appointments(
        &self,
        range: DateRange,
        statuses: &[AppointmentStatus],
    ) -> anyhow::Result<Vec<Appointment>>;

    async fn create_appointment(&self, appointment: &Appointment) -> anyhow::Result<()>;

    async fn latest_active_appointment(&self, phone: &str) -> anyhow::Result<Option<Appointment>>;

    async fn reschedule_appointment(
        &self,
        id: &str,
        date: NaiveDate,
        time: &str,
    ) -> anyhow::Result<bool>;

    async fn update_status(&self, id: &str, status: AppointmentStatus) -> anyhow::Result<bool>;

    async fn get_context(&self, phone: &str) -> anyhow::Result<Option<ConversationContext>>;

    async fn save_context(&self, phone: &str, context: &ConversationContext)
        -> anyhow::Result<()>;
}

pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    fn conn(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection mutex poisoned"))
    }
}

#[async_trait]
impl AppointmentStore for SqliteStore {
    async fn find_appointments(
        &self,
        range: DateRange,
        statuses: &[AppointmentStatus],
    ) -> anyhow::Result<Vec<Appointment>> {
        let db = self.conn()?;
        queries::find_appointments(&db, &range, statuses)
    }

    async fn create_appointment(&self, appointment: &Appointment) -> anyhow::Result<()> {
        let db = self.conn()?;
        queries::create_appointment(&db, appointment)
    }

    async fn latest_active_appointment(&self, phone: &str) -> anyhow::Result<Option<Appointment>> {
        let db = self.conn()?;
        queries::latest_active_appointment(&db, phone)
    }

    async fn reschedule_appointment(
        &self,
        id: &str,
        date: NaiveDate,
        time: &str,
    ) -> anyhow::Result<bool> {
        let db = self.conn()?;
        queries::reschedule_appointment(&db, id, date, time)
    }

    async fn update_status(&self, id: &str, status: AppointmentStatus) -> anyhow::Result<bool> {
        let db = self.conn()?;
        queries::update_appointment_status(&db, id, status)
    }

    async fn get_context(&self, phone: &str) -> anyhow::Result<Option<ConversationContext>> {
        let db = self.conn()?;
        queries::get_context(&db, phone)
    }

    async fn save_context(
        &self,
        phone: &str,
        context: &ConversationContext,
    ) -> anyhow::Result<()> {
        let db = self.conn()?;
        queries::save_context(&db, phone, context)
    }
}
