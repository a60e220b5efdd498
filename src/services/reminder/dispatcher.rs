use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDateTime;

use super::renderer::ReminderRenderer;
use super::throttle::Throttle;
use crate::db::AppointmentStore;
use crate::models::{AppointmentStatus, DateRange, ReminderOutcome};
use crate::services::messaging::MessagingProvider;

/// Sends the day-before reminders for every active appointment.
///
/// Runs are sequential and keep no record of what was sent: calling
/// [`ReminderDispatcher::dispatch`] twice for the same day reminds everyone
/// twice. The trigger is expected to fire once a day.
pub struct ReminderDispatcher {
    store: Arc<dyn AppointmentStore>,
    messaging: Arc<dyn MessagingProvider>,
    renderer: ReminderRenderer,
    throttle: Arc<dyn Throttle>,
}

impl ReminderDispatcher {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        messaging: Arc<dyn MessagingProvider>,
        renderer: ReminderRenderer,
        throttle: Arc<dyn Throttle>,
    ) -> Self {
        Self {
            store,
            messaging,
            renderer,
            throttle,
        }
    }

    /// Only a store failure aborts the run; individual send failures are
    /// counted and the batch moves on.
    pub async fn dispatch(&self, now: NaiveDateTime) -> anyhow::Result<ReminderOutcome> {
        let window = tomorrow(now)?;

        let appointments = self
            .store
            .find_appointments(window, &AppointmentStatus::ACTIVE)
            .await
            .context("failed to load tomorrow's appointments")?;

        let total = appointments.len();
        tracing::info!(date = %window.start, total, "dispatching appointment reminders");

        let mut outcome = ReminderOutcome {
            total,
            ..Default::default()
        };

        for (i, appointment) in appointments.iter().enumerate() {
            let message = self.renderer.render(appointment);

            match self
                .messaging
                .send_message(&appointment.customer_phone, &message)
                .await
            {
                Ok(()) => {
                    outcome.success += 1;
                    tracing::info!(
                        appointment = %appointment.id,
                        phone = %appointment.customer_phone,
                        "reminder sent"
                    );
                }
                Err(e) => {
                    outcome.failed += 1;
                    tracing::error!(
                        error = %e,
                        appointment = %appointment.id,
                        phone = %appointment.customer_phone,
                        "failed to send reminder"
                    );
                }
            }

            if i + 1 < total {
                self.throttle.pause().await;
            }
        }

        tracing::info!(
            success = outcome.success,
            failed = outcome.failed,
            total = outcome.total,
            "reminder run finished"
        );

        Ok(outcome)
    }
}

/// `[start of tomorrow, start of the day after)` relative to `now`.
pub fn tomorrow(now: NaiveDateTime) -> anyhow::Result<DateRange> {
    let start = now
        .date()
        .succ_opt()
        .context("date out of range computing reminder window")?;
    let end = start
        .succ_opt()
        .context("date out of range computing reminder window")?;
    Ok(DateRange { start, end })
}
