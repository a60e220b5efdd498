use chrono::Utc;
use serde::Serialize;

use crate::db::AppointmentStore;
use crate::models::{Appointment, AppointmentStatus, BookingCommand, ConversationContext};

/// What applying a command did to the patient's appointments.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", content = "appointment", rename_all = "snake_case")]
pub enum BookingAction {
    Created(Appointment),
    /// Same booking re-sent on a retried or re-rendered reply.
    AlreadyBooked(Appointment),
    Rescheduled(Appointment),
    Cancelled(Appointment),
    /// Reschedule or cancel with no active appointment on file.
    NothingToChange,
    NoAction,
}

/// Persists an extracted command for the patient at `phone` and keeps the
/// conversation context in step with it.
pub async fn apply_command(
    store: &dyn AppointmentStore,
    phone: &str,
    command: &BookingCommand,
) -> anyhow::Result<BookingAction> {
    let action = match command {
        BookingCommand::Create {
            customer_name,
            service,
            date,
            time,
        } => {
            let time = time.to_string();

            if let Some(existing) = store.latest_active_appointment(phone).await? {
                if existing.date == *date && existing.time == time && existing.service == *service
                {
                    tracing::info!(phone, appointment = %existing.id, "booking already recorded, skipping");
                    return Ok(BookingAction::AlreadyBooked(existing));
                }
            }

            let now = Utc::now().naive_utc();
            let appointment = Appointment {
                id: uuid::Uuid::new_v4().to_string(),
                customer_name: customer_name.clone(),
                customer_phone: phone.to_string(),
                service: service.clone(),
                date: *date,
                time: time.clone(),
                status: AppointmentStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            store.create_appointment(&appointment).await?;

            store
                .save_context(
                    phone,
                    &ConversationContext {
                        customer_name: Some(customer_name.clone()),
                        service: Some(service.clone()),
                        date: Some(*date),
                        time: Some(time),
                    },
                )
                .await?;

            tracing::info!(phone, appointment = %appointment.id, date = %appointment.date, time = %appointment.time, "appointment created");
            BookingAction::Created(appointment)
        }

        BookingCommand::Reschedule { new_date, new_time } => {
            let Some(mut appointment) = store.latest_active_appointment(phone).await? else {
                tracing::info!(phone, "reschedule requested but no active appointment");
                return Ok(BookingAction::NothingToChange);
            };

            let new_time = new_time.to_string();
            store
                .reschedule_appointment(&appointment.id, *new_date, &new_time)
                .await?;

            appointment.date = *new_date;
            appointment.time = new_time.clone();
            appointment.status = AppointmentStatus::Pending;
            appointment.updated_at = Utc::now().naive_utc();

            let mut context = store.get_context(phone).await?.unwrap_or_default();
            context.date = Some(*new_date);
            context.time = Some(new_time);
            store.save_context(phone, &context).await?;

            tracing::info!(phone, appointment = %appointment.id, date = %appointment.date, time = %appointment.time, "appointment rescheduled");
            BookingAction::Rescheduled(appointment)
        }

        BookingCommand::Cancel => {
            let Some(mut appointment) = store.latest_active_appointment(phone).await? else {
                tracing::info!(phone, "cancel requested but no active appointment");
                return Ok(BookingAction::NothingToChange);
            };

            store
                .update_status(&appointment.id, AppointmentStatus::Cancelled)
                .await?;
            appointment.status = AppointmentStatus::Cancelled;
            appointment.updated_at = Utc::now().naive_utc();

            store
                .save_context(phone, &ConversationContext::default())
                .await?;

            tracing::info!(phone, appointment = %appointment.id, "appointment cancelled");
            BookingAction::Cancelled(appointment)
        }

        BookingCommand::NoCommand => BookingAction::NoAction,
    };

    Ok(action)
}
