use chrono::{Datelike, NaiveDate, Weekday};

use crate::config::AppConfig;
use crate::models::Appointment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicInfo {
    pub name: String,
    pub provider: String,
    pub address: String,
}

impl ClinicInfo {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            name: config.clinic_name.clone(),
            provider: config.clinic_provider.clone(),
            address: config.clinic_address.clone(),
        }
    }
}

/// Turns an appointment into the WhatsApp reminder text sent the day before.
#[derive(Debug, Clone)]
pub struct ReminderRenderer {
    clinic: ClinicInfo,
}

impl ReminderRenderer {
    pub fn new(clinic: ClinicInfo) -> Self {
        Self { clinic }
    }

    pub fn render(&self, appointment: &Appointment) -> String {
        format!(
            "Olá, {name}! 👋\n\
             \n\
             Estamos passando para confirmar seu atendimento na clínica {clinic}.\n\
             \n\
             📅 *Data:* {date} às {time}\n\
             👨‍⚕️ *Médico:* {provider}\n\
             🦷 *Procedimento:* {service}\n\
             📍 *Endereço:* {address}\n\
             \n\
             Caso precise *remarcar* ou *cancelar*, por favor nos avise o quanto antes.\n\
             \n\
             Até breve! 😊",
            name = appointment.customer_name,
            clinic = self.clinic.name,
            date = format_date(appointment.date),
            time = appointment.time,
            provider = self.clinic.provider,
            service = appointment.service,
            address = self.clinic.address,
        )
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Domingo",
        Weekday::Mon => "Segunda-feira",
        Weekday::Tue => "Terça-feira",
        Weekday::Wed => "Quarta-feira",
        Weekday::Thu => "Quinta-feira",
        Weekday::Fri => "Sexta-feira",
        Weekday::Sat => "Sábado",
    }
}

/// `Quinta-feira, 12/02/2026`
pub fn format_date(date: NaiveDate) -> String {
    format!(
        "{}, {:02}/{:02}/{}",
        weekday_name(date.weekday()),
        date.day(),
        date.month(),
        date.year()
    )
}
