use std::env;

pub const DEFAULT_SLOTS: &str = "09:30,10:30,11:30,13:00,14:00,15:00,16:00";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    /// When unset the reminder trigger endpoint is open.
    pub reminder_token: Option<String>,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_whatsapp_number: String,
    pub reminder_interval_ms: u64,
    pub clinic_name: String,
    pub clinic_provider: String,
    pub clinic_address: String,
    pub clinic_slots: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "clinic.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            reminder_token: env::var("REMINDER_TOKEN").ok().filter(|t| !t.is_empty()),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_whatsapp_number: env::var("TWILIO_WHATSAPP_NUMBER").unwrap_or_default(),
            reminder_interval_ms: env::var("REMINDER_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
            clinic_name: env::var("CLINIC_NAME").unwrap_or_else(|_| "SpeOdonto".to_string()),
            clinic_provider: env::var("CLINIC_PROVIDER")
                .unwrap_or_else(|_| "Dr. Espedito Fernandes".to_string()),
            clinic_address: env::var("CLINIC_ADDRESS").unwrap_or_else(|_| {
                "Av. Delfino Cerqueira, 672 - Centro, Carapicuíba - SP, 06322-060".to_string()
            }),
            clinic_slots: env::var("CLINIC_SLOTS").unwrap_or_else(|_| DEFAULT_SLOTS.to_string()),
        }
    }
}
