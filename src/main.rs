use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use clinicbot::config::AppConfig;
use clinicbot::db::{self, AppointmentStore, SqliteStore};
use clinicbot::handlers;
use clinicbot::services::extraction::CommandExtractor;
use clinicbot::services::messaging::twilio::TwilioWhatsAppProvider;
use clinicbot::services::messaging::MessagingProvider;
use clinicbot::services::reminder::{ClinicInfo, FixedInterval, ReminderDispatcher, ReminderRenderer};
use clinicbot::services::slots::TimeSlotPolicy;
use clinicbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let store: Arc<dyn AppointmentStore> = Arc::new(SqliteStore::new(Arc::new(Mutex::new(conn))));

    let policy = TimeSlotPolicy::from_list(&config.clinic_slots)?;
    tracing::info!(
        slots = %policy.slots().iter().map(|t| t.to_string()).collect::<Vec<_>>().join(","),
        "loaded clinic slots"
    );

    if config.twilio_account_sid.is_empty() {
        tracing::warn!("TWILIO_ACCOUNT_SID not set, reminder sends will fail");
    }
    let messaging: Arc<dyn MessagingProvider> = Arc::new(TwilioWhatsAppProvider::new(
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.twilio_whatsapp_number.clone(),
    ));

    if config.reminder_token.is_none() {
        tracing::warn!("REMINDER_TOKEN not set, reminder endpoint is open");
    }
    let reminders = ReminderDispatcher::new(
        store.clone(),
        messaging,
        ReminderRenderer::new(ClinicInfo::from_config(&config)),
        Arc::new(FixedInterval::from_millis(config.reminder_interval_ms)),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        extractor: CommandExtractor::new(policy),
        reminders,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
