use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate};
use tower::ServiceExt;

use clinicbot::config::AppConfig;
use clinicbot::db::{self, AppointmentStore, SqliteStore};
use clinicbot::handlers;
use clinicbot::models::{Appointment, AppointmentStatus, ConversationContext, DateRange};
use clinicbot::services::extraction::CommandExtractor;
use clinicbot::services::messaging::MessagingProvider;
use clinicbot::services::reminder::{ClinicInfo, NoDelay, ReminderDispatcher, ReminderRenderer};
use clinicbot::state::AppState;

// ── Mock Providers ──

struct MockMessaging {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    failing: HashSet<String>,
}

#[async_trait]
impl MessagingProvider for MockMessaging {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        if self.failing.contains(to) {
            anyhow::bail!("WhatsApp number not reachable");
        }
        Ok(())
    }
}

struct UnreachableStore;

#[async_trait]
impl AppointmentStore for UnreachableStore {
    async fn find_appointments(
        &self,
        _range: DateRange,
        _statuses: &[AppointmentStatus],
    ) -> anyhow::Result<Vec<Appointment>> {
        anyhow::bail!("database is locked")
    }

    async fn create_appointment(&self, _appointment: &Appointment) -> anyhow::Result<()> {
        anyhow::bail!("database is locked")
    }

    async fn latest_active_appointment(&self, _phone: &str) -> anyhow::Result<Option<Appointment>> {
        anyhow::bail!("database is locked")
    }

    async fn reschedule_appointment(
        &self,
        _id: &str,
        _date: NaiveDate,
        _time: &str,
    ) -> anyhow::Result<bool> {
        anyhow::bail!("database is locked")
    }

    async fn update_status(&self, _id: &str, _status: AppointmentStatus) -> anyhow::Result<bool> {
        anyhow::bail!("database is locked")
    }

    async fn get_context(&self, _phone: &str) -> anyhow::Result<Option<ConversationContext>> {
        anyhow::bail!("database is locked")
    }

    async fn save_context(
        &self,
        _phone: &str,
        _context: &ConversationContext,
    ) -> anyhow::Result<()> {
        anyhow::bail!("database is locked")
    }
}

// ── Helpers ──

fn test_config(reminder_token: Option<&str>) -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        reminder_token: reminder_token.map(str::to_string),
        twilio_account_sid: "".to_string(),
        twilio_auth_token: "".to_string(),
        twilio_whatsapp_number: "+551141844602".to_string(),
        reminder_interval_ms: 0,
        clinic_name: "SpeOdonto".to_string(),
        clinic_provider: "Dr. Espedito Fernandes".to_string(),
        clinic_address: "Av. Delfino Cerqueira, 672".to_string(),
        clinic_slots: clinicbot::config::DEFAULT_SLOTS.to_string(),
    }
}

struct TestApp {
    state: Arc<AppState>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

fn build_state(
    store: Arc<dyn AppointmentStore>,
    reminder_token: Option<&str>,
    failing: &[&str],
) -> TestApp {
    let config = test_config(reminder_token);
    let sent = Arc::new(Mutex::new(vec![]));
    let messaging = MockMessaging {
        sent: Arc::clone(&sent),
        failing: failing.iter().map(|s| s.to_string()).collect(),
    };
    let reminders = ReminderDispatcher::new(
        store.clone(),
        Arc::new(messaging),
        ReminderRenderer::new(ClinicInfo::from_config(&config)),
        Arc::new(NoDelay),
    );
    let state = Arc::new(AppState {
        config,
        store,
        extractor: CommandExtractor::default(),
        reminders,
    });
    TestApp { state, sent }
}

fn sqlite_store() -> Arc<dyn AppointmentStore> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(SqliteStore::new(Arc::new(Mutex::new(conn))))
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

fn tomorrow() -> NaiveDate {
    chrono::Local::now().date_naive() + Duration::days(1)
}

async fn seed(store: &Arc<dyn AppointmentStore>, phone: &str, date: NaiveDate, status: AppointmentStatus) {
    let now = chrono::Utc::now().naive_utc();
    store
        .create_appointment(&Appointment {
            id: format!("appt-{phone}-{date}"),
            customer_name: "Ana Costa".to_string(),
            customer_phone: phone.to_string(),
            service: "Limpeza".to_string(),
            date,
            time: "14:00".to_string(),
            status,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
}

fn reminder_request(auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/reminders/send");
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

fn assistant_request(phone: &str, text: &str) -> Request<Body> {
    let body = serde_json::json!({ "phone": phone, "text": text });
    Request::builder()
        .method("POST")
        .uri("/api/assistant/reply")
        .header("Authorization", "Bearer test-token")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(res: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let app = build_state(sqlite_store(), None, &[]);
    let res = test_app(app.state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Reminder Trigger Tests ──

#[tokio::test]
async fn test_reminders_require_token_when_configured() {
    let store = sqlite_store();
    seed(&store, "+5511911110000", tomorrow(), AppointmentStatus::Confirmed).await;
    let app = build_state(store, Some("cron-secret"), &[]);

    let res = test_app(app.state.clone())
        .oneshot(reminder_request(None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = test_app(app.state.clone())
        .oneshot(reminder_request(Some("Bearer wrong")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = test_app(app.state)
        .oneshot(reminder_request(Some("cron-secret")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Rejected before any dispatch work.
    assert!(app.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reminders_with_valid_token() {
    let store = sqlite_store();
    seed(&store, "+5511911110000", tomorrow(), AppointmentStatus::Confirmed).await;
    let app = build_state(store, Some("cron-secret"), &[]);

    let res = test_app(app.state)
        .oneshot(reminder_request(Some("Bearer cron-secret")))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["success"], 1);
    assert_eq!(json["failed"], 0);
    assert_eq!(json["total"], 1);
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_reminders_open_without_token() {
    let app = build_state(sqlite_store(), None, &[]);

    let res = test_app(app.state)
        .oneshot(reminder_request(None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["success"], 0);
    assert_eq!(json["failed"], 0);
    assert_eq!(json["total"], 0);
    assert!(app.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reminders_only_tomorrow_and_active() {
    let store = sqlite_store();
    let day = tomorrow();
    seed(&store, "+5511900000001", day, AppointmentStatus::Pending).await;
    seed(&store, "+5511900000002", day, AppointmentStatus::Confirmed).await;
    seed(&store, "+5511900000003", day, AppointmentStatus::Cancelled).await;
    seed(&store, "+5511900000004", day + Duration::days(1), AppointmentStatus::Pending).await;
    seed(&store, "+5511900000005", day - Duration::days(1), AppointmentStatus::Pending).await;
    let app = build_state(store, None, &[]);

    let res = test_app(app.state)
        .oneshot(reminder_request(None))
        .await
        .unwrap();
    let json = json_body(res).await;
    assert_eq!(json["total"], 2);

    let sent = app.sent.lock().unwrap();
    let mut phones: Vec<&str> = sent.iter().map(|(to, _)| to.as_str()).collect();
    phones.sort();
    assert_eq!(phones, vec!["+5511900000001", "+5511900000002"]);
    assert!(sent[0].1.contains("Olá, Ana Costa!"));
    assert!(sent[0].1.contains("às 14:00"));
}

#[tokio::test]
async fn test_reminders_count_partial_failures() {
    let store = sqlite_store();
    let day = tomorrow();
    for phone in ["+5511900000001", "+5511900000002", "+5511900000003"] {
        seed(&store, phone, day, AppointmentStatus::Confirmed).await;
    }
    let app = build_state(store, None, &["+5511900000002"]);

    let res = test_app(app.state)
        .oneshot(reminder_request(None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["success"], 2);
    assert_eq!(json["failed"], 1);
    assert_eq!(json["total"], 3);
    assert_eq!(app.sent.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_reminders_store_failure() {
    let app = build_state(Arc::new(UnreachableStore), None, &[]);

    let res = test_app(app.state)
        .oneshot(reminder_request(None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(res).await;
    assert!(json["error"].is_string());
    assert!(json["details"].as_str().unwrap().contains("database is locked"));
    assert!(json.get("total").is_none());
}

// ── Assistant Reply Tests ──

#[tokio::test]
async fn test_assistant_reply_requires_admin_token() {
    let app = build_state(sqlite_store(), None, &[]);

    let res = test_app(app.state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/assistant/reply")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"phone":"+551","text":"CANCELAR_AGENDAMENTO"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_flow_create_reschedule_cancel() {
    let store = sqlite_store();
    let app = build_state(store.clone(), None, &[]);
    let phone = "+5511988887777";

    let res = test_app(app.state.clone())
        .oneshot(assistant_request(
            phone,
            "Perfeito!\nAGENDAMENTO_COMPLETO\nNome: Ana Costa\nServico: Limpeza\nData: 2026-02-12\nHorario: 14h\nAté breve!",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["command"]["type"], "create");
    assert_eq!(json["command"]["customer_name"], "Ana Costa");
    assert_eq!(json["command"]["date"], "2026-02-12");
    assert_eq!(json["command"]["time"], "14:00");
    assert_eq!(json["result"]["action"], "created");
    assert_eq!(json["result"]["appointment"]["status"], "PENDING");

    let res = test_app(app.state.clone())
        .oneshot(
            Request::builder()
                .uri(format!("/api/conversations/{phone}/context"))
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["service"], "Limpeza");

    let res = test_app(app.state.clone())
        .oneshot(assistant_request(
            phone,
            "ALTERACAO_COMPLETA\nNovaData: 2026-03-01\nNovoHorario: 9:30",
        ))
        .await
        .unwrap();
    let json = json_body(res).await;
    assert_eq!(json["command"]["type"], "reschedule");
    assert_eq!(json["command"]["new_time"], "09:30");
    assert_eq!(json["result"]["action"], "rescheduled");
    assert_eq!(json["result"]["appointment"]["date"], "2026-03-01");

    let res = test_app(app.state)
        .oneshot(assistant_request(phone, "CANCELAR_AGENDAMENTO"))
        .await
        .unwrap();
    let json = json_body(res).await;
    assert_eq!(json["command"]["type"], "cancel");
    assert_eq!(json["result"]["action"], "cancelled");

    let range = DateRange {
        start: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
    };
    let active = store
        .find_appointments(range, &AppointmentStatus::ACTIVE)
        .await
        .unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn test_placeholder_reply_books_nothing() {
    let store = sqlite_store();
    let app = build_state(store.clone(), None, &[]);

    let res = test_app(app.state)
        .oneshot(assistant_request(
            "+5511988887777",
            "AGENDAMENTO_COMPLETO\nNome: [nome do paciente]\nServico: Limpeza\nData: 2026-02-12\nHorario: 14:00",
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["command"]["type"], "no_command");
    assert_eq!(json["result"]["action"], "no_action");
    assert!(store.get_context("+5511988887777").await.unwrap().is_none());
}

#[tokio::test]
async fn test_assistant_reply_rejects_blank_phone() {
    let store = sqlite_store();
    let app = build_state(store.clone(), None, &[]);

    let res = test_app(app.state)
        .oneshot(assistant_request(
            "   ",
            "AGENDAMENTO_COMPLETO\nNome: Ana Costa\nServico: Limpeza\nData: 2026-02-12\nHorario: 14:00",
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(store.latest_active_appointment("").await.unwrap().is_none());
    assert!(store.latest_active_appointment("   ").await.unwrap().is_none());
}

#[tokio::test]
async fn test_context_not_found() {
    let app = build_state(sqlite_store(), None, &[]);

    let res = test_app(app.state)
        .oneshot(
            Request::builder()
                .uri("/api/conversations/+5511900000000/context")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
