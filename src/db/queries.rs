use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Appointment, AppointmentStatus, ConversationContext, DateRange};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

const APPOINTMENT_COLUMNS: &str =
    "id, customer_name, customer_phone, service, date, time, status, created_at, updated_at";

// ── Appointments ──

pub fn create_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, customer_name, customer_phone, service, date, time, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appt.id,
            appt.customer_name,
            appt.customer_phone,
            appt.service,
            appt.date.format(DATE_FORMAT).to_string(),
            appt.time,
            appt.status.as_str(),
            appt.created_at.format(TS_FORMAT).to_string(),
            appt.updated_at.format(TS_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Appointments with `range.start <= date < range.end` in one of `statuses`,
/// ordered by day, then slot, then booking time.
pub fn find_appointments(
    conn: &Connection,
    range: &DateRange,
    statuses: &[AppointmentStatus],
) -> anyhow::Result<Vec<Appointment>> {
    if statuses.is_empty() {
        return Ok(vec![]);
    }

    let placeholders = (0..statuses.len())
        .map(|i| format!("?{}", i + 3))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE date >= ?1 AND date < ?2 AND status IN ({placeholders})
         ORDER BY date ASC, time ASC, created_at ASC"
    );

    let mut values: Vec<String> = vec![
        range.start.format(DATE_FORMAT).to_string(),
        range.end.format(DATE_FORMAT).to_string(),
    ];
    values.extend(statuses.iter().map(|s| s.as_str().to_string()));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), |row| {
        Ok(parse_appointment_row(row))
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

/// The most recently booked appointment for `phone` that still holds a slot.
pub fn latest_active_appointment(
    conn: &Connection,
    phone: &str,
) -> anyhow::Result<Option<Appointment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE customer_phone = ?1 AND status IN ('PENDING', 'CONFIRMED')
         ORDER BY created_at DESC, rowid DESC LIMIT 1"
    ))?;

    match stmt.query_row(params![phone], |row| Ok(parse_appointment_row(row))) {
        Ok(appt) => Ok(Some(appt?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn reschedule_appointment(
    conn: &Connection,
    id: &str,
    date: NaiveDate,
    time: &str,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(TS_FORMAT).to_string();
    let count = conn.execute(
        "UPDATE appointments SET date = ?1, time = ?2, status = 'PENDING', updated_at = ?3 WHERE id = ?4",
        params![date.format(DATE_FORMAT).to_string(), time, now, id],
    )?;
    Ok(count > 0)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(TS_FORMAT).to_string();
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let date_str: String = row.get(4)?;
    let status_str: String = row.get(6)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    Ok(Appointment {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        customer_phone: row.get(2)?,
        service: row.get(3)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)?,
        time: row.get(5)?,
        status: AppointmentStatus::parse(&status_str),
        created_at: NaiveDateTime::parse_from_str(&created_at_str, TS_FORMAT)?,
        updated_at: NaiveDateTime::parse_from_str(&updated_at_str, TS_FORMAT)?,
    })
}

// ── Conversation context ──

pub fn get_context(conn: &Connection, phone: &str) -> anyhow::Result<Option<ConversationContext>> {
    let result = conn.query_row(
        "SELECT context FROM conversations WHERE phone = ?1",
        params![phone],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(json) => {
            let context = serde_json::from_str(&json)
                .with_context(|| format!("invalid conversation context for {phone}"))?;
            Ok(Some(context))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_context(
    conn: &Connection,
    phone: &str,
    context: &ConversationContext,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(context)?;
    let now = Utc::now().naive_utc().format(TS_FORMAT).to_string();
    conn.execute(
        "INSERT INTO conversations (phone, context, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(phone) DO UPDATE SET
           context = excluded.context,
           updated_at = excluded.updated_at",
        params![phone, json, now],
    )?;
    Ok(())
}
