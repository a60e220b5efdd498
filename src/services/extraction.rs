//! Recovers booking commands from the assistant's sign-off blocks.
//!
//! The assistant closes a finished negotiation with one of three markers,
//! followed by `Label: value` lines:
//!
//! ```text
//! AGENDAMENTO_COMPLETO        ALTERACAO_COMPLETA        CANCELAR_AGENDAMENTO
//! Nome: Ana Costa             NovaData: 2026-03-01
//! Servico: Limpeza            NovoHorario: 9:30
//! Data: 2026-02-12
//! Horario: 14h
//! ```
//!
//! Anything incomplete, malformed, placeholder-shaped or outside the slot
//! set yields [`BookingCommand::NoCommand`]: the conversation carries on.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::BookingCommand;
use crate::services::slots::TimeSlotPolicy;

pub const CREATE_MARKER: &str = "AGENDAMENTO_COMPLETO";
pub const RESCHEDULE_MARKER: &str = "ALTERACAO_COMPLETA";
pub const CANCEL_MARKER: &str = "CANCELAR_AGENDAMENTO";

const NAME_LABELS: &[&str] = &["nome", "name"];
const SERVICE_LABELS: &[&str] = &["servico", "serviço", "service"];

fn re_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^[ \t*_-]*nome:[ \t]*([^\r\n]*)").unwrap())
}

fn re_service() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^[ \t*_-]*servi[cç]o:[ \t]*([^\r\n]*)").unwrap())
}

fn re_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^[ \t*_-]*data:[ \t]*([^\r\n]*)").unwrap())
}

fn re_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^[ \t*_-]*hor[aá]rio:[ \t]*([^\r\n]*)").unwrap())
}

fn re_new_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^[ \t*_-]*nova[ _]?data:[ \t]*([^\r\n]*)").unwrap())
}

fn re_new_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t*_-]*novo[ _]?hor[aá]rio:[ \t]*([^\r\n]*)").unwrap()
    })
}

fn re_iso_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap())
}

/// Stateless parser; cheap to share across conversations.
#[derive(Debug, Clone, Default)]
pub struct CommandExtractor {
    policy: TimeSlotPolicy,
}

impl CommandExtractor {
    pub fn new(policy: TimeSlotPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TimeSlotPolicy {
        &self.policy
    }

    /// The first marker present, in create → reschedule → cancel order,
    /// decides which block is parsed. A broken block of that kind is
    /// `NoCommand`; it never falls through to a lower-precedence marker.
    ///
    /// Fields are read only from the lines after the marker, so chat text
    /// ahead of the block cannot shadow them.
    pub fn extract(&self, text: &str) -> BookingCommand {
        let command = if let Some(block) = block_after(text, CREATE_MARKER) {
            self.extract_create(block)
        } else if let Some(block) = block_after(text, RESCHEDULE_MARKER) {
            self.extract_reschedule(block)
        } else if text.contains(CANCEL_MARKER) {
            Some(BookingCommand::Cancel)
        } else {
            return BookingCommand::NoCommand;
        };

        command.unwrap_or(BookingCommand::NoCommand)
    }

    fn extract_create(&self, block: &str) -> Option<BookingCommand> {
        let customer_name = required(
            "name",
            field(re_name(), block, |v| (!is_placeholder(&v, NAME_LABELS)).then_some(v)),
        )?;
        let service = required(
            "service",
            field(re_service(), block, |v| (!is_placeholder(&v, SERVICE_LABELS)).then_some(v)),
        )?;
        let date = required("date", field(re_date(), block, |v| parse_date(&v)))?;
        let time = required(
            "time",
            field(re_time(), block, |v| self.policy.slot(first_token(&v))),
        )?;

        Some(BookingCommand::Create {
            customer_name,
            service,
            date,
            time,
        })
    }

    fn extract_reschedule(&self, block: &str) -> Option<BookingCommand> {
        let new_date = required("new_date", field(re_new_date(), block, |v| parse_date(&v)))?;
        let new_time = required(
            "new_time",
            field(re_new_time(), block, |v| self.policy.slot(first_token(&v))),
        )?;

        Some(BookingCommand::Reschedule { new_date, new_time })
    }
}

fn block_after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.find(marker).map(|pos| &text[pos + marker.len()..])
}

fn required<T>(field: &'static str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        tracing::debug!(field, "sign-off block incomplete, treating as no command");
    }
    value
}

/// First labelled value in `block` that `parse` accepts.
fn field<T>(re: &Regex, block: &str, parse: impl Fn(String) -> Option<T>) -> Option<T> {
    re.captures_iter(block)
        .filter_map(|caps| clean(caps.get(1)?.as_str()))
        .find_map(parse)
}

/// Value without surrounding blanks or markdown emphasis.
fn clean(raw: &str) -> Option<String> {
    let value = raw.trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '_');
    (!value.is_empty()).then(|| value.to_string())
}

fn first_token(value: &str) -> &str {
    value
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_end_matches(['.', ',', ';'])
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let token = first_token(value);
    if !re_iso_date().is_match(token) {
        return None;
    }
    NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
}

/// A template slot echoed back instead of a real value, e.g. `[nome]`,
/// `(serviço escolhido)` or `Nome do paciente`.
fn is_placeholder(value: &str, label_words: &[&str]) -> bool {
    if value.starts_with(['[', '(', '<', '{']) {
        return true;
    }

    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .any(|token| {
            let token = token.to_lowercase();
            label_words.iter().any(|w| token == *w)
        })
}
