use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A wall-clock start time, always rendered as zero-padded `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

fn re_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // H, HH, H:MM, HH:MM, HhMM, Hh
    RE.get_or_init(|| Regex::new(r"^([0-9]{1,2})(?:[hH:]([0-9]{2})?)?$").unwrap())
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Normalizes the loose time spellings the assistant produces.
    /// Returns `None` for anything that is not a real time of day.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = re_time().captures(raw.trim())?;
        let hour: u8 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u8 = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        Self::new(hour, minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeOfDay::parse(&value).ok_or_else(|| format!("invalid time of day: {value}"))
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}
